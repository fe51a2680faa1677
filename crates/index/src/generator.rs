use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use enrich::EnrichedTriple;

use crate::EmbeddedTriple;
use crate::embeddings::TextEmbedder;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding for '{object}' has {actual} dimensions, expected {expected}")]
    Dimension {
        object: String,
        expected: usize,
        actual: usize,
    },

    #[error("embedding request failed: {0}")]
    Embedder(#[from] anyhow::Error),
}

/// Vector with every component drawn uniformly from [-1, 1].
/// A placeholder for objects without a description, not a semantic embedding.
pub fn random_vector<R: Rng>(rng: &mut R, dimension: usize) -> Vec<f32> {
    (0..dimension).map(|_| rng.gen_range(-1.0..=1.0)).collect()
}

pub struct EmbeddingGenerator<E> {
    embedder: E,
    dimension: usize,
    rng: StdRng,
}

impl<E: TextEmbedder> EmbeddingGenerator<E> {
    pub fn new(embedder: E, dimension: usize) -> Self {
        Self {
            embedder,
            dimension,
            rng: StdRng::from_entropy(),
        }
    }

    /// Make the placeholder vectors reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub async fn embed_triple(
        &mut self,
        triple: EnrichedTriple,
    ) -> Result<EmbeddedTriple, EmbeddingError> {
        let vector = if triple.has_description() {
            let vector = self.embedder.embed(&triple.description).await?;
            if vector.len() != self.dimension {
                return Err(EmbeddingError::Dimension {
                    object: triple.triple.object.clone(),
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
            vector
        } else {
            debug!(object = %triple.triple.object, "No description, using random vector");
            random_vector(&mut self.rng, self.dimension)
        };

        Ok(EmbeddedTriple {
            enriched: triple,
            vector,
        })
    }

    pub async fn embed_all(
        &mut self,
        triples: Vec<EnrichedTriple>,
    ) -> Result<Vec<EmbeddedTriple>, EmbeddingError> {
        let mut embedded = Vec::with_capacity(triples.len());
        for triple in triples {
            embedded.push(self.embed_triple(triple).await?);
        }
        Ok(embedded)
    }
}
