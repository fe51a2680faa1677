use anyhow::{Context, Result};
use tracing::info;

use extract::{DependencyParser, SvoExtractor};

use crate::EnrichedTriple;
use crate::enricher::EntityEnricher;
use crate::knowledge_graph::EntityLookup;

/// Deepens the graph by extracting triples from enriched descriptions.
///
/// There is no cycle detection: a description that mentions an earlier
/// subject yields an edge back to it.
pub struct LayerExpander<'a, P, L> {
    extractor: &'a SvoExtractor<P>,
    enricher: &'a EntityEnricher<L>,
}

impl<'a, P, L> LayerExpander<'a, P, L>
where
    P: DependencyParser,
    L: EntityLookup,
{
    pub fn new(extractor: &'a SvoExtractor<P>, enricher: &'a EntityEnricher<L>) -> Self {
        Self { extractor, enricher }
    }

    /// Build one more layer from every triple that has a description
    pub async fn expand(&self, triples: &[EnrichedTriple]) -> Result<Vec<EnrichedTriple>> {
        let mut svo_triples = Vec::new();

        for triple in triples.iter().filter(|t| t.has_description()) {
            let extracted = self.extractor
                .extract_triples(&triple.description)
                .await
                .context(format!("Failed to extract from description of '{}'", triple.triple.object))?;
            svo_triples.extend(extracted);
        }

        let batch = self.enricher.enrich_all(svo_triples).await;
        info!(
            triples = batch.triples.len(),
            misses = batch.misses,
            failures = batch.failures,
            "Expanded layer"
        );

        Ok(batch.triples)
    }

    /// Expand `depth` times, each layer seeded by the one before it.
    /// Stops early once a layer comes back empty.
    pub async fn expand_layers(
        &self,
        seed: &[EnrichedTriple],
        depth: usize,
    ) -> Result<Vec<Vec<EnrichedTriple>>> {
        let mut layers: Vec<Vec<EnrichedTriple>> = Vec::new();

        for _ in 0..depth {
            let previous = layers.last().map(Vec::as_slice).unwrap_or(seed);
            let next = self.expand(previous).await?;
            if next.is_empty() {
                break;
            }
            layers.push(next);
        }

        Ok(layers)
    }
}
