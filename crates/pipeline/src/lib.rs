pub mod config;

pub use config::WorkshopConfig;

use anyhow::{Context, Result};
use tracing::{info, warn};

use enrich::{EnrichedTriple, EntityEnricher, EntityLookup, LayerExpander};
use extract::{DependencyParser, SvoExtractor};
use index::{EmbeddingClient, EmbeddingGenerator, GraphLoader, GraphStore, LoadReport, TextEmbedder};
use ingest::{AcquisitionError, SourceText, WikipediaClient};

/// Fetch a summary per title. Unresolvable titles abort the run unless
/// `skip_unavailable` is set, in which case they are logged and left out.
pub async fn acquire(
    client: &WikipediaClient,
    titles: &[String],
    skip_unavailable: bool,
) -> Result<Vec<SourceText>> {
    let mut sources = Vec::with_capacity(titles.len());

    for title in titles {
        match client.fetch_source(title).await {
            Ok(source) => sources.push(source),
            Err(e @ (AcquisitionError::NotFound(_) | AcquisitionError::Ambiguous(_) | AcquisitionError::Empty(_)))
                if skip_unavailable =>
            {
                warn!(title = %title, error = %e, "Skipping unavailable title");
            }
            Err(e) => return Err(anyhow::Error::new(e).context(format!("Failed to fetch '{}'", title))),
        }
    }

    Ok(sources)
}

/// Fail early when the embedding model disagrees with the configured dimension
pub async fn check_embedding_dimension(client: &EmbeddingClient, expected: usize) -> Result<()> {
    let actual = client
        .get_dimension()
        .await
        .context("Failed to query embedding model")?;

    if actual != expected {
        anyhow::bail!(
            "Embedding model returns {} dimensions but {} are configured",
            actual,
            expected
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub dimension: usize,
    pub layers: usize,
    pub seed: Option<u64>,
}

/// Triples built from one source text
#[derive(Debug, Default)]
pub struct TextTriples {
    /// First layer followed by every expanded layer
    pub triples: Vec<EnrichedTriple>,
    pub first_layer: usize,
    pub lookup_failures: usize,
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub sources: usize,
    pub extracted: usize,
    pub expanded: usize,
    pub lookup_failures: usize,
    pub load: LoadReport,
}

/// Text → triples → enrichment → layers → embeddings → graph
pub struct Pipeline<P, L, E, S> {
    extractor: SvoExtractor<P>,
    enricher: EntityEnricher<L>,
    generator: EmbeddingGenerator<E>,
    loader: GraphLoader<S>,
    layers: usize,
}

impl<P, L, E, S> Pipeline<P, L, E, S>
where
    P: DependencyParser,
    L: EntityLookup,
    E: TextEmbedder,
    S: GraphStore,
{
    pub fn new(parser: P, lookup: L, embedder: E, store: S, settings: PipelineSettings) -> Self {
        let mut generator = EmbeddingGenerator::new(embedder, settings.dimension);
        if let Some(seed) = settings.seed {
            generator = generator.with_seed(seed);
        }

        Self {
            extractor: SvoExtractor::new(parser),
            enricher: EntityEnricher::new(lookup),
            generator,
            loader: GraphLoader::new(store),
            layers: settings.layers,
        }
    }

    pub async fn build_triples(&self, text: &str) -> Result<TextTriples> {
        let svo = self.extractor.extract_triples(text).await?;
        let batch = self.enricher.enrich_all(svo).await;
        let first_layer = batch.triples.len();

        let expander = LayerExpander::new(&self.extractor, &self.enricher);
        let layers = expander.expand_layers(&batch.triples, self.layers).await?;

        let mut triples = batch.triples;
        for layer in layers {
            triples.extend(layer);
        }

        Ok(TextTriples {
            triples,
            first_layer,
            lookup_failures: batch.failures,
        })
    }

    pub async fn run(&mut self, sources: &[SourceText]) -> Result<PipelineReport> {
        let mut report = PipelineReport {
            sources: sources.len(),
            ..PipelineReport::default()
        };
        let mut all_triples = Vec::new();

        for source in sources {
            let built = self.build_triples(&source.text)
                .await
                .context(format!("Failed to build triples for '{}'", source.title))?;
            let expanded = built.triples.len() - built.first_layer;

            info!(
                title = %source.title,
                extracted = built.first_layer,
                expanded,
                "Built triples"
            );

            report.extracted += built.first_layer;
            report.expanded += expanded;
            report.lookup_failures += built.lookup_failures;
            all_triples.extend(built.triples);
        }

        let embedded = self.generator
            .embed_all(all_triples)
            .await
            .context("Failed to embed triples")?;

        report.load = self.loader
            .load(&embedded)
            .await
            .context("Failed to load graph")?;

        info!(
            nodes = report.load.node_count,
            edges = report.load.edges_inserted(),
            skipped = report.load.edges_skipped(),
            "Pipeline finished"
        );

        Ok(report)
    }
}
