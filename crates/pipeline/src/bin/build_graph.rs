use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use enrich::KnowledgeGraphClient;
use extract::SpacyClient;
use index::{EmbeddingClient, GraphStore, MemoryGraphStore, Neo4jStore};
use ingest::{FileReader, WikipediaClient};
use pipeline::{
    Pipeline, PipelineReport, PipelineSettings, WorkshopConfig, acquire, check_embedding_dimension,
};

/// Build a knowledge graph from Wikipedia summaries
#[derive(Parser)]
#[command(name = "build_graph")]
struct Args {
    /// JSON config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Page titles, replacing the configured ones
    #[arg(short, long = "title")]
    titles: Vec<String>,

    /// Number of extra layers built from object descriptions
    #[arg(short, long)]
    layers: Option<usize>,

    /// Load into memory instead of Neo4j and print the result
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = WorkshopConfig::load(args.config.as_deref())?;
    if !args.titles.is_empty() {
        config.titles = args.titles;
    }
    if let Some(layers) = args.layers {
        config.layers = layers;
    }
    if config.knowledge_graph.api_key.is_empty() {
        tracing::warn!("KG_API_KEY is not set, every knowledge graph lookup will fail");
    }

    let wikipedia = WikipediaClient::new(config.wikipedia.base_url.clone());
    let mut sources = acquire(&wikipedia, &config.titles, config.skip_unavailable_titles).await?;
    if let Some(dir) = &config.text_dir {
        sources.extend(FileReader::read_directory(dir).await?);
    }
    println!("Fetched {} source texts", sources.len());

    let report = if args.dry_run {
        let store = MemoryGraphStore::new();
        let report = run(&config, store.clone(), &sources).await?;

        let graph = store.snapshot().await;
        for rel in graph.relationships() {
            println!("  ({})-[:{}]->({})", rel.from, rel.rel_type, rel.to);
        }
        report
    } else {
        let store = Neo4jStore::connect(
            &config.neo4j.uri,
            &config.neo4j.user,
            &config.neo4j.password,
            &config.neo4j.database,
        )
        .await?;
        store.init_schema().await?;

        let report = run(&config, store.clone(), &sources).await?;

        let stats = store.get_stats().await?;
        println!(
            "Neo4j now holds {} nodes and {} relationships",
            stats.node_count, stats.relationship_count
        );
        report
    };

    print_report(&report);
    Ok(())
}

async fn run<S: GraphStore>(
    config: &WorkshopConfig,
    store: S,
    sources: &[ingest::SourceText],
) -> Result<PipelineReport> {
    let parser = SpacyClient::new(config.parser.base_url.clone(), config.parser.model.clone());
    let lookup = KnowledgeGraphClient::new(
        config.knowledge_graph.base_url.clone(),
        config.knowledge_graph.api_key.clone(),
    );
    let embedder = EmbeddingClient::new(config.embedding.base_url.clone(), config.embedding.model.clone());
    check_embedding_dimension(&embedder, config.embedding.dimension).await?;

    let mut pipeline = Pipeline::new(
        parser,
        lookup,
        embedder,
        store,
        PipelineSettings {
            dimension: config.embedding.dimension,
            layers: config.layers,
            seed: config.embedding.seed,
        },
    );

    pipeline.run(sources).await.context("Pipeline failed")
}

fn print_report(report: &PipelineReport) {
    println!("\n=== GRAPH BUILD ===");
    println!("  Sources:          {}", report.sources);
    println!("  Triples:          {}", report.extracted);
    println!("  Expanded triples: {}", report.expanded);
    println!("  Lookup failures:  {}", report.lookup_failures);
    println!("  Nodes:            {}", report.load.node_count);
    println!("  Edges inserted:   {}", report.load.edges_inserted());
    println!("  Edges skipped:    {}", report.load.edges_skipped());

    for group in report.load.failed_groups() {
        println!(
            "  Rolled back '{}': {}",
            group.verb,
            group.error.as_deref().unwrap_or("unknown error")
        );
    }
}
