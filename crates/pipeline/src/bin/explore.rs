use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use index::Neo4jStore;
use pipeline::WorkshopConfig;
use query::{GraphExplorer, similarity};

/// Explore a graph loaded by build_graph
#[derive(Parser)]
#[command(name = "explore")]
struct Args {
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cosine similarity of two nodes' stored embeddings
    Similarity { a: String, b: String },
    /// Outgoing relationships of a node
    Neighbours { name: String },
    /// Nodes whose knowledge graph types include a label
    Types { label: String },
    /// Add a knowledge graph type as a node label (APOC)
    PropagateLabel { label: String },
    /// Project the graph and write FastRP embeddings (GDS)
    Fastrp {
        #[arg(long, default_value = "workshop")]
        projection: String,
        #[arg(long, default_value_t = 64)]
        dimension: usize,
        #[arg(long, default_value = "fastrp")]
        property: String,
    },
    /// Nodes most similar to a node by a stored vector property
    Similar {
        name: String,
        #[arg(long, default_value = "embedding")]
        property: String,
        #[arg(short, default_value_t = 5)]
        k: usize,
    },
    /// Node and relationship counts
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = WorkshopConfig::load(args.config.as_deref())?;

    let store = Neo4jStore::connect(
        &config.neo4j.uri,
        &config.neo4j.user,
        &config.neo4j.password,
        &config.neo4j.database,
    )
    .await?;
    let explorer = GraphExplorer::new(store.graph().clone());

    match args.command {
        Command::Similarity { a, b } => {
            let nodes = explorer.fetch_nodes().await?;
            let score = similarity(&a, &b, &nodes)?;
            println!("similarity({}, {}) = {:.4}", a, b, score);
        }
        Command::Neighbours { name } => {
            for n in explorer.neighbours(&name).await? {
                println!("  ({})-[:{}]->({})", name, n.verb, n.target);
            }
        }
        Command::Types { label } => {
            for name in explorer.nodes_with_type(&label).await? {
                println!("  {}", name);
            }
        }
        Command::PropagateLabel { label } => {
            let count = explorer.propagate_type_label(&label).await?;
            println!("Labelled {} nodes as :{}", count, label);
        }
        Command::Fastrp { projection, dimension, property } => {
            let stats = explorer.project(&projection).await?;
            println!(
                "Projected '{}': {} nodes, {} relationships",
                projection, stats.node_count, stats.relationship_count
            );
            let written = explorer.write_fastrp(&projection, dimension, &property).await;
            // the projection lives in GDS memory until dropped
            explorer.drop_projection(&projection).await?;
            println!("Wrote '{}' on {} nodes", property, written?);
        }
        Command::Similar { name, property, k } => {
            for scored in explorer.most_similar(&name, &property, k).await? {
                println!("  {:<40} {:.4}", scored.name, scored.score);
            }
        }
        Command::Stats => {
            let stats = store.get_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}
