pub mod embeddings;
pub mod generator;
pub mod graph;
pub mod loader;
pub mod neo4j_index;
pub mod store;

pub use embeddings::{EmbeddingClient, TextEmbedder};
pub use generator::{EmbeddingError, EmbeddingGenerator, random_vector};
pub use graph::{Edge, Node, dedup_nodes, sanitize_labels, to_storage_vector};
pub use loader::{EdgeGroupReport, GraphLoader, LoadReport, SkipReason, SkippedEdge};
pub use neo4j_index::{GraphStats, Neo4jStore};
pub use store::{EdgeTransaction, GraphStore, MemoryGraph, MemoryGraphStore, StoreError};

use enrich::EnrichedTriple;
use serde::{Deserialize, Serialize};

/// An enriched triple with a vector for its object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedTriple {
    #[serde(flatten)]
    pub enriched: EnrichedTriple,
    pub vector: Vec<f32>,
}
