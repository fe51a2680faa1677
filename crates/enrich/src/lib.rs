pub mod enricher;
pub mod expander;
pub mod knowledge_graph;

pub use enricher::{Enriched, EnrichmentBatch, EntityEnricher, LookupOutcome};
pub use expander::LayerExpander;
pub use knowledge_graph::{EntityLookup, EntityMatch, KnowledgeGraphClient, LookupError};

use extract::SvoTriple;
use serde::{Deserialize, Serialize};

/// An SVO triple with knowledge-graph data about its object.
/// Fields are empty when the lookup found nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTriple {
    #[serde(flatten)]
    pub triple: SvoTriple,
    pub description: String,
    pub labels: Vec<String>,
    pub url: String,
}

impl EnrichedTriple {
    pub fn blank(triple: SvoTriple) -> Self {
        Self {
            triple,
            description: String::new(),
            labels: Vec::new(),
            url: String::new(),
        }
    }

    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }
}
