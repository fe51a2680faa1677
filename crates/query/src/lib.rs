pub mod explore;
pub mod similarity;

pub use explore::{GraphExplorer, Neighbour, ProjectionStats, ScoredNode};
pub use similarity::{DisambiguationError, cosine_similarity, similarity};
