use thiserror::Error;

use index::Node;

#[derive(Debug, Error, PartialEq)]
pub enum DisambiguationError {
    #[error("no node named '{0}'")]
    UnknownNode(String),

    #[error("node '{0}' has no stored embedding")]
    MissingEmbedding(String),

    #[error("vectors differ in length ({left} vs {right})")]
    DimensionMismatch { left: usize, right: usize },
}

/// Cosine of the angle between two vectors, in [-1, 1].
/// A zero vector has no direction and scores 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64, DisambiguationError> {
    if a.len() != b.len() {
        return Err(DisambiguationError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

fn embedding_of<'a>(name: &str, nodes: &'a [Node]) -> Result<&'a [f64], DisambiguationError> {
    let node = nodes
        .iter()
        .find(|n| n.name == name)
        .ok_or_else(|| DisambiguationError::UnknownNode(name.to_string()))?;

    node.embedding
        .as_deref()
        .ok_or_else(|| DisambiguationError::MissingEmbedding(name.to_string()))
}

/// How alike two named nodes are, judged by their stored vectors
pub fn similarity(name_a: &str, name_b: &str, nodes: &[Node]) -> Result<f64, DisambiguationError> {
    let a = embedding_of(name_a, nodes)?;
    let b = embedding_of(name_b, nodes)?;
    cosine_similarity(a, b)
}
