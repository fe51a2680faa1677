use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::EmbeddedTriple;

static RELATIONSHIP_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("relationship type pattern is valid")
});

/// A graph vertex, keyed by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub description: Option<String>,
    pub labels: Vec<String>,
    pub url: Option<String>,
    /// Stored as a plain list of floats
    pub embedding: Option<Vec<f64>>,
}

impl Node {
    /// Bare node with only a name, used for subjects met during edge insertion
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            labels: Vec::new(),
            url: None,
            embedding: None,
        }
    }

    /// Node for the object of an embedded triple
    pub fn from_triple(triple: &EmbeddedTriple) -> Self {
        let enriched = &triple.enriched;
        Self {
            name: enriched.triple.object.clone(),
            description: non_empty(&enriched.description),
            labels: enriched.labels.clone(),
            url: non_empty(&enriched.url),
            embedding: Some(to_storage_vector(&triple.vector)),
        }
    }

    /// A node can be created as an edge target only with its vector attached
    pub fn is_complete(&self) -> bool {
        self.embedding.is_some()
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// A directed relation labelled by a verb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub verb: String,
    pub target: String,
    /// Attributes used to create the target when it is not in the graph yet
    pub target_template: Option<Node>,
}

impl Edge {
    pub fn new(source: impl Into<String>, verb: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            verb: verb.into(),
            target: target.into(),
            target_template: None,
        }
    }

    pub fn from_triple(triple: &EmbeddedTriple) -> Self {
        let svo = &triple.enriched.triple;
        Self {
            source: svo.subject.clone(),
            verb: svo.verb.clone(),
            target: svo.object.clone(),
            target_template: Some(Node::from_triple(triple)),
        }
    }
}

pub fn to_storage_vector(vector: &[f32]) -> Vec<f64> {
    vector.iter().map(|&v| f64::from(v)).collect()
}

/// Keep the first node for each name. Later duplicates are dropped whole,
/// their attributes are not merged in.
pub fn dedup_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let mut seen = HashSet::new();
    nodes
        .into_iter()
        .filter(|n| seen.insert(n.name.clone()))
        .collect()
}

/// Remove blank type labels left behind by partially populated lookups
pub fn sanitize_labels(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|mut node| {
            node.labels.retain(|l| !l.trim().is_empty());
            node
        })
        .collect()
}

/// Verb as a relationship type, if it is a valid unquoted identifier
pub fn relationship_type(verb: &str) -> Option<&str> {
    RELATIONSHIP_TYPE.is_match(verb).then_some(verb)
}

pub fn nodes_from_triples(triples: &[EmbeddedTriple]) -> Vec<Node> {
    triples.iter().map(Node::from_triple).collect()
}

pub fn edges_from_triples(triples: &[EmbeddedTriple]) -> Vec<Edge> {
    triples.iter().map(Edge::from_triple).collect()
}
