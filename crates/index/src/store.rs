use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::graph::Node;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),

    #[error("could not create ({from})-[:{rel_type}]->({to}): {reason}")]
    Relationship {
        from: String,
        rel_type: String,
        to: String,
        reason: String,
    },

    #[error("graph store error: {0}")]
    Backend(String),
}

/// Graph storage used by the loader
#[async_trait]
pub trait GraphStore: Send + Sync {
    type Txn: EdgeTransaction;

    /// Merge nodes keyed by (`Node`, name) and return the total node count
    async fn merge_nodes(&self, nodes: &[Node]) -> Result<usize, StoreError>;

    /// Open a transaction for one group of edges
    async fn begin(&self) -> Result<Self::Txn, StoreError>;
}

/// Writes inside one edge group. Nothing is visible outside until `commit`.
///
/// Neo4j aborts the whole transaction once a statement fails. The edge that
/// failed is still reported as `StoreError::Relationship`, but every later
/// write and the commit return `StoreError::Backend`, so the group is rolled
/// back. `MemoryGraphStore` keeps going after a failed edge.
#[async_trait]
pub trait EdgeTransaction: Send + Sized {
    async fn node_exists(&mut self, name: &str) -> Result<bool, StoreError>;

    async fn create_node(&mut self, node: &Node) -> Result<(), StoreError>;

    /// Fails with `StoreError::Relationship` when only this edge is at fault
    async fn create_relationship(
        &mut self,
        from: &str,
        rel_type: &str,
        to: &str,
    ) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub from: String,
    pub rel_type: String,
    pub to: String,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryGraph {
    nodes: Vec<Node>,
    by_name: HashMap<String, usize>,
    relationships: Vec<Relationship>,
}

impl MemoryGraph {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.by_name.get(name).map(|&i| &self.nodes[i])
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Insert or overwrite by name, like `MERGE ... SET`
    fn upsert(&mut self, node: Node) {
        match self.by_name.get(&node.name) {
            Some(&i) => self.nodes[i] = node,
            None => {
                self.by_name.insert(node.name.clone(), self.nodes.len());
                self.nodes.push(node);
            }
        }
    }
}

/// In-process graph store for dry runs and tests
#[derive(Clone, Default)]
pub struct MemoryGraphStore {
    graph: Arc<Mutex<MemoryGraph>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> MemoryGraph {
        self.graph.lock().await.clone()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    type Txn = MemoryTxn;

    async fn merge_nodes(&self, nodes: &[Node]) -> Result<usize, StoreError> {
        let mut graph = self.graph.lock().await;
        for node in nodes {
            graph.upsert(node.clone());
        }
        Ok(graph.nodes.len())
    }

    async fn begin(&self) -> Result<MemoryTxn, StoreError> {
        Ok(MemoryTxn {
            graph: Arc::clone(&self.graph),
            nodes: Vec::new(),
            relationships: Vec::new(),
        })
    }
}

pub struct MemoryTxn {
    graph: Arc<Mutex<MemoryGraph>>,
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
}

#[async_trait]
impl EdgeTransaction for MemoryTxn {
    async fn node_exists(&mut self, name: &str) -> Result<bool, StoreError> {
        if self.nodes.iter().any(|n| n.name == name) {
            return Ok(true);
        }
        Ok(self.graph.lock().await.contains(name))
    }

    async fn create_node(&mut self, node: &Node) -> Result<(), StoreError> {
        if !self.node_exists(&node.name).await? {
            self.nodes.push(node.clone());
        }
        Ok(())
    }

    async fn create_relationship(
        &mut self,
        from: &str,
        rel_type: &str,
        to: &str,
    ) -> Result<(), StoreError> {
        for endpoint in [from, to] {
            if !self.node_exists(endpoint).await? {
                return Err(StoreError::Relationship {
                    from: from.to_string(),
                    rel_type: rel_type.to_string(),
                    to: to.to_string(),
                    reason: format!("node '{}' does not exist", endpoint),
                });
            }
        }
        self.relationships.push(Relationship {
            from: from.to_string(),
            rel_type: rel_type.to_string(),
            to: to.to_string(),
        });
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut graph = self.graph.lock().await;
        for node in self.nodes {
            if !graph.contains(&node.name) {
                graph.upsert(node);
            }
        }
        graph.relationships.extend(self.relationships);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}
