use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query, Txn};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::graph::Node;
use crate::store::{EdgeTransaction, GraphStore, StoreError};

/// Neo4j-backed graph store. Every vertex carries the `Node` label.
#[derive(Clone)]
pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }

    pub async fn connect(uri: &str, user: &str, password: &str, database: &str) -> Result<Self> {
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password)
            .db(database)
            .build()
            .context("Invalid Neo4j configuration")?;

        let graph = Graph::connect(config)
            .await
            .context(format!("Failed to connect to Neo4j at {}", uri))?;

        Ok(Self::new(graph))
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Initialize schema: index the natural key
    pub async fn init_schema(&self) -> Result<()> {
        let query = Query::new(
            "CREATE INDEX node_name_index IF NOT EXISTS FOR (n:Node) ON (n.name)".to_string()
        );
        self.graph.run(query).await
            .context("Failed to create index on Node.name")?;

        info!("Neo4j schema ready");
        Ok(())
    }

    async fn count(&self, cypher: &str) -> Result<usize, StoreError> {
        let mut result = self.graph.execute(Query::new(cypher.to_string())).await?;
        let count = match result.next().await? {
            Some(row) => row.get::<i64>("count").unwrap_or(0) as usize,
            None => 0,
        };
        Ok(count)
    }

    pub async fn get_stats(&self) -> Result<GraphStats> {
        let node_count = self.count("MATCH (n:Node) RETURN count(n) AS count").await?;
        let relationship_count = self.count("MATCH (:Node)-[r]->(:Node) RETURN count(r) AS count").await?;

        Ok(GraphStats {
            node_count,
            relationship_count,
        })
    }
}

/// Properties as written to Neo4j. Blank values become `null`, which leaves
/// the property unset instead of storing `""` or `[]`.
#[derive(Debug, Clone, PartialEq)]
struct StoredProperties {
    description: Option<String>,
    labels: Vec<String>,
    url: Option<String>,
    embedding: Option<Vec<f64>>,
}

impl StoredProperties {
    fn of(node: &Node) -> Self {
        Self {
            description: node.description.clone().filter(|d| !d.trim().is_empty()),
            labels: node.labels.clone(),
            url: node.url.clone().filter(|u| !u.trim().is_empty()),
            embedding: node.embedding.clone().filter(|e| !e.is_empty()),
        }
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    type Txn = Neo4jTxn;

    async fn merge_nodes(&self, nodes: &[Node]) -> Result<usize, StoreError> {
        if !nodes.is_empty() {
            let names: Vec<String> = nodes.iter().map(|n| n.name.clone()).collect();
            let stored: Vec<StoredProperties> = nodes.iter().map(StoredProperties::of).collect();

            let query = Query::new(
                r#"
                UNWIND range(0, size($names) - 1) AS i
                MERGE (n:Node {name: $names[i]})
                SET n.description = $descriptions[i],
                    n.labels = $labels[i],
                    n.url = $urls[i],
                    n.embedding = $embeddings[i]
                "#.to_string()
            )
            .param("names", names)
            .param("descriptions", stored.iter().map(|p| p.description.clone()).collect::<Vec<_>>())
            .param("labels", stored.iter().map(|p| p.labels.clone()).collect::<Vec<_>>())
            .param("urls", stored.iter().map(|p| p.url.clone()).collect::<Vec<_>>())
            .param("embeddings", stored.iter().map(|p| p.embedding.clone()).collect::<Vec<_>>());

            self.graph.run(query).await?;
        }

        self.count("MATCH (n:Node) RETURN count(n) AS count").await
    }

    async fn begin(&self) -> Result<Neo4jTxn, StoreError> {
        let txn = self.graph.start_txn().await?;
        Ok(Neo4jTxn {
            graph: self.graph.clone(),
            txn,
            created: HashSet::new(),
            state: TxnState::default(),
        })
    }
}

/// Neo4j aborts an explicit transaction after its first failed statement
#[derive(Debug, Default)]
struct TxnState {
    aborted: Option<String>,
}

impl TxnState {
    fn ensure_open(&self) -> Result<(), StoreError> {
        match &self.aborted {
            Some(reason) => Err(StoreError::Backend(format!("transaction aborted: {}", reason))),
            None => Ok(()),
        }
    }

    fn abort(&mut self, reason: String) {
        self.aborted.get_or_insert(reason);
    }
}

/// The server answers a rejected statement with a failure message, which
/// neo4rs reports as `UnexpectedMessage`. Only that blames the edge itself.
fn relationship_error(e: neo4rs::Error, from: &str, rel_type: &str, to: &str) -> StoreError {
    match e {
        neo4rs::Error::UnexpectedMessage(reason) => StoreError::Relationship {
            from: from.to_string(),
            rel_type: rel_type.to_string(),
            to: to.to_string(),
            reason,
        },
        other => StoreError::Neo4j(other),
    }
}

/// One edge group's transaction.
/// Existence checks read committed data plus the names created here.
pub struct Neo4jTxn {
    graph: Graph,
    txn: Txn,
    created: HashSet<String>,
    state: TxnState,
}

#[async_trait]
impl EdgeTransaction for Neo4jTxn {
    async fn node_exists(&mut self, name: &str) -> Result<bool, StoreError> {
        if self.created.contains(name) {
            return Ok(true);
        }

        let query = Query::new("MATCH (n:Node {name: $name}) RETURN count(n) AS count".to_string())
            .param("name", name.to_string());
        let mut result = self.graph.execute(query).await?;
        let found = match result.next().await? {
            Some(row) => row.get::<i64>("count").unwrap_or(0) > 0,
            None => false,
        };
        Ok(found)
    }

    async fn create_node(&mut self, node: &Node) -> Result<(), StoreError> {
        self.state.ensure_open()?;

        let stored = StoredProperties::of(node);
        let query = Query::new(
            r#"
            MERGE (n:Node {name: $name})
            ON CREATE SET n.description = $description,
                          n.labels = $labels,
                          n.url = $url,
                          n.embedding = $embedding
            "#.to_string()
        )
        .param("name", node.name.clone())
        .param("description", stored.description)
        .param("labels", stored.labels)
        .param("url", stored.url)
        .param("embedding", stored.embedding);

        if let Err(e) = self.txn.run(query).await {
            self.state.abort(e.to_string());
            return Err(e.into());
        }
        self.created.insert(node.name.clone());
        debug!(name = %node.name, "Created node");
        Ok(())
    }

    async fn create_relationship(
        &mut self,
        from: &str,
        rel_type: &str,
        to: &str,
    ) -> Result<(), StoreError> {
        self.state.ensure_open()?;

        // relationship types cannot be parameters; callers pass validated identifiers
        let query = Query::new(format!(
            "MATCH (s:Node {{name: $from}}), (t:Node {{name: $to}}) CREATE (s)-[:`{}`]->(t)",
            rel_type
        ))
        .param("from", from.to_string())
        .param("to", to.to_string());

        match self.txn.run(query).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.state.abort(e.to_string());
                Err(relationship_error(e, from, rel_type, to))
            }
        }
    }

    async fn commit(self) -> Result<(), StoreError> {
        if let Err(e) = self.state.ensure_open() {
            if let Err(rollback_err) = self.txn.rollback().await {
                debug!(error = %rollback_err, "Rollback of aborted transaction failed");
            }
            return Err(e);
        }
        self.txn.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.txn.rollback().await?;
        Ok(())
    }
}

#[derive(Debug, serde::Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub relationship_count: usize,
}
