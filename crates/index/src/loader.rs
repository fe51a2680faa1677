use std::collections::HashMap;
use tracing::{info, warn};

use crate::EmbeddedTriple;
use crate::graph::{
    Edge, Node, dedup_nodes, edges_from_triples, nodes_from_triples, relationship_type,
    sanitize_labels,
};
use crate::store::{EdgeTransaction, GraphStore, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The verb is not usable as a relationship type
    InvalidRelationshipType,
    /// The target is absent and the edge carries nothing to create it from
    MissingTargetAttributes,
    RelationshipFailed(String),
}

#[derive(Debug, Clone)]
pub struct SkippedEdge {
    pub edge: Edge,
    pub reason: SkipReason,
}

/// Outcome of one verb group, committed or rolled back as a unit
#[derive(Debug, Clone)]
pub struct EdgeGroupReport {
    pub verb: String,
    pub inserted: usize,
    pub skipped: Vec<SkippedEdge>,
    /// Set when the group was rolled back
    pub error: Option<String>,
}

impl EdgeGroupReport {
    fn new(verb: &str) -> Self {
        Self {
            verb: verb.to_string(),
            inserted: 0,
            skipped: Vec::new(),
            error: None,
        }
    }

    pub fn committed(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub node_count: usize,
    pub groups: Vec<EdgeGroupReport>,
}

impl LoadReport {
    pub fn edges_inserted(&self) -> usize {
        self.groups.iter().map(|g| g.inserted).sum()
    }

    pub fn edges_skipped(&self) -> usize {
        self.groups.iter().map(|g| g.skipped.len()).sum()
    }

    pub fn failed_groups(&self) -> impl Iterator<Item = &EdgeGroupReport> {
        self.groups.iter().filter(|g| !g.committed())
    }
}

/// Group edges by verb, groups in first-seen order
pub fn group_by_verb(edges: Vec<Edge>) -> Vec<(String, Vec<Edge>)> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Edge>)> = Vec::new();

    for edge in edges {
        match positions.get(&edge.verb) {
            Some(&i) => groups[i].1.push(edge),
            None => {
                positions.insert(edge.verb.clone(), groups.len());
                groups.push((edge.verb.clone(), vec![edge]));
            }
        }
    }

    groups
}

pub struct GraphLoader<S> {
    store: S,
}

impl<S: GraphStore> GraphLoader<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Dedup by name, drop blank labels, merge in one batch
    pub async fn load_nodes(&self, nodes: Vec<Node>) -> Result<usize, StoreError> {
        let nodes = sanitize_labels(dedup_nodes(nodes));
        let count = self.store.merge_nodes(&nodes).await?;
        info!(merged = nodes.len(), total = count, "Loaded nodes");
        Ok(count)
    }

    /// Insert edges one verb group per transaction
    pub async fn load_edges(&self, edges: Vec<Edge>) -> Vec<EdgeGroupReport> {
        let mut reports = Vec::new();

        for (verb, group) in group_by_verb(edges) {
            let report = self.load_group(&verb, group).await;
            if let Some(error) = &report.error {
                warn!(verb = %report.verb, error = %error, "Edge group rolled back");
            } else {
                info!(
                    verb = %report.verb,
                    inserted = report.inserted,
                    skipped = report.skipped.len(),
                    "Committed edge group"
                );
            }
            reports.push(report);
        }

        reports
    }

    async fn load_group(&self, verb: &str, edges: Vec<Edge>) -> EdgeGroupReport {
        let mut report = EdgeGroupReport::new(verb);

        let Some(rel_type) = relationship_type(verb) else {
            report.skipped = edges
                .into_iter()
                .map(|edge| SkippedEdge {
                    edge,
                    reason: SkipReason::InvalidRelationshipType,
                })
                .collect();
            return report;
        };

        let mut txn = match self.store.begin().await {
            Ok(txn) => txn,
            Err(e) => {
                report.error = Some(e.to_string());
                return report;
            }
        };

        match insert_group(&mut txn, rel_type, edges).await {
            Ok((inserted, skipped)) => match txn.commit().await {
                Ok(()) => {
                    report.inserted = inserted;
                    report.skipped = skipped;
                }
                Err(e) => report.error = Some(e.to_string()),
            },
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(verb, error = %rollback_err, "Rollback failed");
                }
                report.error = Some(e.to_string());
            }
        }

        report
    }

    /// Load embedded triples: object nodes first, then verb-labelled edges
    pub async fn load(&self, triples: &[EmbeddedTriple]) -> Result<LoadReport, StoreError> {
        let node_count = self.load_nodes(nodes_from_triples(triples)).await?;
        let groups = self.load_edges(edges_from_triples(triples)).await;

        Ok(LoadReport { node_count, groups })
    }
}

async fn insert_group<T: EdgeTransaction>(
    txn: &mut T,
    rel_type: &str,
    edges: Vec<Edge>,
) -> Result<(usize, Vec<SkippedEdge>), StoreError> {
    let mut inserted = 0;
    let mut skipped = Vec::new();

    for edge in edges {
        if !txn.node_exists(&edge.source).await? {
            txn.create_node(&Node::named(edge.source.as_str())).await?;
        }

        if !txn.node_exists(&edge.target).await? {
            match edge.target_template.as_ref().filter(|t| t.is_complete()) {
                Some(template) => txn.create_node(template).await?,
                None => {
                    skipped.push(SkippedEdge {
                        edge,
                        reason: SkipReason::MissingTargetAttributes,
                    });
                    continue;
                }
            }
        }

        match txn.create_relationship(&edge.source, rel_type, &edge.target).await {
            Ok(()) => inserted += 1,
            Err(StoreError::Relationship { reason, .. }) => {
                skipped.push(SkippedEdge {
                    edge,
                    reason: SkipReason::RelationshipFailed(reason),
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok((inserted, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryGraphStore, MemoryTxn};
    use async_trait::async_trait;

    fn complete(name: &str) -> Node {
        Node {
            embedding: Some(vec![0.1, 0.2]),
            ..Node::named(name)
        }
    }

    fn edge(source: &str, verb: &str, target: &str) -> Edge {
        Edge {
            target_template: Some(complete(target)),
            ..Edge::new(source, verb, target)
        }
    }

    #[test]
    fn test_group_by_verb_first_seen_order() {
        let groups = group_by_verb(vec![
            edge("a", "meet", "b"),
            edge("a", "win", "c"),
            edge("d", "meet", "e"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "meet");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "win");
    }

    #[tokio::test]
    async fn test_load_edges_creates_missing_endpoints() {
        let loader = GraphLoader::new(MemoryGraphStore::new());
        loader.load_nodes(vec![complete("biden")]).await.unwrap();

        let reports = loader.load_edges(vec![edge("obama", "meet", "biden")]).await;

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].inserted, 1);
        let graph = loader.store().snapshot().await;
        assert!(graph.node("obama").is_some());
        assert_eq!(graph.relationships()[0].rel_type, "meet");
    }

    #[tokio::test]
    async fn test_target_without_attributes_is_skipped() {
        let loader = GraphLoader::new(MemoryGraphStore::new());

        let reports = loader
            .load_edges(vec![Edge::new("obama", "meet", "biden"), edge("obama", "meet", "pelosi")])
            .await;

        assert_eq!(reports[0].inserted, 1);
        assert_eq!(reports[0].skipped.len(), 1);
        assert_eq!(reports[0].skipped[0].reason, SkipReason::MissingTargetAttributes);
        assert!(loader.store().snapshot().await.node("biden").is_none());
    }

    #[tokio::test]
    async fn test_invalid_verb_skips_group() {
        let loader = GraphLoader::new(MemoryGraphStore::new());

        let reports = loader
            .load_edges(vec![edge("obama", "-PRON-", "biden"), edge("obama", "meet", "biden")])
            .await;

        assert_eq!(reports[0].skipped[0].reason, SkipReason::InvalidRelationshipType);
        assert!(reports[0].committed());
        assert_eq!(reports[1].inserted, 1);
    }

    /// Store whose transactions fail with a backend error when creating `poison`
    #[derive(Clone, Default)]
    struct FlakyStore {
        inner: MemoryGraphStore,
    }

    struct FlakyTxn {
        inner: MemoryTxn,
    }

    #[async_trait]
    impl GraphStore for FlakyStore {
        type Txn = FlakyTxn;

        async fn merge_nodes(&self, nodes: &[Node]) -> Result<usize, StoreError> {
            self.inner.merge_nodes(nodes).await
        }

        async fn begin(&self) -> Result<FlakyTxn, StoreError> {
            Ok(FlakyTxn {
                inner: self.inner.begin().await?,
            })
        }
    }

    #[async_trait]
    impl EdgeTransaction for FlakyTxn {
        async fn node_exists(&mut self, name: &str) -> Result<bool, StoreError> {
            self.inner.node_exists(name).await
        }

        async fn create_node(&mut self, node: &Node) -> Result<(), StoreError> {
            if node.name == "poison" {
                return Err(StoreError::Backend("connection reset".to_string()));
            }
            self.inner.create_node(node).await
        }

        async fn create_relationship(
            &mut self,
            from: &str,
            rel_type: &str,
            to: &str,
        ) -> Result<(), StoreError> {
            self.inner.create_relationship(from, rel_type, to).await
        }

        async fn commit(self) -> Result<(), StoreError> {
            self.inner.commit().await
        }

        async fn rollback(self) -> Result<(), StoreError> {
            self.inner.rollback().await
        }
    }

    /// Transaction that, like Neo4j, refuses all work after one failed statement
    #[derive(Clone, Default)]
    struct AbortingStore {
        inner: MemoryGraphStore,
    }

    struct AbortingTxn {
        inner: MemoryTxn,
        aborted: bool,
    }

    impl AbortingTxn {
        fn ensure_open(&self) -> Result<(), StoreError> {
            if self.aborted {
                return Err(StoreError::Backend("transaction aborted".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl GraphStore for AbortingStore {
        type Txn = AbortingTxn;

        async fn merge_nodes(&self, nodes: &[Node]) -> Result<usize, StoreError> {
            self.inner.merge_nodes(nodes).await
        }

        async fn begin(&self) -> Result<AbortingTxn, StoreError> {
            Ok(AbortingTxn {
                inner: self.inner.begin().await?,
                aborted: false,
            })
        }
    }

    #[async_trait]
    impl EdgeTransaction for AbortingTxn {
        async fn node_exists(&mut self, name: &str) -> Result<bool, StoreError> {
            self.inner.node_exists(name).await
        }

        async fn create_node(&mut self, node: &Node) -> Result<(), StoreError> {
            self.ensure_open()?;
            self.inner.create_node(node).await
        }

        async fn create_relationship(
            &mut self,
            from: &str,
            rel_type: &str,
            to: &str,
        ) -> Result<(), StoreError> {
            self.ensure_open()?;
            if to == "rejected" {
                self.aborted = true;
                return Err(StoreError::Relationship {
                    from: from.to_string(),
                    rel_type: rel_type.to_string(),
                    to: to.to_string(),
                    reason: "constraint violation".to_string(),
                });
            }
            self.inner.create_relationship(from, rel_type, to).await
        }

        async fn commit(self) -> Result<(), StoreError> {
            self.ensure_open()?;
            self.inner.commit().await
        }

        async fn rollback(self) -> Result<(), StoreError> {
            self.inner.rollback().await
        }
    }

    #[tokio::test]
    async fn test_aborted_transaction_rolls_back_group() {
        let store = AbortingStore::default();
        let loader = GraphLoader::new(store.clone());

        let reports = loader
            .load_edges(vec![
                edge("obama", "meet", "rejected"),
                edge("obama", "meet", "biden"),
                edge("obama", "win", "election"),
            ])
            .await;

        assert!(!reports[0].committed());
        assert_eq!(reports[0].inserted, 0);
        assert!(reports[1].committed());

        let graph = store.inner.snapshot().await;
        assert!(graph.node("biden").is_none());
        assert_eq!(graph.relationships().len(), 1);
        assert_eq!(graph.relationships()[0].rel_type, "win");
    }

    #[tokio::test]
    async fn test_failed_last_edge_fails_commit() {
        let store = AbortingStore::default();
        let loader = GraphLoader::new(store.clone());

        let reports = loader
            .load_edges(vec![edge("obama", "meet", "biden"), edge("obama", "meet", "rejected")])
            .await;

        assert!(!reports[0].committed());
        assert!(store.inner.snapshot().await.relationships().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_rolls_back_whole_group() {
        let store = FlakyStore::default();
        let loader = GraphLoader::new(store.clone());

        let reports = loader
            .load_edges(vec![
                edge("obama", "meet", "biden"),
                edge("obama", "meet", "poison"),
                edge("obama", "win", "election"),
            ])
            .await;

        assert!(!reports[0].committed());
        assert_eq!(reports[0].inserted, 0);
        assert!(reports[1].committed());

        let graph = store.inner.snapshot().await;
        assert!(graph.node("biden").is_none());
        assert_eq!(graph.relationships().len(), 1);
        assert_eq!(graph.relationships()[0].rel_type, "win");
    }
}
