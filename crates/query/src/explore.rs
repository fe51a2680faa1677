use anyhow::{Context, Result};
use neo4rs::{Graph, Query};
use serde::Serialize;
use tracing::info;

use index::Node;

#[derive(Debug, Clone, Serialize)]
pub struct Neighbour {
    pub verb: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredNode {
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionStats {
    pub node_count: usize,
    pub relationship_count: usize,
}

/// GDS cosine rejects empty or unequal-length vectors, so both are filtered out
const MOST_SIMILAR: &str = r#"
    MATCH (a:Node {name: $name}), (b:Node)
    WHERE a <> b
      AND a[$property] IS NOT NULL AND b[$property] IS NOT NULL
      AND size(a[$property]) > 0
      AND size(b[$property]) = size(a[$property])
    RETURN b.name AS name, gds.similarity.cosine(a[$property], b[$property]) AS score
    ORDER BY score DESC
    LIMIT $k
"#;

/// Ad hoc Cypher over a loaded graph, including APOC and GDS calls
pub struct GraphExplorer {
    graph: Graph,
}

impl GraphExplorer {
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }

    /// All `Node` vertices with their stored attributes
    pub async fn fetch_nodes(&self) -> Result<Vec<Node>> {
        let query = Query::new(
            r#"
            MATCH (n:Node)
            RETURN n.name AS name, n.description AS description,
                   n.labels AS labels, n.url AS url, n.embedding AS embedding
            "#.to_string()
        );

        let mut result = self.graph.execute(query).await
            .context("Failed to fetch nodes")?;

        let mut nodes = Vec::new();
        while let Some(row) = result.next().await? {
            let name: String = row.get("name").context("Missing name")?;
            nodes.push(Node {
                name,
                description: row.get::<String>("description").ok().filter(|d| !d.is_empty()),
                labels: row.get::<Vec<String>>("labels").unwrap_or_default(),
                url: row.get::<String>("url").ok().filter(|u| !u.is_empty()),
                embedding: row.get::<Vec<f64>>("embedding").ok().filter(|e| !e.is_empty()),
            });
        }

        Ok(nodes)
    }

    pub async fn neighbours(&self, name: &str) -> Result<Vec<Neighbour>> {
        let query = Query::new(
            r#"
            MATCH (n:Node {name: $name})-[r]->(m:Node)
            RETURN type(r) AS verb, m.name AS target
            ORDER BY verb, target
            "#.to_string()
        ).param("name", name.to_string());

        let mut result = self.graph.execute(query).await?;

        let mut neighbours = Vec::new();
        while let Some(row) = result.next().await? {
            neighbours.push(Neighbour {
                verb: row.get("verb")?,
                target: row.get("target")?,
            });
        }

        Ok(neighbours)
    }

    /// Names of nodes whose knowledge-graph types include `label`
    pub async fn nodes_with_type(&self, label: &str) -> Result<Vec<String>> {
        let query = Query::new(
            "MATCH (n:Node) WHERE $label IN n.labels RETURN n.name AS name ORDER BY name".to_string()
        ).param("label", label.to_string());

        let mut result = self.graph.execute(query).await?;

        let mut names = Vec::new();
        while let Some(row) = result.next().await? {
            names.push(row.get("name")?);
        }

        Ok(names)
    }

    /// Turn a knowledge-graph type stored in `n.labels` into a real node label
    pub async fn propagate_type_label(&self, label: &str) -> Result<usize> {
        let query = Query::new(
            r#"
            MATCH (n:Node) WHERE $label IN n.labels
            CALL apoc.create.addLabels(n, [$label]) YIELD node
            RETURN count(node) AS count
            "#.to_string()
        ).param("label", label.to_string());

        let mut result = self.graph.execute(query).await
            .context("Label propagation failed, is APOC installed?")?;

        let count = match result.next().await? {
            Some(row) => row.get::<i64>("count").unwrap_or(0) as usize,
            None => 0,
        };

        info!(label, count, "Propagated type label");
        Ok(count)
    }

    /// Project all `Node` vertices and relationships, undirected, into GDS
    pub async fn project(&self, projection: &str) -> Result<ProjectionStats> {
        let query = Query::new(
            r#"
            CALL gds.graph.project($projection, 'Node', {ALL: {type: '*', orientation: 'UNDIRECTED'}})
            YIELD nodeCount, relationshipCount
            RETURN nodeCount, relationshipCount
            "#.to_string()
        ).param("projection", projection.to_string());

        let mut result = self.graph.execute(query).await
            .context("Graph projection failed, is GDS installed?")?;

        let row = result.next().await?
            .context("Graph projection returned no row")?;

        Ok(ProjectionStats {
            node_count: row.get::<i64>("nodeCount").unwrap_or(0) as usize,
            relationship_count: row.get::<i64>("relationshipCount").unwrap_or(0) as usize,
        })
    }

    /// Write FastRP embeddings for a projection back to the nodes
    pub async fn write_fastrp(
        &self,
        projection: &str,
        dimension: usize,
        property: &str,
    ) -> Result<usize> {
        let query = Query::new(
            r#"
            CALL gds.fastRP.write($projection, {embeddingDimension: $dimension, writeProperty: $property})
            YIELD nodePropertiesWritten
            RETURN nodePropertiesWritten
            "#.to_string()
        )
        .param("projection", projection.to_string())
        .param("dimension", dimension as i64)
        .param("property", property.to_string());

        let mut result = self.graph.execute(query).await
            .context("FastRP write failed")?;

        let written = match result.next().await? {
            Some(row) => row.get::<i64>("nodePropertiesWritten").unwrap_or(0) as usize,
            None => 0,
        };

        info!(projection, property, written, "Wrote FastRP embeddings");
        Ok(written)
    }

    pub async fn drop_projection(&self, projection: &str) -> Result<()> {
        let query = Query::new("CALL gds.graph.drop($projection, false) YIELD graphName".to_string())
            .param("projection", projection.to_string());

        self.graph.run(query).await
            .context("Failed to drop projection")?;

        Ok(())
    }

    /// Nodes closest to `name` by cosine over a stored vector property
    pub async fn most_similar(&self, name: &str, property: &str, k: usize) -> Result<Vec<ScoredNode>> {
        let query = Query::new(MOST_SIMILAR.to_string())
            .param("name", name.to_string())
            .param("property", property.to_string())
            .param("k", k as i64);

        let mut result = self.graph.execute(query).await?;

        let mut scored = Vec::new();
        while let Some(row) = result.next().await? {
            scored.push(ScoredNode {
                name: row.get("name")?,
                score: row.get("score")?,
            });
        }

        Ok(scored)
    }
}
