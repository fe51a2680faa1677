use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkshopConfig {
    /// Wikipedia page titles to build the graph from
    pub titles: Vec<String>,
    /// Optional directory of local .txt/.md sources, read in addition to the titles
    pub text_dir: Option<PathBuf>,
    /// Extra layers built from enriched descriptions
    pub layers: usize,
    /// Log and skip titles Wikipedia cannot resolve instead of aborting
    pub skip_unavailable_titles: bool,
    pub wikipedia: WikipediaConfig,
    pub parser: ParserConfig,
    pub knowledge_graph: KnowledgeGraphConfig,
    pub embedding: EmbeddingConfig,
    pub neo4j: Neo4jConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikipediaConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeGraphConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
    /// Seed for placeholder vectors; random when unset
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub database: String,
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            titles: vec!["Barack Obama".to_string()],
            text_dir: None,
            layers: 1,
            skip_unavailable_titles: false,
            wikipedia: WikipediaConfig::default(),
            parser: ParserConfig::default(),
            knowledge_graph: KnowledgeGraphConfig::default(),
            embedding: EmbeddingConfig::default(),
            neo4j: Neo4jConfig::default(),
        }
    }
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org/api/rest_v1".to_string(),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            model: "en_core_web_md".to_string(),
        }
    }
}

impl Default for KnowledgeGraphConfig {
    fn default() -> Self {
        Self {
            base_url: "https://kgsearch.googleapis.com/v1/entities:search".to_string(),
            api_key: String::new(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimension: 768,
            seed: None,
        }
    }
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            database: "neo4j".to_string(),
        }
    }
}

impl WorkshopConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .context(format!("Failed to read config: {:?}", path))?;
        serde_json::from_str(&raw).context(format!("Invalid config: {:?}", path))
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Secrets and connection details come from the environment
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = var("KG_API_KEY") {
            self.knowledge_graph.api_key = key;
        }
        if let Some(uri) = var("NEO4J_URI") {
            self.neo4j.uri = uri;
        }
        if let Some(user) = var("NEO4J_USER") {
            self.neo4j.user = user;
        }
        if let Some(password) = var("NEO4J_PASSWORD") {
            self.neo4j.password = password;
        }
        if let Some(database) = var("NEO4J_DATABASE") {
            self.neo4j.database = database;
        }
    }
}
