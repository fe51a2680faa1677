use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top match returned by a knowledge-graph lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMatch {
    pub name: String,
    pub description: String,
    pub labels: Vec<String>,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("knowledge graph request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("knowledge graph returned {0}")]
    Status(StatusCode),

    #[error("malformed knowledge graph response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Entity metadata lookup by free-text query
#[async_trait]
pub trait EntityLookup: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<Option<EntityMatch>, LookupError>;
}

/// Client for the Google Knowledge Graph Search API
#[derive(Clone)]
pub struct KnowledgeGraphClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(rename = "itemListElement", default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    result: EntityResult,
}

#[derive(Deserialize)]
struct EntityResult {
    #[serde(default)]
    name: String,
    #[serde(rename = "@type", default)]
    types: TypeLabels,
    #[serde(rename = "detailedDescription")]
    detailed_description: Option<DetailedDescription>,
}

#[derive(Deserialize)]
struct DetailedDescription {
    #[serde(rename = "articleBody", default)]
    article_body: String,
    #[serde(default)]
    url: String,
}

/// `@type` arrives as a list, but partially populated entries carry a bare string
#[derive(Deserialize)]
#[serde(untagged)]
enum TypeLabels {
    Many(Vec<String>),
    One(String),
}

impl Default for TypeLabels {
    fn default() -> Self {
        TypeLabels::Many(Vec::new())
    }
}

impl From<TypeLabels> for Vec<String> {
    fn from(labels: TypeLabels) -> Self {
        match labels {
            TypeLabels::Many(labels) => labels,
            TypeLabels::One(label) => vec![label],
        }
    }
}

impl KnowledgeGraphClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Run a search for the single best match
    pub async fn search(&self, query: &str) -> Result<Vec<EntityMatch>, LookupError> {
        let response = self.client
            .get(&self.base_url)
            .query(&[
                ("query", query),
                ("limit", "1"),
                ("indent", "True"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }

        let body = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;

        Ok(parsed
            .items
            .into_iter()
            .map(|item| {
                let detailed = item.result.detailed_description;
                EntityMatch {
                    name: item.result.name,
                    labels: item.result.types.into(),
                    description: detailed
                        .as_ref()
                        .map(|d| d.article_body.clone())
                        .unwrap_or_default(),
                    url: detailed.map(|d| d.url).unwrap_or_default(),
                }
            })
            .collect())
    }
}

#[async_trait]
impl EntityLookup for KnowledgeGraphClient {
    async fn lookup(&self, query: &str) -> Result<Option<EntityMatch>, LookupError> {
        Ok(self.search(query).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_lookup_reads_top_match() {
        let mock_server = MockServer::start().await;

        let response_json = r#"{
            "@type": "ItemList",
            "itemListElement": [{
                "@type": "EntitySearchResult",
                "result": {
                    "name": "Joe Biden",
                    "@type": ["Thing", "Person"],
                    "description": "President of the United States",
                    "detailedDescription": {
                        "articleBody": "Joseph Robinette Biden Jr. is an American politician.",
                        "url": "https://en.wikipedia.org/wiki/Joe_Biden"
                    }
                },
                "resultScore": 1534.2
            }]
        }"#;

        Mock::given(method("GET"))
            .and(query_param("query", "biden"))
            .and(query_param("limit", "1"))
            .and(query_param("key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(response_json))
            .mount(&mock_server)
            .await;

        let client = KnowledgeGraphClient::new(mock_server.uri(), "secret".to_string());
        let found = client.lookup("biden").await.unwrap().unwrap();

        assert_eq!(found.name, "Joe Biden");
        assert_eq!(found.labels, vec!["Thing", "Person"]);
        assert_eq!(found.url, "https://en.wikipedia.org/wiki/Joe_Biden");
        assert!(found.description.starts_with("Joseph Robinette Biden"));
    }

    #[tokio::test]
    async fn test_single_string_type_becomes_list() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"itemListElement": [{"result": {"name": "Senate", "@type": "Thing"}}]}"#,
            ))
            .mount(&mock_server)
            .await;

        let client = KnowledgeGraphClient::new(mock_server.uri(), "secret".to_string());
        let found = client.lookup("senate").await.unwrap().unwrap();

        assert_eq!(found.labels, vec!["Thing"]);
        assert_eq!(found.description, "");
        assert_eq!(found.url, "");
    }

    #[tokio::test]
    async fn test_no_items_is_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"itemListElement": []}"#))
            .mount(&mock_server)
            .await;

        let client = KnowledgeGraphClient::new(mock_server.uri(), "secret".to_string());

        assert!(client.lookup("zzzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>quota</html>"))
            .mount(&mock_server)
            .await;

        let client = KnowledgeGraphClient::new(mock_server.uri(), "secret".to_string());
        let err = client.lookup("biden").await.unwrap_err();

        assert!(matches!(err, LookupError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let client = KnowledgeGraphClient::new(mock_server.uri(), "bad".to_string());
        let err = client.lookup("biden").await.unwrap_err();

        assert!(matches!(err, LookupError::Status(StatusCode::FORBIDDEN)));
    }
}
