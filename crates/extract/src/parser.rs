use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::schema::Token;

/// Dependency parser used by the extractor and the normalizer
#[async_trait]
pub trait DependencyParser: Send + Sync {
    /// Parse text with noun chunks merged into single tokens
    async fn parse(&self, text: &str) -> Result<Vec<Token>>;

    /// Tokenize text without merging, used for stop-word stripping
    async fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        self.parse(text).await
    }
}

/// Client for a spaCy model served over HTTP
#[derive(Clone)]
pub struct SpacyClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    text: &'a str,
    model: &'a str,
    merge_noun_chunks: bool,
}

#[derive(Deserialize)]
struct ParseResponse {
    tokens: Vec<Token>,
}

impl SpacyClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }

    async fn request(&self, text: &str, merge_noun_chunks: bool) -> Result<Vec<Token>> {
        let url = format!("{}/parse", self.base_url.trim_end_matches('/'));

        let request = ParseRequest {
            text,
            model: &self.model,
            merge_noun_chunks,
        };

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to parser service")?;

        if !response.status().is_success() {
            anyhow::bail!("Parser request failed: {}", response.status());
        }

        let parsed: ParseResponse = response
            .json()
            .await
            .context("Failed to parse parser service response")?;

        Ok(parsed.tokens)
    }
}

#[async_trait]
impl DependencyParser for SpacyClient {
    async fn parse(&self, text: &str) -> Result<Vec<Token>> {
        self.request(text, true).await
    }

    async fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        self.request(text, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKENS: &str = r#"{"tokens": [
        {"text": "Obama", "lower": "obama", "lemma": "Obama", "idx": 0, "dep": "nsubj", "is_stop": false, "is_punct": false},
        {"text": "met", "lower": "met", "lemma": "meet", "idx": 6, "dep": "ROOT", "is_stop": false, "is_punct": false}
    ]}"#;

    #[tokio::test]
    async fn test_parse_merges_noun_chunks() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/parse"))
            .and(body_partial_json(serde_json::json!({"merge_noun_chunks": true})))
            .respond_with(ResponseTemplate::new(200).set_body_string(TOKENS))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = SpacyClient::new(mock_server.uri(), "en_core_web_md".to_string());
        let tokens = client.parse("Obama met").await.unwrap();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].lemma, "meet");
        assert_eq!(tokens[1].idx, 6);
    }

    #[tokio::test]
    async fn test_tokenize_does_not_merge() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/parse"))
            .and(body_partial_json(serde_json::json!({"merge_noun_chunks": false})))
            .respond_with(ResponseTemplate::new(200).set_body_string(TOKENS))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = SpacyClient::new(mock_server.uri(), "en_core_web_md".to_string());
        let tokens = client.tokenize("Obama met").await.unwrap();

        assert_eq!(tokens[0].lower, "obama");
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = SpacyClient::new(mock_server.uri(), "en_core_web_md".to_string());

        assert!(client.parse("anything").await.is_err());
    }
}
