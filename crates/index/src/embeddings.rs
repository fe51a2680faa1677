use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Anything that turns text into a fixed-length vector
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Clone)]
pub struct EmbeddingClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }

    /// Embed a sample once to learn the model dimensionality
    pub async fn get_dimension(&self) -> Result<usize> {
        let sample = self.embed("dimension check").await?;
        Ok(sample.len())
    }
}

#[async_trait]
impl TextEmbedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url.trim_end_matches('/'));

        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send embedding request")?;

        if !response.status().is_success() {
            anyhow::bail!("Embedding request failed: {}", response.status());
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        Ok(embedding_response.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_embed_posts_model_and_prompt() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_partial_json(serde_json::json!({
                "model": "nomic-embed-text",
                "prompt": "44th President"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"embedding": [0.5, -0.25, 1.0]}"#),
            )
            .mount(&mock_server)
            .await;

        let client = EmbeddingClient::new(mock_server.uri(), "nomic-embed-text".to_string());
        let vector = client.embed("44th President").await.unwrap();

        assert_eq!(vector, vec![0.5, -0.25, 1.0]);
    }

    #[tokio::test]
    async fn test_get_dimension() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"embedding": [0.0, 0.0, 0.0, 0.0]}"#),
            )
            .mount(&mock_server)
            .await;

        let client = EmbeddingClient::new(mock_server.uri(), "nomic-embed-text".to_string());

        assert_eq!(client.get_dimension().await.unwrap(), 4);
    }
}
