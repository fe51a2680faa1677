use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::SourceText;

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("no Wikipedia page titled '{0}'")]
    NotFound(String),

    #[error("'{0}' is ambiguous and resolves to a disambiguation page")]
    Ambiguous(String),

    #[error("Wikipedia returned an empty summary for '{0}'")]
    Empty(String),

    #[error("Wikipedia request for '{title}' failed: {status}")]
    Status { title: String, status: StatusCode },

    #[error("Wikipedia request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct WikipediaClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SummaryResponse {
    #[serde(rename = "type", default)]
    page_type: String,
    #[serde(default)]
    extract: String,
}

impl WikipediaClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the plain-text lead summary for a page title
    pub async fn fetch_summary(&self, title: &str) -> Result<String, AcquisitionError> {
        let slug = title.trim().replace(' ', "_");
        let url = format!(
            "{}/page/summary/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&slug)
        );
        debug!(title, %url, "Fetching Wikipedia summary");

        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(AcquisitionError::NotFound(title.to_string())),
            status if !status.is_success() => {
                return Err(AcquisitionError::Status {
                    title: title.to_string(),
                    status,
                });
            }
            _ => {}
        }

        let summary: SummaryResponse = response.json().await?;

        if summary.page_type == "disambiguation" {
            return Err(AcquisitionError::Ambiguous(title.to_string()));
        }
        if summary.extract.trim().is_empty() {
            return Err(AcquisitionError::Empty(title.to_string()));
        }

        Ok(summary.extract)
    }

    pub async fn fetch_source(&self, title: &str) -> Result<SourceText, AcquisitionError> {
        let text = self.fetch_summary(title).await?;
        Ok(SourceText::new(title, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_summary_returns_extract() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/page/summary/Barack_Obama"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"type": "standard", "title": "Barack Obama", "extract": "Barack Obama is an American politician."}"#,
            ))
            .mount(&mock_server)
            .await;

        let client = WikipediaClient::new(mock_server.uri());
        let summary = client.fetch_summary("Barack Obama").await.unwrap();

        assert_eq!(summary, "Barack Obama is an American politician.");
    }

    #[tokio::test]
    async fn test_disambiguation_page_is_ambiguous() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/page/summary/Mercury"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"type": "disambiguation", "extract": "Mercury may refer to:"}"#,
            ))
            .mount(&mock_server)
            .await;

        let client = WikipediaClient::new(mock_server.uri());
        let err = client.fetch_summary("Mercury").await.unwrap_err();

        assert!(matches!(err, AcquisitionError::Ambiguous(t) if t == "Mercury"));
    }

    #[tokio::test]
    async fn test_missing_page_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = WikipediaClient::new(mock_server.uri());
        let err = client.fetch_source("No Such Page").await.unwrap_err();

        assert!(matches!(err, AcquisitionError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_blank_extract_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"type": "standard", "extract": "  "}"#),
            )
            .mount(&mock_server)
            .await;

        let client = WikipediaClient::new(mock_server.uri());
        let err = client.fetch_summary("Blank").await.unwrap_err();

        assert!(matches!(err, AcquisitionError::Empty(_)));
    }
}
