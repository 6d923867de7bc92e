use async_trait::async_trait;
use quiz_core::model::Question;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{FetchOutcome, QuestionProvider};
use crate::config::QuizConfig;
use crate::error::ProviderError;

/// Fetches the question document over HTTP, optionally through a relay proxy.
#[derive(Clone)]
pub struct HttpQuestionProvider {
    client: Client,
    config: QuizConfig,
}

impl HttpQuestionProvider {
    #[must_use]
    pub fn new(config: QuizConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn fetch_questions(&self) -> Result<Vec<Question>, ProviderError> {
        let url = self.config.request_url();
        tracing::debug!(%url, "requesting quiz questions");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        decode_document(&body, self.config.proxy_url.is_some())
    }
}

#[async_trait]
impl QuestionProvider for HttpQuestionProvider {
    async fn fetch(&self) -> FetchOutcome {
        FetchOutcome::from_result(self.fetch_questions().await)
    }
}

/// The question source's document. Only `questions` is read.
#[derive(Debug, Deserialize)]
pub struct QuestionDocument {
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct ProxyEnvelope {
    contents: Option<String>,
    #[serde(default)]
    status: Option<ProxyStatus>,
}

#[derive(Debug, Deserialize)]
struct ProxyStatus {
    http_code: Option<u16>,
}

/// Decode a response body into questions.
///
/// When `proxied` is set the body is the relay's `{"contents": "<document>"}`
/// envelope and the document is unwrapped first.
///
/// # Errors
///
/// Returns `ProviderError::Malformed` for undecodable JSON,
/// `ProviderError::HttpStatus` when the relay reports a failed upstream status and
/// `ProviderError::Unavailable` when the relay returned no contents.
pub fn decode_document(body: &str, proxied: bool) -> Result<Vec<Question>, ProviderError> {
    if !proxied {
        let document: QuestionDocument = serde_json::from_str(body)?;
        return Ok(document.questions);
    }

    let envelope: ProxyEnvelope = serde_json::from_str(body)?;
    if let Some(code) = envelope.status.and_then(|status| status.http_code) {
        let status = StatusCode::from_u16(code)
            .map_err(|_| ProviderError::Unavailable(format!("relay reported status {code}")))?;
        if !status.is_success() {
            return Err(ProviderError::HttpStatus(status));
        }
    }
    let contents = envelope
        .contents
        .ok_or_else(|| ProviderError::Unavailable("relay returned no contents".into()))?;
    let document: QuestionDocument = serde_json::from_str(&contents)?;
    Ok(document.questions)
}
