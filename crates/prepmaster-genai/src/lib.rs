//! PrepMaster content service clients.
//!
//! HTTP clients for the remote service that writes interview questions and
//! scores answers. Two wire protocols are supported: Google Gemini
//! `generateContent` and any `OpenAI`-compatible chat completions endpoint.
//! [`ServiceBackend`] adapts either one to the orchestrator's
//! [`QuestionGenerator`](prepmaster_orchestrator::QuestionGenerator) and
//! [`AnswerEvaluator`](prepmaster_orchestrator::AnswerEvaluator) traits.

use std::sync::Arc;

use async_trait::async_trait;
use prepmaster_orchestrator::{GeneratorBackend, GeneratorConfig, ServiceErrorKind};
use secrecy::SecretString;
use thiserror::Error;

pub mod adapter;
pub mod gemini;
pub mod openai;
pub mod parse;
pub mod prompt;

pub use adapter::ServiceBackend;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

/// Errors raised while talking to the content service.
#[derive(Debug, Error)]
pub enum GenAiError {
    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The service answered without any content.
    #[error("service returned no content")]
    EmptyResponse,

    /// The API key environment variable is unset or empty.
    #[error("environment variable {var} is not set")]
    MissingApiKey {
        /// Name of the variable that was read.
        var: String,
    },

    /// The content could not be parsed into the expected shape.
    #[error("unusable response: {0}")]
    Parse(String),
}

impl GenAiError {
    /// Classifies the error for the orchestrator.
    #[must_use]
    pub fn kind(&self) -> ServiceErrorKind {
        match self {
            Self::Http(e) if e.is_timeout() => ServiceErrorKind::Timeout,
            Self::Http(e) if e.is_decode() => ServiceErrorKind::InvalidResponse,
            Self::Http(e) => match e.status() {
                Some(status) => classify_status(status.as_u16()),
                None => ServiceErrorKind::Network,
            },
            Self::Status { status, .. } => classify_status(*status),
            Self::EmptyResponse => ServiceErrorKind::EmptyResponse,
            Self::MissingApiKey { .. } => ServiceErrorKind::Authentication,
            Self::Parse(_) => ServiceErrorKind::InvalidResponse,
        }
    }
}

/// Maps an HTTP status code to an error kind.
#[must_use]
pub const fn classify_status(status: u16) -> ServiceErrorKind {
    match status {
        401 | 403 => ServiceErrorKind::Authentication,
        429 => ServiceErrorKind::RateLimit,
        500..=599 => ServiceErrorKind::Server,
        _ => ServiceErrorKind::Other,
    }
}

/// Longest error body kept in [`GenAiError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Builds a `Status` error from a failed response.
pub(crate) async fn status_error(response: reqwest::Response) -> GenAiError {
    let status = response.status().as_u16();
    let mut body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(status, error = %e, "Could not read error response body");
            String::new()
        }
    };
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    GenAiError::Status { status, body }
}

/// A service that turns a prompt into a JSON document.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Sends `prompt` and returns the raw text of the reply.
    ///
    /// `schema` describes the JSON the reply must follow, in the
    /// OpenAPI-subset form Gemini accepts.
    async fn complete_json(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<String, GenAiError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Reads the API key from the environment variable named in the config.
///
/// # Errors
///
/// Returns `GenAiError::MissingApiKey` if the variable is unset or blank.
pub fn api_key_from_env(config: &GeneratorConfig) -> Result<SecretString, GenAiError> {
    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(SecretString::from(key)),
        _ => Err(GenAiError::MissingApiKey {
            var: config.api_key_env.clone(),
        }),
    }
}

/// Builds the client for the configured backend.
///
/// # Errors
///
/// Returns `GenAiError::Http` if the HTTP client cannot be built.
pub fn connect(
    config: &GeneratorConfig,
    api_key: SecretString,
) -> Result<Arc<dyn ContentService>, GenAiError> {
    let service: Arc<dyn ContentService> = match config.backend {
        GeneratorBackend::Gemini => Arc::new(GeminiClient::new(config, api_key)?),
        GeneratorBackend::OpenAi => Arc::new(OpenAiClient::new(config, api_key)?),
    };
    tracing::info!(
        backend = %config.backend,
        model = %config.model,
        base_url = %config.base_url,
        "Content service configured"
    );
    Ok(service)
}
