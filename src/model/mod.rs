use std::env;
use std::sync::OnceLock;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::web::models::Message;

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider credential is not configured")]
    ConfigurationMissing,

    #[error("provider rejected the credential")]
    Unauthorized,

    #[error("provider quota exceeded")]
    QuotaExceeded,

    #[error("provider failure: {0}")]
    ProviderFailure(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::ProviderFailure(e.to_string())
    }
}

/// Body of a chat-completions call.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Token accounting reported by the provider, kept as the raw JSON object
/// so it is echoed back unchanged.
pub type Usage = Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Content of the first choice, if the provider produced one.
    pub content: Option<String>,
    pub usage: Option<Usage>,
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion, LlmError>;
}

// Minimal subset of the chat-completions response we read.
#[derive(Deserialize)]
struct ApiResponse {
    // A null entry reads as "no choice" rather than a malformed body
    choices: Vec<Option<Choice>>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Bearer credential for the provider.
///
/// Environment-backed keys are looked up on every call until one is found
/// and then cached for the life of the process.
pub struct ApiKey {
    var: Option<String>,
    cached: OnceLock<String>,
}

impl ApiKey {
    pub fn from_env(var: impl Into<String>) -> Self {
        Self {
            var: Some(var.into()),
            cached: OnceLock::new(),
        }
    }

    #[cfg(test)]
    pub fn fixed(key: impl Into<String>) -> Self {
        let cached = OnceLock::new();
        let _ = cached.set(key.into());
        Self { var: None, cached }
    }

    #[cfg(test)]
    pub fn missing() -> Self {
        Self {
            var: None,
            cached: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Option<&str> {
        if let Some(key) = self.cached.get() {
            return Some(key);
        }
        let var = self.var.as_deref()?;
        let key = env::var(var).ok().filter(|k| !k.trim().is_empty())?;
        info!("Loaded provider credential from {}", var);
        Some(self.cached.get_or_init(|| key))
    }
}

// Client for an OpenAI-compatible chat-completions API
pub struct OpenAiModel {
    base_url: String,
    client: Client,
    api_key: ApiKey,
}

impl OpenAiModel {
    pub fn new(base_url: impl Into<String>, api_key: ApiKey) -> Self {
        let base_url = base_url.into();
        info!("Using chat-completions provider at: {}", base_url);

        Self {
            base_url,
            client: Client::new(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), COMPLETIONS_PATH)
    }
}

#[async_trait]
impl ChatCompletion for OpenAiModel {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion, LlmError> {
        let api_key = self.api_key.get().ok_or(LlmError::ConfigurationMissing)?;

        info!(
            "Requesting completion from {} ({} messages, max_tokens: {})",
            request.model,
            request.messages.len(),
            request.max_tokens
        );
        debug!(
            "Payload: {}",
            serde_json::to_string(request).unwrap_or_default()
        );

        // One attempt only; a failed call is reported, never retried.
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED => {
                    warn!("Provider rejected the credential: {}", error_text);
                    LlmError::Unauthorized
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    warn!("Provider quota exceeded: {}", error_text);
                    LlmError::QuotaExceeded
                }
                _ => {
                    error!("Provider request failed with {}: {}", status, error_text);
                    LlmError::ProviderFailure(format!("status {}", status))
                }
            });
        }

        let body: ApiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse provider response: {}", e);
            LlmError::ProviderFailure(format!("unexpected response body: {}", e))
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .flatten()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);

        debug!(
            "Response length: {} characters",
            content.as_deref().map_or(0, |c| c.chars().count())
        );
        Ok(Completion {
            content,
            usage: body.usage,
        })
    }
}
