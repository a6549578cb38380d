//! Text-completion capability for explanation generation.
//!
//! [`OpenAiClient`] talks to an OpenAI-compatible chat-completions endpoint.
//! The client is constructed once at startup (API key resolved from the
//! environment) and injected wherever completions are needed; there is no
//! global client state.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use luma_shared::{LumaError, OpenAiConfig, Result};

/// Characters of an error-response body echoed into a completion error.
const MAX_BODY_SNIPPET_CHARS: usize = 600;

// ---------------------------------------------------------------------------
// CompletionApi
// ---------------------------------------------------------------------------

/// An opaque prompt-to-text capability.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Submit `prompt` as a single user message with no surrounding history
    /// and return the completion text verbatim.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Wire types (chat-completions request/response)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

// ---------------------------------------------------------------------------
// OpenAiClient
// ---------------------------------------------------------------------------

/// [`CompletionApi`] backed by an OpenAI-compatible chat-completions API.
#[derive(Debug)]
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Build a client with an explicit API key.
    pub fn new(config: &OpenAiConfig, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LumaError::Completion(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.model.clone(),
        })
    }

    /// Build a client with the API key read from the env var named in config.
    pub fn from_env(config: &OpenAiConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                LumaError::config(format!(
                    "OpenAI API key not found. Set the {} environment variable.",
                    config.api_key_env
                ))
            })?;
        Self::new(config, api_key)
    }
}

#[async_trait]
impl CompletionApi for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, prompt_chars = prompt.len(), "requesting completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LumaError::Completion(format!("chat completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LumaError::Completion(format!(
                "chat completion API returned {status}: {}",
                body_snippet(&body)
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LumaError::Completion(format!("invalid chat completion response: {e}")))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                tokens_in = usage.prompt_tokens,
                tokens_out = usage.completion_tokens,
                "completion token usage"
            );
        }

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            LumaError::Completion("chat completion response contained no choices".into())
        })?;
        debug!(
            finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
            "completion received"
        );
        Ok(choice.message.content)
    }
}

/// First `MAX_BODY_SNIPPET_CHARS` characters of an error-response body.
fn body_snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_BODY_SNIPPET_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(MAX_BODY_SNIPPET_CHARS).collect();
    format!("{head}...")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
