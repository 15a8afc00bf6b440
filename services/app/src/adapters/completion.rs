//! services/app/src/adapters/completion.rs
//!
//! This module contains the adapter for the hosted chat-completion provider.
//! It implements the `CompletionService` port from the `core` crate over plain
//! HTTP so the provider's status code and response body survive into errors.

use async_trait::async_trait;
use dream_path_core::ports::{CompletionService, PortError, PortResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// The value shipped in example `.env` files; treated the same as no key at all.
pub const PLACEHOLDER_API_KEY: &str = "your_openrouter_api_key";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `CompletionService` port against an
/// OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenRouterAdapter {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    app_title: String,
    referer: String,
}

impl OpenRouterAdapter {
    /// Creates a new `OpenRouterAdapter`. A missing key is accepted here and reported
    /// on the first `complete` call.
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        app_title: impl Into<String>,
        referer: impl Into<String>,
    ) -> PortResult<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PortError::Unexpected(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            app_title: app_title.into(),
            referer: referer.into(),
        })
    }

    /// Replaces the HTTP client, keeping every other setting.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Returns the usable key, or a configuration error for a missing or placeholder one.
    fn credential(&self) -> PortResult<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() && key != PLACEHOLDER_API_KEY => Ok(key),
            _ => Err(PortError::Configuration(
                "OpenRouter API key not configured. Please add OPENROUTER_API_KEY to your .env file."
                    .to_string(),
            )),
        }
    }
}

fn map_transport_error(error: reqwest::Error) -> PortError {
    if error.is_timeout() {
        PortError::Transport(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        PortError::Transport(format!("Connection error: {}", error))
    } else {
        PortError::Transport(format!("HTTP error: {}", error))
    }
}

//=========================================================================================
// `CompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompletionService for OpenRouterAdapter {
    async fn complete(&self, prompt: &str) -> PortResult<String> {
        let api_key = self.credential()?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(%url, model = %self.model, "Calling completion provider");
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.app_title)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = status.as_u16(), "Completion provider error: {}", body);
            return Err(PortError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to parse response: {}", e)))?;

        // An empty reply is passed on; the decoder decides whether it is usable.
        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}
