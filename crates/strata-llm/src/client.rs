//! HTTP generator speaking the chat-completions protocol

use crate::prompt::{user_prompt, SYSTEM_PROMPT};
use crate::wire::{ChatMessage, ChatRequest, ChatResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use strata_core::{GenerationConfig, GenerationError, GenerationRequest, Generator};

/// Longest error body kept in [`GenerationError::Status`]
const ERROR_BODY_LIMIT: usize = 200;

/// Generator backed by an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    client: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
    api_key: Option<String>,
}

impl OpenAiGenerator {
    /// Build from configuration, reading the API key from the configured
    /// environment variable
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(
                var = %config.api_key_env,
                "no API key set, sending unauthenticated requests"
            );
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(GenerationError::transport)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout(),
            api_key,
        })
    }

    /// Override the API key
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Endpoint requests are sent to
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Model name sent with each request
    #[inline]
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn body(&self, request: &GenerationRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::new("system", SYSTEM_PROMPT),
                ChatMessage::new("user", user_prompt(request)),
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    fn send_error(&self, err: &reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else if err.is_connect() {
            GenerationError::Transport(format!("could not connect to {}: {err}", self.endpoint))
        } else {
            GenerationError::transport(err)
        }
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        tracing::debug!(
            model = %self.model,
            round = request.round,
            update = request.is_update(),
            "sending generation request"
        );

        let mut call = self.client.post(&self.endpoint).json(&self.body(request));
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call.send().await.map_err(|e| self.send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            tracing::warn!(status = status.as_u16(), "generation service rejected request");
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.send_error(&e)
            } else {
                GenerationError::Malformed(e.to_string())
            }
        })?;

        let text = parsed
            .into_text()
            .ok_or_else(|| GenerationError::Malformed("response has no choices".to_owned()))?;
        tracing::debug!(chars = text.len(), "generation response received");
        Ok(text)
    }
}
