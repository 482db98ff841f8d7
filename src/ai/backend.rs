//! Chat backend providers.
//!
//! Every provider implements [`ChatBackend`]; the responder iterates them in
//! priority order. Adding a provider means appending to the registry, not
//! branching.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Response parsing error: {0}")]
    ParseError(String),
    #[error("Empty response content")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Generation parameters shared by every backend call.
#[derive(Debug, Clone)]
pub struct ChatParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            max_tokens: 60,
            temperature: 0.9,
        }
    }
}

/// A response-generating provider in the fallback chain.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Per-call budget enforced by the responder.
    fn timeout(&self) -> Duration;

    /// One attempt. Any error means "try the next backend"; the responder
    /// never retries the same backend within a request.
    async fn invoke(&self, messages: &[Message], params: &ChatParams)
        -> Result<String, BackendError>;
}

fn messages_json(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|msg| {
            json!({
                "role": msg.role,
                "content": msg.content
            })
        })
        .collect()
}

/// OpenAI-compatible chat completions backend. Covers both Cerebras and
/// OpenAI proper — same wire shape, different base URL and model.
pub struct OpenAiCompatBackend {
    name: String,
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiCompatBackend {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            name: name.into(),
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout,
        }
    }

    fn parse_response(response_text: &str) -> Result<String, BackendError> {
        let json: Value = serde_json::from_str(response_text)
            .map_err(|e| BackendError::ParseError(format!("Invalid JSON: {}", e)))?;

        let choices = json["choices"]
            .as_array()
            .ok_or_else(|| BackendError::ParseError("Missing 'choices' field".to_string()))?;

        let content = choices
            .first()
            .and_then(|choice| choice["message"]["content"].as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        if content.is_empty() {
            return Err(BackendError::Empty);
        }
        Ok(content)
    }
}

#[async_trait]
impl ChatBackend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn invoke(
        &self,
        messages: &[Message],
        params: &ChatParams,
    ) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);

        let payload = json!({
            "model": self.model,
            "messages": messages_json(messages),
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
            "stream": false
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BackendError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let response_text = response.text().await?;
        Self::parse_response(&response_text)
    }
}

/// Local offline backend via Ollama. Last in the chain — slowest, but works
/// with no internet.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            timeout,
        }
    }

    /// Check that Ollama is running and the configured model is pulled.
    /// Computed once at initialization.
    pub async fn probe(&self, probe_timeout: Duration) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        let response = match self.client.get(&url).timeout(probe_timeout).send().await {
            Ok(r) => r,
            Err(_) => return false,
        };
        if !response.status().is_success() {
            log::warn!("Ollama not responding at {}", self.base_url);
            return false;
        }
        let json: Value = match response.json().await {
            Ok(v) => v,
            Err(_) => return false,
        };
        let listed = json["models"]
            .as_array()
            .map(|models| {
                models.iter().any(|m| {
                    m["name"]
                        .as_str()
                        .map(|name| name.contains(&self.model))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);
        if !listed {
            log::warn!(
                "Ollama running but model '{}' not found. Run: ollama pull {}",
                self.model,
                self.model
            );
        }
        listed
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn invoke(
        &self,
        messages: &[Message],
        params: &ChatParams,
    ) -> Result<String, BackendError> {
        let url = format!("{}/api/chat", self.base_url);

        let payload = json!({
            "model": self.model,
            "messages": messages_json(messages),
            "stream": false,
            "options": { "num_predict": params.max_tokens }
        });

        let response = self.client.post(&url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BackendError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| BackendError::ParseError(format!("Invalid JSON: {}", e)))?;

        let content = json["message"]["content"].as_str().unwrap_or("").trim().to_string();
        if content.is_empty() {
            return Err(BackendError::Empty);
        }
        Ok(content)
    }
}
