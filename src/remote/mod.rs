//! Delegation of web tasks to a relay agent on the local network.
//!
//! Protocol: `GET /health` answers `{"status":"ok"}`, `POST /task` with
//! `{"task": "..."}` answers `{"response": "..."}`. One request per task,
//! never retried; the deadline covers the whole exchange.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct TaskResponse {
    response: String,
}

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Relay error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Response parsing error: {0}")]
    ParseError(String),
    #[error("No relay configured")]
    NotConfigured,
}

/// One in-flight delegated task with its wall-clock deadline.
pub struct PendingTask {
    pub task: String,
    sent_at: Instant,
    deadline: Duration,
}

impl PendingTask {
    pub fn new(task: impl Into<String>, deadline: Duration) -> Self {
        Self {
            task: task.into(),
            sent_at: Instant::now(),
            deadline,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_sub(self.sent_at.elapsed())
    }

    pub fn expired(&self) -> bool {
        self.remaining().is_zero()
    }
}

/// Seam for the remote agent; tests substitute a scripted one.
#[async_trait]
pub trait TaskAgent: Send + Sync {
    fn is_available(&self) -> bool;

    /// Delegate one task and wait for its answer.
    async fn send_task(&self, task: &str) -> Result<String, RemoteError>;
}

pub struct RelayClient {
    client: Client,
    base_url: Option<String>,
    task_deadline: Duration,
}

impl RelayClient {
    /// Probe the configured relay. An unreachable or unhealthy relay leaves
    /// the client in place but unavailable; startup never fails over it.
    pub async fn connect(
        relay_url: Option<&str>,
        health_timeout: Duration,
        task_deadline: Duration,
    ) -> Self {
        let client = Client::new();

        let base_url = match relay_url {
            Some(url) => {
                let url = url.trim_end_matches('/').to_string();
                if probe_health(&client, &url, health_timeout).await {
                    log::info!("Relay agent online at {}", url);
                    Some(url)
                } else {
                    log::warn!("Relay agent at {} is not responding", url);
                    None
                }
            }
            None => None,
        };

        Self {
            client,
            base_url,
            task_deadline,
        }
    }
}

async fn probe_health(client: &Client, base_url: &str, timeout: Duration) -> bool {
    let url = format!("{}/health", base_url);
    let response = match client.get(&url).timeout(timeout).send().await {
        Ok(r) => r,
        Err(_) => return false,
    };
    if !response.status().is_success() {
        return false;
    }
    match response.json::<HealthResponse>().await {
        Ok(health) => health.status == "ok",
        Err(_) => false,
    }
}

#[async_trait]
impl TaskAgent for RelayClient {
    fn is_available(&self) -> bool {
        self.base_url.is_some()
    }

    async fn send_task(&self, task: &str) -> Result<String, RemoteError> {
        let base_url = self.base_url.as_ref().ok_or(RemoteError::NotConfigured)?;
        let pending = PendingTask::new(task, self.task_deadline);

        let url = format!("{}/task", base_url);
        let response = self
            .client
            .post(&url)
            .timeout(pending.remaining())
            .json(&json!({ "task": pending.task }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RemoteError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let task_response: TaskResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::ParseError(format!("Invalid JSON: {}", e)))?;
        Ok(task_response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_task_has_full_deadline() {
        let pending = PendingTask::new("order pizza", Duration::from_secs(90));
        assert!(!pending.expired());
        assert!(pending.remaining() > Duration::from_secs(89));
    }

    #[test]
    fn elapsed_task_expires() {
        let mut pending = PendingTask::new("order pizza", Duration::from_millis(10));
        pending.sent_at = Instant::now() - Duration::from_millis(50);
        assert!(pending.expired());
        assert_eq!(pending.remaining(), Duration::ZERO);
    }

    #[tokio::test]
    async fn unconfigured_relay_is_unavailable() {
        let relay =
            RelayClient::connect(None, Duration::from_secs(1), Duration::from_secs(90)).await;
        assert!(!relay.is_available());
        assert!(matches!(
            relay.send_task("anything").await,
            Err(RemoteError::NotConfigured)
        ));
    }
}
