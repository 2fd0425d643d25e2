use anyhow::{Result, anyhow};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

enum Failure {
    Transient(anyhow::Error),
    Permanent(anyhow::Error),
}

pub fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error()
}

async fn fetch_once<T: DeserializeOwned>(client: &Client, url: &Url, timeout: Duration) -> Result<T, Failure> {
    let response = client
        .get(url.clone())
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| Failure::Transient(anyhow!("request to {} failed: {e}", url.host_str().unwrap_or("upstream"))))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let err = anyhow!("upstream answered {status}: {}", body.trim());
        return Err(if is_retryable(status) {
            Failure::Transient(err)
        } else {
            Failure::Permanent(err)
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| Failure::Permanent(anyhow!("invalid upstream payload: {e}")))
}

/// GET and decode JSON. Transport errors and 5xx are retried, sleeping `backoff * attempt`.
pub async fn get_json_with_retry<T: DeserializeOwned>(
    client: &Client,
    url: &Url,
    timeout: Duration,
    policy: RetryPolicy,
) -> Result<T> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match fetch_once(client, url, timeout).await {
            Ok(value) => return Ok(value),
            Err(Failure::Permanent(err)) => return Err(err),
            Err(Failure::Transient(err)) if attempt < attempts => {
                warn!(attempt, attempts, error = %err, "Retrying upstream request");
                tokio::time::sleep(policy.backoff * attempt).await;
                attempt += 1;
            }
            Err(Failure::Transient(err)) => {
                return Err(err.context(format!("giving up after {attempts} attempts")));
            }
        }
    }
}
