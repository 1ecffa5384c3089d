//! HTTP client for the address-range endpoint

use crate::config::Config;
use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Truncate a response body and strip control characters for logging
fn sanitize_for_log(body: &str) -> String {
    let total = body.chars().count();
    let truncated = if total > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Whether a failed status is worth another attempt
fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Outcome of one attempt
enum Attempt {
    Done(Response),
    Retry(anyhow::Error),
    Fail(anyhow::Error),
}

/// HTTP client wrapper for the range endpoint
#[derive(Clone)]
pub struct RangesHttpClient {
    client: Client,
    url: String,
    max_retries: u32,
    backoff: Duration,
}

impl RangesHttpClient {
    /// Create a client bounded by the configured timeouts
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("function-cloudflare-nsg/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: config.ranges_url.clone(),
            max_retries: config.max_retries,
            backoff: config.retry_backoff(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the range listing.
    ///
    /// Transport errors, timeouts, 429 and 5xx are retried up to
    /// `max_retries` times with linear backoff. Any other non-2xx status
    /// fails immediately. The body is left unread for the caller.
    pub async fn get(&self) -> Result<Response> {
        let mut attempt: u32 = 0;

        loop {
            let error = match self.attempt().await {
                Attempt::Done(response) => return Ok(response),
                Attempt::Fail(e) => return Err(e),
                Attempt::Retry(e) => e,
            };

            if attempt >= self.max_retries {
                return Err(error);
            }
            attempt += 1;

            let delay = self.backoff * attempt;
            tracing::warn!(
                "GET {} failed (attempt {} of {}): {:#}; retrying in {:?}",
                self.url,
                attempt,
                self.max_retries + 1,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt(&self) -> Attempt {
        tracing::debug!("GET {}", self.url);

        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                let error = anyhow::Error::new(e).context("Failed to send request");
                return Attempt::Retry(error);
            }
        };

        let status = response.status();
        if status.is_success() {
            return Attempt::Done(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!("Range endpoint error: {} - {}", status, sanitize_for_log(&body));

        let error = anyhow::anyhow!("range endpoint returned {}", status);
        if is_retryable_status(status) {
            Attempt::Retry(error)
        } else {
            Attempt::Fail(error)
        }
    }
}
