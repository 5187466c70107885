//! Standard HTTP fetch layer with bounded retries.
//!
//! Transient failures (connect errors, timeouts, 429 and 5xx responses) are
//! retried with exponential backoff plus jitter. Anything else fails fast
//! and is surfaced to the orchestrator as a transport error, which treats it
//! as "standard parse failed" and moves on to the browser fallback.

use rand::{Rng, rng};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::utils::polite_headers;

/// Transport-level failure from the standard fetch path.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP status {status} fetching {url}")]
    Status { status: StatusCode, url: String },
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: usize, last: String },
}

/// Plain-HTTP page download, abstracted so tests can substitute canned HTML.
pub trait Fetcher {
    /// Download the raw HTML at `url`, following redirects.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Production fetcher: a shared `reqwest` client with polite headers and a
/// bounded retry policy.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retries: usize,
}

impl HttpFetcher {
    /// Build a fetcher with the given request timeout and retry count.
    pub fn new(timeout: Duration, retries: usize) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(polite_headers())
            .build()?;
        Ok(Self { client, retries })
    }

    fn retryable_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn backoff_delay(attempt: usize) -> Duration {
        let base = Duration::from_millis(300).saturating_mul(1 << attempt.min(6));
        let jitter_ms: u64 = rng().random_range(0..=250);
        base + Duration::from_millis(jitter_ms)
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0usize;
        loop {
            let result: Result<(), String> = match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response.text().await?;
                        info!(bytes = body.len(), "Downloaded article HTML");
                        return Ok(body);
                    } else if Self::retryable_status(status) {
                        Err(format!("HTTP status {status}"))
                    } else {
                        return Err(FetchError::Status {
                            status,
                            url: url.to_string(),
                        });
                    }
                }
                Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                    Err(e.to_string())
                }
                Err(e) => return Err(FetchError::Transport(e)),
            };

            if let Err(last) = result {
                attempt += 1;
                if attempt > self.retries {
                    warn!(attempts = attempt, error = %last, "Fetch retries exhausted");
                    return Err(FetchError::RetriesExhausted {
                        attempts: attempt,
                        last,
                    });
                }
                let delay = Self::backoff_delay(attempt - 1);
                debug!(attempt, ?delay, error = %last, "Transient fetch failure; backing off");
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(HttpFetcher::retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(HttpFetcher::retryable_status(StatusCode::BAD_GATEWAY));
        assert!(HttpFetcher::retryable_status(
            StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert!(!HttpFetcher::retryable_status(StatusCode::NOT_FOUND));
        assert!(!HttpFetcher::retryable_status(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_backoff_delay_grows_and_is_capped() {
        let first = HttpFetcher::backoff_delay(0);
        assert!(first >= Duration::from_millis(300));
        assert!(first <= Duration::from_millis(550));
        // the shift is capped so large attempt counts cannot overflow
        let late = HttpFetcher::backoff_delay(40);
        assert!(late <= Duration::from_millis(300 * 64 + 250));
    }
}
