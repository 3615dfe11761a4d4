//! HTTP GET with bounded exponential backoff.
//!
//! `fetch_with_retry` retries on a configurable set of status codes and on
//! network failures, and fails fast on every other error status. There is no
//! jitter, no circuit breaker and no per-attempt timeout: the attempt cap is
//! the only bound.

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Callback invoked before each retry with the retry number (1-based) and
/// the error that caused it.
pub type RetryCallback = Arc<dyn Fn(u32, &FetchError) + Send + Sync>;

/// Configuration for retry behavior
#[derive(Clone)]
pub struct RetryOptions {
    /// Number of retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry
    pub backoff_factor: f64,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// When false every retry waits `initial_delay`
    pub exponential_backoff: bool,
    /// HTTP statuses that are worth retrying
    pub retry_status_codes: Vec<u16>,
    on_retry: Option<RetryCallback>,
}

impl RetryOptions {
    /// Create retry options with the default backoff (x1.5, capped at 5s)
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            backoff_factor: 1.5,
            max_delay: Duration::from_millis(5000),
            exponential_backoff: true,
            retry_status_codes: vec![429, 503, 504],
            on_retry: None,
        }
    }

    /// Set the maximum delay between retries
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set the backoff factor
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Disable exponential growth; every retry waits `initial_delay`
    pub fn with_fixed_delay(mut self) -> Self {
        self.exponential_backoff = false;
        self
    }

    /// Replace the set of retryable status codes
    pub fn with_retry_status_codes(mut self, codes: impl Into<Vec<u16>>) -> Self {
        self.retry_status_codes = codes.into();
        self
    }

    /// Register a callback that runs before every retry
    pub fn on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(u32, &FetchError) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    /// Preset: translation file loads (3 retries: 500ms, 750ms, 1.125s)
    pub fn translation_file() -> Self {
        Self::new(3, Duration::from_millis(500))
    }

    /// Preset: outbound email (2 retries: 1s, 2s)
    pub fn email() -> Self {
        Self::new(2, Duration::from_secs(1)).with_backoff_factor(2.0)
    }

    /// Total number of attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait before the given retry (1-based)
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        if !self.exponential_backoff {
            return self.initial_delay.min(self.max_delay);
        }

        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_factor.powi((retry - 1) as i32);

        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::translation_file()
    }
}

impl fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_retries", &self.max_retries)
            .field("initial_delay", &self.initial_delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("max_delay", &self.max_delay)
            .field("exponential_backoff", &self.exponential_backoff)
            .field("retry_status_codes", &self.retry_status_codes)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

/// Errors surfaced by `fetch_with_retry`
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn is_retryable(&self, retry_status_codes: &[u16]) -> bool {
        match self {
            FetchError::Network { .. } => true,
            FetchError::Status { status, .. } => retry_status_codes.contains(status),
            FetchError::Decode { .. } => false,
        }
    }
}

/// Successful response body, parsed according to its content type
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedBody {
    Json(serde_json::Value),
    Text(String),
    Bytes(Vec<u8>),
}

/// Execute an async operation with retries, using a predicate to decide
/// whether a failure is worth another attempt.
pub async fn with_retry_if<T, E, F, Fut, P>(
    options: &RetryOptions,
    operation_name: &str,
    operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
    P: Fn(&E) -> bool,
{
    retry_loop(options, operation_name, operation, should_retry, |_, _| {}).await
}

async fn retry_loop<T, E, F, Fut, P, N>(
    options: &RetryOptions,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
    mut notify: N,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
    P: Fn(&E) -> bool,
    N: FnMut(u32, &E),
{
    let max_attempts = options.max_attempts();
    let mut retry = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if retry > 0 {
                    debug!(
                        "{}: Succeeded on attempt {}/{}",
                        operation_name,
                        retry + 1,
                        max_attempts
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if !should_retry(&e) {
                    debug!(
                        "{}: Error is not retryable, failing immediately: {}",
                        operation_name, e
                    );
                    return Err(e);
                }

                if retry >= options.max_retries {
                    warn!(
                        "{}: All {} attempts failed. Last error: {}",
                        operation_name, max_attempts, e
                    );
                    return Err(e);
                }

                retry += 1;
                let delay = options.delay_for_retry(retry);
                warn!(
                    "{}: Attempt {}/{} failed ({}), retrying in {:?}",
                    operation_name, retry, max_attempts, e, delay
                );
                sleep(delay).await;
                notify(retry, &e);
            }
        }
    }
}

/// GET `url`, retrying retryable statuses and network errors.
///
/// Success bodies are parsed by `Content-Type`: JSON, `text/*`, or raw
/// bytes for everything else.
pub async fn fetch_with_retry(
    client: &reqwest::Client,
    url: &str,
    options: &RetryOptions,
) -> Result<FetchedBody, FetchError> {
    let callback = options.on_retry.clone();

    retry_loop(
        options,
        url,
        || fetch_once(client, url),
        |e: &FetchError| e.is_retryable(&options.retry_status_codes),
        |retry, e| {
            if let Some(cb) = &callback {
                cb(retry, e);
            }
        },
    )
    .await
}

/// `fetch_with_retry` followed by deserialization into `T`.
pub async fn fetch_json_with_retry<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    options: &RetryOptions,
) -> Result<T, FetchError> {
    let decoded = match fetch_with_retry(client, url, options).await? {
        FetchedBody::Json(value) => serde_json::from_value(value),
        // Static hosts sometimes label JSON files as text/plain
        FetchedBody::Text(text) => serde_json::from_str(&text),
        FetchedBody::Bytes(bytes) => serde_json::from_slice(&bytes),
    };

    decoded.map_err(|e| FetchError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

async fn fetch_once(client: &reqwest::Client, url: &str) -> Result<FetchedBody, FetchError> {
    let network = |source| FetchError::Network {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(network)?;
    let status = response.status();

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.contains("application/json") || content_type.contains("+json") {
        let bytes = response.bytes().await.map_err(network)?;
        let value = serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(FetchedBody::Json(value))
    } else if content_type.starts_with("text/") {
        Ok(FetchedBody::Text(response.text().await.map_err(network)?))
    } else {
        Ok(FetchedBody::Bytes(
            response.bytes().await.map_err(network)?.to_vec(),
        ))
    }
}
