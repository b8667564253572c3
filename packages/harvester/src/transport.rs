//! Request/response primitive used by the extractors.
//!
//! The core only ever sees the [`Transport`] trait: one blocking GET that
//! returns the body or a [`TransportError`]. [`HttpTransport`] talks to the
//! real provider; [`MemoryTransport`] replays canned responses.

use std::cell::RefCell;
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use crate::config::HarvesterConfig;
use crate::error::{Result, TransportError};

/// User agent string identifying this harvester.
const USER_AGENT: &str = concat!("seaaroundus-harvester/", env!("CARGO_PKG_VERSION"));

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Upper bound on attempts per request, whatever the configuration asks for.
const MAX_ATTEMPTS: u32 = 10;

/// One blocking request per call.
pub trait Transport {
    /// Fetch the raw body at `url`.
    fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError>;
}

/// Fetch `url` and deserialize the body into `T`.
///
/// Bodies that are not JSON or do not match `T` fail with a
/// [`TransportErrorKind::Parse`](crate::error::TransportErrorKind::Parse) error.
pub fn fetch<T: DeserializeOwned>(transport: &dyn Transport, url: &str) -> Result<T> {
    let bytes = transport.get(url)?;
    let value = serde_json::from_slice(&bytes)
        .map_err(|e| TransportError::parse(url, e.to_string()))?;
    Ok(value)
}

/// HTTP transport backed by a blocking reqwest client.
///
/// Retries connection errors, timeouts and 5xx responses with exponential
/// backoff; 4xx responses fail immediately.
pub struct HttpTransport {
    client: Client,
    max_retries: u32,
}

impl HttpTransport {
    /// Create a transport configured with the run's timeout and retry budget.
    pub fn new(config: &HarvesterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            max_retries: config.max_retries.clamp(1, MAX_ATTEMPTS),
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
        let mut last_error: Option<String> = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 500ms, 1000ms, 2000ms
                let delay = RETRY_BASE_DELAY_MS * (1 << (attempt - 1));
                tracing::debug!(url, attempt, delay_ms = delay, "Retrying after delay");
                thread::sleep(Duration::from_millis(delay));
            }

            match self.client.get(url).send() {
                Ok(response) => {
                    let status = response.status();

                    if status.is_server_error() {
                        tracing::warn!(
                            url,
                            status = %status,
                            attempt = attempt + 1,
                            max_retries = self.max_retries,
                            "Server error, will retry"
                        );
                        last_error = Some(format!("HTTP status {status}"));
                        continue;
                    }

                    // Client errors won't succeed on retry
                    if !status.is_success() {
                        return Err(TransportError::network(
                            url,
                            format!("HTTP status {status}"),
                        ));
                    }

                    let bytes = response
                        .bytes()
                        .map_err(|e| TransportError::network(url, e.to_string()))?;
                    return Ok(bytes.to_vec());
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        tracing::warn!(
                            url,
                            error = %e,
                            attempt = attempt + 1,
                            max_retries = self.max_retries,
                            "Connection error, will retry"
                        );
                        last_error = Some(e.to_string());
                        continue;
                    }
                    return Err(TransportError::network(url, e.to_string()));
                }
            }
        }

        Err(TransportError::network(
            url,
            format!(
                "giving up after {} attempts: {}",
                self.max_retries,
                last_error.unwrap_or_else(|| "unknown error".to_string())
            ),
        ))
    }
}

/// Canned response for [`MemoryTransport`].
#[derive(Debug, Clone)]
enum Canned {
    Body(Vec<u8>),
    Failure(String),
}

/// In-memory transport serving canned bodies by exact URL.
///
/// Every request is logged, so callers can assert how many fetches a run
/// performed. Unknown URLs fail like a 404.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    responses: HashMap<String, Canned>,
    requests: RefCell<Vec<String>>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.responses.insert(url.into(), Canned::Body(body.into()));
    }

    /// Serve `value` serialized as JSON for `url`.
    pub fn insert_json(&mut self, url: impl Into<String>, value: &serde_json::Value) {
        self.insert(url, value.to_string());
    }

    /// Fail requests for `url` with a network error.
    pub fn insert_failure(&mut self, url: impl Into<String>, message: impl Into<String>) {
        self.responses
            .insert(url.into(), Canned::Failure(message.into()));
    }

    /// Builder form of [`insert_json`](Self::insert_json).
    #[must_use]
    pub fn with_json(mut self, url: impl Into<String>, value: serde_json::Value) -> Self {
        self.insert_json(url, &value);
        self
    }

    /// All requested URLs, in request order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// Number of requests whose URL starts with `prefix`.
    #[must_use]
    pub fn count_with_prefix(&self, prefix: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|url| url.starts_with(prefix))
            .count()
    }

    /// Forget the request log.
    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }
}

impl Transport for MemoryTransport {
    fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
        self.requests.borrow_mut().push(url.to_string());

        match self.responses.get(url) {
            Some(Canned::Body(body)) => Ok(body.clone()),
            Some(Canned::Failure(message)) => Err(TransportError::network(url, message.clone())),
            None => Err(TransportError::network(url, "HTTP status 404 Not Found")),
        }
    }
}
