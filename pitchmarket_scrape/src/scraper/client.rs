//! Rate-limited, retried HTTP retrieval.
//!
//! One client instance owns its header rotation and politeness delay;
//! nothing here is process-global. Retryable failures (non-2xx, timeout,
//! connection trouble) are logged per attempt and surface as a typed
//! error only once the retry budget is spent.

use http::{header, HeaderMap, HeaderValue};
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use scraper::Html;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Number of times to try a url before giving up
const DEFAULT_MAX_RETRIES: u32 = 10;

const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
const DEFAULT_POLITENESS_MS: u64 = 2_000;
const DEFAULT_TIMEOUT_SECS: u64 = 15;

// Rotated across attempts so consecutive requests don't share a
// fingerprint
const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:126.0) Gecko/20100101 Firefox/126.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

/// Errors the retrieval layer can hand back to extractors
#[derive(Debug, Error)]
pub enum FetchError {
    /// Malformed input, never dispatched or retried
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Retries exhausted, last failure was a transport timeout
    #[error("timed out after retries: {0}")]
    Timeout(String),
    /// Retries exhausted, last failure was connection-level
    #[error("connection failed after retries: {0}")]
    ConnectionFailed(String),
    /// Retries exhausted, last failure was a non-2xx response
    #[error("{url} answered {status} until retries ran out")]
    ResponseStatus { url: String, status: StatusCode },
    /// Anything else reqwest reports (body decode, redirect policy, ...)
    #[error(transparent)]
    Web(#[from] reqwest::Error),
}

/// Knobs for one client instance
#[derive(Clone)]
pub struct HttpOptions {
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Pause after every successful retrieval, out of respect for the
    /// source server
    pub politeness_delay: Duration,
    pub timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        HttpOptions {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            politeness_delay: Duration::from_millis(DEFAULT_POLITENESS_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

enum LastFailure {
    Timeout,
    Connection,
    Status(StatusCode),
}

pub struct HttpClient {
    client: Client,
    options: HttpOptions,
    next_agent: AtomicUsize,
}

impl HttpClient {
    pub fn new(options: HttpOptions) -> Self {
        // building only fails when the TLS backend cannot initialize, and
        // a client without its configured timeout is worse than no client
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .expect("http client construction shouldn't fail");

        HttpClient {
            client,
            options,
            next_agent: AtomicUsize::new(0),
        }
    }

    /// GET a url with the bounded retry loop. Fails fast on a malformed
    /// url; otherwise every attempt gets fresh headers and non-2xx,
    /// timeout and connection failures are all retried.
    pub fn fetch(&self, url: &str) -> Result<Response, FetchError> {
        let parsed =
            Url::parse(url).map_err(|_| FetchError::InvalidUrl(String::from(url)))?;

        let mut last_failure = LastFailure::Connection;

        for attempt in 1..=self.options.max_retries.max(1) {
            let request = self
                .client
                .get(parsed.clone())
                .headers(self.request_headers());

            match request.send() {
                Ok(response) if response.status().is_success() => {
                    thread::sleep(self.options.politeness_delay);
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status();
                    log::warn!(
                        "{} answered {} (attempt {}/{})",
                        url,
                        status,
                        attempt,
                        self.options.max_retries
                    );
                    last_failure = LastFailure::Status(status);
                }
                Err(err) if err.is_timeout() => {
                    log::warn!("{} timed out (attempt {}/{})", url, attempt, self.options.max_retries);
                    last_failure = LastFailure::Timeout;
                }
                Err(err) => {
                    log::warn!(
                        "{} failed: {} (attempt {}/{})",
                        url,
                        err,
                        attempt,
                        self.options.max_retries
                    );
                    last_failure = LastFailure::Connection;
                }
            }

            if attempt < self.options.max_retries {
                thread::sleep(self.options.retry_delay);
            }
        }

        Err(match last_failure {
            LastFailure::Timeout => FetchError::Timeout(String::from(url)),
            LastFailure::Connection => FetchError::ConnectionFailed(String::from(url)),
            LastFailure::Status(status) => FetchError::ResponseStatus {
                url: String::from(url),
                status,
            },
        })
    }

    /// Fetch and parse into a navigable document. `Ok(None)` means the
    /// url never qualified for a request (failed validation); an `Err`
    /// means the request was tried and exhausted its retries.
    pub fn fetch_as_document(&self, url: &str) -> Result<Option<Html>, FetchError> {
        if Url::parse(url).is_err() {
            log::warn!("skipping malformed url: {}", url);
            return Ok(None);
        }

        let body = self.fetch(url)?.text()?;
        Ok(Some(Html::parse_document(&body)))
    }

    /// Fetch and decode a typed payload, for API-style endpoints
    pub fn fetch_as_structured<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        Ok(self.fetch(url)?.json()?)
    }

    fn request_headers(&self) -> HeaderMap {
        let index = self.next_agent.fetch_add(1, Ordering::Relaxed) % USER_AGENTS.len();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(USER_AGENTS[index]),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers
    }
}
