//! HTTP transport for the compute SDK.
//!
//! Every client call is expressed as a [`Request`] handed to a [`Transport`].
//! The default transport is [`HttpTransport`], which talks to the network with
//! automatic retry; tests swap in [`crate::fake::ServerTransport`].

use std::time::Duration;

use async_trait::async_trait;
use rand::thread_rng;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::Error;

/// An outgoing request in wire shape.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Create a request with no headers and no body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Attach a JSON body and the matching content type.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized.
    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, Error> {
        self.body = Some(serde_json::to_vec(body)?);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    /// First value of a query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// A response in wire shape.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    /// Create an empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Set a header.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid header value.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Result<Self, Error> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::Http(format!("Invalid header value for {name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Set a JSON body and the matching content type.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Error> {
        self.body = serde_json::to_vec(body)?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `Retry-After` in whole seconds, if present.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        self.headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(Error::from)
    }
}

/// Sends requests on behalf of a client.
///
/// Implementations return `Err` only for failures where no response exists;
/// service failures come back as non-2xx [`Response`]s.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, Error>;
}

/// Configuration for automatic retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base backoff factor for exponential backoff
    pub backoff_factor: f64,
    /// Status codes that trigger retry
    pub retry_on: Vec<u16>,
    /// Whether to respect Retry-After header
    pub respect_retry_after: bool,
    /// Maximum backoff time in seconds
    pub max_backoff: f64,
    /// Jitter factor (0.1 = ±10%)
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 2.0,
            retry_on: vec![429, 500, 502, 503],
            respect_retry_after: true,
            max_backoff: 60.0,
            jitter: 0.1,
        }
    }
}

/// Network transport backed by `reqwest`, with exponential backoff and jitter.
pub struct HttpTransport {
    client: Client,
    retry_config: RetryConfig,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(timeout: Duration, retry_config: Option<RetryConfig>) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            client,
            retry_config: retry_config.unwrap_or_default(),
        })
    }

    async fn execute_once(&self, request: &Request) -> Result<Response, Error> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Http(format!("Failed to read response body: {e}")))?
            .to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }

    /// Determine if a request should be retried.
    fn should_retry(&self, status_code: u16, attempt: u32) -> bool {
        if attempt >= self.retry_config.max_retries {
            return false;
        }

        self.retry_config.retry_on.contains(&status_code)
    }

    /// Calculate backoff time for retry.
    ///
    /// Uses exponential backoff with jitter, respecting Retry-After header
    /// if present.
    fn get_backoff_time(&self, attempt: u32, retry_after: Option<Duration>) -> f64 {
        if let Some(ra) = retry_after {
            if self.retry_config.respect_retry_after {
                return ra.as_secs_f64();
            }
        }

        let base_wait = self.retry_config.backoff_factor.powi(attempt as i32);

        let jitter_range = base_wait * self.retry_config.jitter;
        let wait_time = if jitter_range > 0.0 {
            let mut rng = thread_rng();
            let jitter = rng.gen_range(-jitter_range..jitter_range);
            base_wait + jitter
        } else {
            base_wait
        };

        // The result feeds Duration::from_secs_f64: finite and non-negative.
        let cap = self.retry_config.max_backoff.max(0.0);
        let wait_time = if wait_time.is_finite() { wait_time } else { cap };
        let wait_time = wait_time.clamp(0.0, cap);
        if wait_time.is_finite() {
            wait_time
        } else {
            0.0
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        let mut last_error: Option<Error> = None;

        for attempt in 0..=self.retry_config.max_retries {
            debug!(method = %request.method, url = %request.url, attempt, "sending request");

            match self.execute_once(&request).await {
                Ok(response) => {
                    let status = response.status.as_u16();
                    if !self.should_retry(status, attempt) {
                        return Ok(response);
                    }

                    let wait_time = self.get_backoff_time(attempt, response.retry_after());
                    warn!(status, attempt, wait_time, "retrying request");
                    last_error = Some(Error::Http(format!("HTTP {status}")));
                    tokio::time::sleep(Duration::from_secs_f64(wait_time)).await;
                }
                Err(e) => {
                    // Network errors are retryable
                    if attempt >= self.retry_config.max_retries {
                        return Err(e);
                    }

                    let wait_time = self.get_backoff_time(attempt, None);
                    warn!(error = %e, attempt, wait_time, "retrying request after transport error");
                    last_error = Some(e);
                    tokio::time::sleep(Duration::from_secs_f64(wait_time)).await;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::Http("Request failed after maximum retries".to_string())))
    }
}
