//! Error types for the compute SDK and its fake server.

use thiserror::Error;

/// Main error type for the compute SDK.
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed endpoint or link URL
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Failure raised by a transport before any response was produced
    #[error("Transport error: {0}")]
    Transport(String),

    /// Credential could not supply a token
    #[error("Credential error: {0}")]
    Credential(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The fake server was asked to serve something it was not set up for.
    #[error("Fake misconfigured: {0}")]
    FakeMisconfigured(String),

    /// A pager was advanced after its last page.
    #[error("No more pages")]
    NoMorePages,

    /// Service-side failure carrying an error code and HTTP status.
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Failure that also ends a paged sequence. [`crate::Pager`] stops
    /// paging and returns the inner error.
    #[error(transparent)]
    FinalPage(Box<Error>),
}

impl Error {
    /// Build a transport-level error from any message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Borrow the structured service error, if this is one.
    #[must_use]
    pub fn as_response_error(&self) -> Option<&ResponseError> {
        match self {
            Self::Response(err) => Some(err),
            Self::FinalPage(err) => err.as_response_error(),
            _ => None,
        }
    }

    /// Whether this error came from a misconfigured fake.
    #[must_use]
    pub fn is_fake_misconfigured(&self) -> bool {
        matches!(self, Self::FakeMisconfigured(_))
    }
}

/// Structured error returned by the service for a non-success response.
///
/// The body shape is `{"error": {"code": "...", "message": "..."}}`; the status
/// comes from the HTTP response itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{error_code}] {message} (HTTP {status_code})")]
pub struct ResponseError {
    /// HTTP status code of the failed response
    pub status_code: u16,
    /// Service error code, e.g. "BadRequest"
    pub error_code: String,
    /// Human-readable message
    pub message: String,
    /// Request id echoed by the service, when present
    pub request_id: Option<String>,
}

impl ResponseError {
    /// Create a response error without a request id.
    pub fn new(status_code: u16, error_code: &str, message: &str) -> Self {
        Self {
            status_code,
            error_code: error_code.to_string(),
            message: message.to_string(),
            request_id: None,
        }
    }

    /// Check if the failed request is worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.status_code == 429 || self.status_code >= 500
    }
}
