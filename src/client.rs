//! Compute SDK main client, options and request pipeline.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::clients::VirtualMachinesClient;
use crate::credential::TokenCredential;
use crate::error::{Error, ResponseError};
use crate::transport::{HttpTransport, Request, Response, RetryConfig, Transport};

/// Default resource-manager endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Default api-version sent with every request.
pub const DEFAULT_API_VERSION: &str = "2023-03-01";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Scope requested from the credential.
pub const DEFAULT_SCOPE: &str = "https://management.azure.com/.default";

/// Header carrying the service request id.
pub const REQUEST_ID_HEADER: &str = "x-ms-request-id";

/// Header tying together the requests of one logical operation, such as
/// every page request of a pager.
pub const CORRELATION_ID_HEADER: &str = "x-ms-correlation-request-id";

/// Options shared by every client.
#[derive(Clone)]
pub struct ClientOptions {
    /// Base URL for requests
    pub endpoint: String,
    /// api-version query parameter
    pub api_version: String,
    /// Request timeout for the default HTTP transport
    pub timeout: Duration,
    /// Retry behavior for the default HTTP transport
    pub retry: RetryConfig,
    /// Replaces the default HTTP transport when set
    pub transport: Option<Arc<dyn Transport>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryConfig::default(),
            transport: None,
        }
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .finish()
    }
}

impl ClientOptions {
    /// Load options from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `COMPUTE_ENDPOINT` - Base URL (optional, default: <https://management.azure.com>)
    /// * `COMPUTE_API_VERSION` - api-version (optional, default: 2023-03-01)
    /// * `COMPUTE_TIMEOUT_SECS` - Request timeout in seconds (optional, default: 30)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, Error> {
        let endpoint = env::var("COMPUTE_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let api_version =
            env::var("COMPUTE_API_VERSION").unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());

        let timeout_secs = env::var("COMPUTE_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                Error::Configuration("Invalid COMPUTE_TIMEOUT_SECS: must be whole seconds".to_string())
            })?;

        Ok(Self {
            endpoint,
            api_version,
            timeout: Duration::from_secs(timeout_secs),
            ..Self::default()
        })
    }

    /// Route every call through `transport` instead of the network.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }
}

/// Shared request pipeline: endpoint, api-version, authorization and transport.
pub(crate) struct Pipeline {
    endpoint: Url,
    api_version: String,
    credential: Arc<dyn TokenCredential>,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    pub(crate) fn new(
        credential: Arc<dyn TokenCredential>,
        options: ClientOptions,
    ) -> Result<Self, Error> {
        let endpoint = Url::parse(&options.endpoint)?;

        let transport = match options.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(options.timeout, Some(options.retry))?),
        };

        Ok(Self {
            endpoint,
            api_version: options.api_version,
            credential,
            transport,
        })
    }

    /// Build a URL for `path` carrying the api-version and extra query pairs.
    pub(crate) fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, Error> {
        let mut url = self.endpoint.join(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api-version", &self.api_version);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Authorize and send a request; non-2xx responses become `Error::Response`.
    pub(crate) async fn send(&self, mut request: Request) -> Result<Response, Error> {
        let token = self.credential.get_token(&[DEFAULT_SCOPE]).await?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token.token))
            .map_err(|e| Error::Credential(format!("Token is not a valid header value: {e}")))?;
        request.headers.insert(AUTHORIZATION, bearer);

        debug!(method = %request.method, path = request.url.path(), "dispatching request");
        let response = self.transport.send(request).await?;

        if response.is_success() {
            Ok(response)
        } else {
            Err(Error::Response(parse_error_response(&response)))
        }
    }
}

/// Parse a non-success response into a structured error.
pub(crate) fn parse_error_response(response: &Response) -> ResponseError {
    let status = response.status.as_u16();
    let data: Value = serde_json::from_slice(&response.body).unwrap_or_else(|_| serde_json::json!({}));

    let empty_obj = serde_json::json!({});
    let error = data.get("error").unwrap_or(&empty_obj);
    let error_code = error
        .get("code")
        .and_then(|v| v.as_str())
        .map(String::from)
        .or_else(|| response.status.canonical_reason().map(|r| r.replace(' ', "")))
        .unwrap_or_else(|| "UnknownError".to_string());
    let message = error
        .get("message")
        .and_then(|v| v.as_str())
        .map_or_else(|| format!("HTTP {status}"), String::from);

    ResponseError {
        status_code: status,
        error_code,
        message,
        request_id: response.header(REQUEST_ID_HEADER).map(String::from),
    }
}

/// Aggregates the resource clients of a subscription.
///
/// # Example
///
/// ```rust,ignore
/// use cloudcompute::{ComputeClient, StaticTokenCredential};
///
/// let client = ComputeClient::new("subscription-id", Arc::new(StaticTokenCredential::new(token)), None)?;
/// let vm = client.virtual_machines().get("my-rg", "my-vm", None).await?;
/// ```
pub struct ComputeClient {
    subscription_id: String,
    virtual_machines: VirtualMachinesClient,
}

impl ComputeClient {
    /// Create a new compute client.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is invalid or the HTTP transport cannot be created.
    pub fn new(
        subscription_id: &str,
        credential: Arc<dyn TokenCredential>,
        options: Option<ClientOptions>,
    ) -> Result<Self, Error> {
        Ok(Self {
            subscription_id: subscription_id.to_string(),
            virtual_machines: VirtualMachinesClient::new(subscription_id, credential, options)?,
        })
    }

    /// Create a client from environment variables.
    ///
    /// Reads `COMPUTE_SUBSCRIPTION_ID` (required) plus everything
    /// [`ClientOptions::from_env`] reads.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env(credential: Arc<dyn TokenCredential>) -> Result<Self, Error> {
        let subscription_id = env::var("COMPUTE_SUBSCRIPTION_ID").map_err(|_| {
            Error::Configuration("COMPUTE_SUBSCRIPTION_ID environment variable not set".to_string())
        })?;

        Self::new(&subscription_id, credential, Some(ClientOptions::from_env()?))
    }

    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Get the virtual machines client.
    #[must_use]
    pub fn virtual_machines(&self) -> &VirtualMachinesClient {
        &self.virtual_machines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::StaticTokenCredential;
    use reqwest::StatusCode;

    fn credential() -> Arc<dyn TokenCredential> {
        Arc::new(StaticTokenCredential::new("token"))
    }

    #[test]
    fn test_client_creation() {
        let client = ComputeClient::new("sub-123", credential(), None)
            .expect("Client creation should succeed");

        assert_eq!(client.subscription_id(), "sub-123");
        assert_eq!(client.virtual_machines().subscription_id(), "sub-123");
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let options = ClientOptions {
            endpoint: "not a url".to_string(),
            ..ClientOptions::default()
        };

        let result = ComputeClient::new("sub", credential(), Some(options));
        assert!(matches!(result, Err(Error::Url(_))));
    }

    #[test]
    fn test_pipeline_url_carries_api_version() {
        let pipeline = Pipeline::new(credential(), ClientOptions::default()).expect("pipeline");
        let url = pipeline
            .url("/subscriptions/s/resourceGroups/rg", &[("$expand", "instanceView")])
            .expect("url");

        assert_eq!(url.host_str(), Some("management.azure.com"));
        assert_eq!(url.path(), "/subscriptions/s/resourceGroups/rg");
        assert_eq!(
            url.query(),
            Some("api-version=2023-03-01&%24expand=instanceView")
        );
    }

    #[test]
    fn test_parse_error_response_with_body() {
        let response = Response::new(StatusCode::BAD_REQUEST)
            .with_header(
                reqwest::header::HeaderName::from_static(REQUEST_ID_HEADER),
                "req-1",
            )
            .expect("valid header")
            .with_json(&serde_json::json!({
                "error": {"code": "InvalidParameter", "message": "vmSize is invalid"}
            }))
            .expect("serializable");

        let err = parse_error_response(&response);
        assert_eq!(err.status_code, 400);
        assert_eq!(err.error_code, "InvalidParameter");
        assert_eq!(err.message, "vmSize is invalid");
        assert_eq!(err.request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn test_parse_error_response_without_body() {
        let err = parse_error_response(&Response::new(StatusCode::NOT_FOUND));

        assert_eq!(err.status_code, 404);
        assert_eq!(err.error_code, "NotFound");
        assert_eq!(err.message, "HTTP 404");
    }
}
