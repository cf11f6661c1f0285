//! Credentials used to authorize client requests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::Error;

/// A bearer token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

/// Supplies bearer tokens for the requested scopes.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Get a token valid for `scopes`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Credential` if no token can be produced.
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, Error>;
}

/// A credential wrapping a token acquired elsewhere.
#[derive(Debug, Clone)]
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    /// Create a credential that always returns `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken, Error> {
        if self.token.is_empty() {
            return Err(Error::Credential("static token is empty".to_string()));
        }

        Ok(AccessToken {
            token: self.token.clone(),
            expires_on: Utc::now() + Duration::hours(1),
        })
    }
}
