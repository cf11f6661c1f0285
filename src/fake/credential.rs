//! Credential placeholder for clients wired to a fake server.

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::credential::{AccessToken, TokenCredential};
use crate::error::Error;

/// Returns a fixed token, or a fixed error when built with [`FakeTokenCredential::failing`].
#[derive(Debug, Clone, Default)]
pub struct FakeTokenCredential {
    error: Option<String>,
}

impl FakeTokenCredential {
    pub fn new() -> Self {
        Self::default()
    }

    /// A credential whose every token request fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl TokenCredential for FakeTokenCredential {
    async fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken, Error> {
        if let Some(message) = &self.error {
            return Err(Error::Credential(message.clone()));
        }

        Ok(AccessToken {
            token: "fake_token".to_string(),
            expires_on: Utc::now() + Duration::hours(1),
        })
    }
}
