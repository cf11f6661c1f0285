//! Long-running operation poller.
//!
//! A begin call that the service accepts with `202 Accepted` hands back a
//! `Location` to poll. Polling that URL yields `202` while the operation runs,
//! `200`/`204` on success and a 4xx/5xx error body on failure.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::client::Pipeline;
use crate::error::{Error, ResponseError};
use crate::transport::{Request, Response};

/// Poll interval used when neither the caller nor the service specify one.
pub const DEFAULT_POLL_FREQUENCY: Duration = Duration::from_secs(30);

/// Options for [`Poller::poll_until_done`].
#[derive(Debug, Clone, Default)]
pub struct PollUntilDoneOptions {
    /// Fixed delay between polls; overrides the service `Retry-After`.
    pub frequency: Option<Duration>,
}

/// Observable progress of a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    InProgress,
    Succeeded,
    Failed,
}

enum PollerState<T> {
    InProgress {
        location: Url,
        retry_after: Option<Duration>,
    },
    Succeeded(T),
    Failed(ResponseError),
}

/// Handle to a long-running operation.
pub struct Poller<T> {
    pipeline: Arc<Pipeline>,
    state: PollerState<T>,
    polls: u32,
}

impl<T> Poller<T>
where
    T: DeserializeOwned + Default + Clone,
{
    /// Build a poller from the response to the begin request.
    pub(crate) fn from_initial_response(
        pipeline: Arc<Pipeline>,
        response: &Response,
    ) -> Result<Self, Error> {
        let state = match response.status {
            StatusCode::ACCEPTED => PollerState::InProgress {
                location: location_of(response)?,
                retry_after: response.retry_after(),
            },
            _ => PollerState::Succeeded(parse_result(response)?),
        };

        Ok(Self {
            pipeline,
            state,
            polls: 0,
        })
    }

    /// Whether the operation has reached a terminal state.
    #[must_use]
    pub fn done(&self) -> bool {
        !matches!(self.state, PollerState::InProgress { .. })
    }

    #[must_use]
    pub fn status(&self) -> PollStatus {
        match self.state {
            PollerState::InProgress { .. } => PollStatus::InProgress,
            PollerState::Succeeded(_) => PollStatus::Succeeded,
            PollerState::Failed(_) => PollStatus::Failed,
        }
    }

    /// Number of status requests sent so far.
    #[must_use]
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// The terminal outcome, or `None` while the operation is running.
    #[must_use]
    pub fn result(&self) -> Option<Result<T, Error>> {
        match &self.state {
            PollerState::InProgress { .. } => None,
            PollerState::Succeeded(value) => Some(Ok(value.clone())),
            PollerState::Failed(err) => Some(Err(Error::Response(err.clone()))),
        }
    }

    /// Send one status request, unless the operation is already terminal.
    ///
    /// A service failure moves the poller to `Failed` and is not an `Err`
    /// here; transport failures are returned and leave the state untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the status request could not be completed.
    pub async fn poll(&mut self) -> Result<PollStatus, Error> {
        let location = match &self.state {
            PollerState::InProgress { location, .. } => location.clone(),
            _ => return Ok(self.status()),
        };

        self.polls += 1;
        let request = Request::new(Method::GET, location.clone());

        self.state = match self.pipeline.send(request).await {
            Ok(response) if response.status == StatusCode::ACCEPTED => PollerState::InProgress {
                location: location_of(&response).unwrap_or(location),
                retry_after: response.retry_after(),
            },
            Ok(response) => PollerState::Succeeded(parse_result(&response)?),
            Err(Error::Response(err)) => PollerState::Failed(err),
            Err(err) => return Err(err),
        };

        debug!(polls = self.polls, status = ?self.status(), "polled operation");
        Ok(self.status())
    }

    /// Poll until the operation is terminal and return its outcome.
    ///
    /// # Errors
    ///
    /// Returns `Error::Response` when the operation failed, or any transport
    /// error raised while polling.
    pub async fn poll_until_done(
        &mut self,
        options: Option<&PollUntilDoneOptions>,
    ) -> Result<T, Error> {
        let frequency = options.and_then(|o| o.frequency);

        while !self.done() {
            if self.poll().await? != PollStatus::InProgress {
                break;
            }

            let delay = match (&self.state, frequency) {
                (_, Some(frequency)) => frequency,
                (PollerState::InProgress { retry_after, .. }, None) => {
                    retry_after.unwrap_or(DEFAULT_POLL_FREQUENCY)
                }
                _ => Duration::ZERO,
            };
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        info!(polls = self.polls, status = ?self.status(), "operation finished");

        match &self.state {
            PollerState::Succeeded(value) => Ok(value.clone()),
            PollerState::Failed(err) => Err(Error::Response(err.clone())),
            PollerState::InProgress { .. } => Err(Error::Http(
                "Operation still in progress after polling stopped".to_string(),
            )),
        }
    }
}

fn location_of(response: &Response) -> Result<Url, Error> {
    let location = response
        .header(LOCATION.as_str())
        .ok_or_else(|| Error::Http("Missing Location header on accepted operation".to_string()))?;

    Url::parse(location).map_err(Error::from)
}

fn parse_result<T: DeserializeOwned + Default>(response: &Response) -> Result<T, Error> {
    if response.status == StatusCode::NO_CONTENT || response.body.is_empty() {
        return Ok(T::default());
    }

    response.json()
}
