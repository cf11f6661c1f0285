//! Single-response builders.

use crate::error::{Error, ResponseError};

enum ResponderState<T> {
    Empty,
    Response(T),
    Error(Error),
}

/// Canned outcome of one synchronous call.
///
/// Holds either a payload or an error; setting one replaces the other.
pub struct Responder<T> {
    state: ResponderState<T>,
}

impl<T> Default for Responder<T> {
    fn default() -> Self {
        Self {
            state: ResponderState::Empty,
        }
    }
}

impl<T> Responder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a responder that returns `response`.
    pub fn with_response(response: T) -> Self {
        let mut responder = Self::new();
        responder.set(response);
        responder
    }

    /// Return `response` from the call.
    pub fn set(&mut self, response: T) {
        self.state = ResponderState::Response(response);
    }

    /// Fail the call with a transport-level error.
    pub fn set_error(&mut self, err: impl Into<Error>) {
        self.state = ResponderState::Error(err.into());
    }

    /// Fail the call with a service error carrying `status` and `error_code`.
    pub fn set_response_error(&mut self, status: u16, error_code: &str) {
        self.set_error(fake_response_error(status, error_code));
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        !matches!(self.state, ResponderState::Empty)
    }

    /// Consume the responder into the call outcome.
    pub(crate) fn into_outcome(self) -> Result<T, Error> {
        match self.state {
            ResponderState::Response(response) => Ok(response),
            ResponderState::Error(err) => Err(err),
            ResponderState::Empty => Err(Error::FakeMisconfigured(
                "responder has neither a response nor an error".to_string(),
            )),
        }
    }
}

/// Optional failure of the initial request of an operation.
///
/// Left empty, the operation proceeds with its companion responder.
#[derive(Default)]
pub struct ErrorResponder {
    err: Option<Error>,
}

impl ErrorResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the request with a transport-level error.
    pub fn set_error(&mut self, err: impl Into<Error>) {
        self.err = Some(err.into());
    }

    /// Fail the request with a service error carrying `status` and `error_code`.
    pub fn set_response_error(&mut self, status: u16, error_code: &str) {
        self.set_error(fake_response_error(status, error_code));
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.err.is_some()
    }

    pub(crate) fn into_error(self) -> Option<Error> {
        self.err
    }
}

pub(crate) fn fake_response_error(status: u16, error_code: &str) -> ResponseError {
    ResponseError::new(status, error_code, &format!("fake {error_code} response"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_returns_payload() {
        let responder = Responder::with_response("vm1".to_string());

        assert!(responder.is_set());
        assert_eq!(responder.into_outcome().expect("payload"), "vm1");
    }

    #[test]
    fn test_last_setter_wins() {
        let mut responder = Responder::new();
        responder.set(1);
        responder.set_response_error(404, "NotFound");

        let err = responder.into_outcome().expect_err("error replaces payload");
        let response_err = err.as_response_error().expect("service error");
        assert_eq!(response_err.status_code, 404);
        assert_eq!(response_err.error_code, "NotFound");

        let mut responder = Responder::new();
        responder.set_error(Error::transport("oops"));
        responder.set(2);
        assert_eq!(responder.into_outcome().expect("payload replaces error"), 2);
    }

    #[test]
    fn test_empty_responder_is_misconfigured() {
        let responder: Responder<u32> = Responder::new();

        assert!(!responder.is_set());
        assert!(responder.into_outcome().expect_err("empty").is_fake_misconfigured());
    }

    #[test]
    fn test_error_responder() {
        let empty = ErrorResponder::new();
        assert!(!empty.is_set());
        assert!(empty.into_error().is_none());

        let mut responder = ErrorResponder::new();
        responder.set_response_error(409, "Conflict");
        let err = responder.into_error().expect("error set");
        assert_eq!(err.as_response_error().map(|e| e.status_code), Some(409));
    }
}
