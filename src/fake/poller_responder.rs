//! Long-running operation sequence builder.
//!
//! States are `NotStarted`, `NonTerminal(i)` and `Terminal`, and only
//! [`PollerResponder::poll`] moves between them. `Terminal` is absorbing.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, ResponseError};
use crate::fake::responder::fake_response_error;

/// Final outcome of a faked operation.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalOutcome<T> {
    Success(T),
    Error(ResponseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    NotStarted,
    NonTerminal(usize),
    Terminal,
}

/// What one poll observed.
#[derive(Debug, PartialEq)]
pub enum PollStep<'a, T> {
    /// Still running; the payload is the optional partial status body.
    NonTerminal(Option<&'a T>),
    Terminal(&'a TerminalOutcome<T>),
}

/// Ordered non-terminal responses followed by one terminal outcome.
#[derive(Debug, Clone)]
pub struct PollerResponder<T> {
    non_terminal: Vec<Option<T>>,
    terminal: Option<TerminalOutcome<T>>,
    state: PollerState,
}

impl<T> Default for PollerResponder<T> {
    fn default() -> Self {
        Self {
            non_terminal: Vec::new(),
            terminal: None,
            state: PollerState::NotStarted,
        }
    }
}

impl<T> PollerResponder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a "still running" response. `None` sends no body.
    pub fn add_non_terminal_response(&mut self, payload: Option<T>) {
        self.non_terminal.push(payload);
    }

    /// Finish the operation successfully with `payload`.
    pub fn set_terminal_response(&mut self, payload: T) {
        self.terminal = Some(TerminalOutcome::Success(payload));
    }

    /// Finish the operation with a service error.
    pub fn set_terminal_error(&mut self, error_code: &str, status: u16) {
        self.terminal = Some(TerminalOutcome::Error(fake_response_error(status, error_code)));
    }

    #[must_use]
    pub fn non_terminal_count(&self) -> usize {
        self.non_terminal.len()
    }

    #[must_use]
    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Check the sequence has a terminal outcome.
    ///
    /// # Errors
    ///
    /// Returns `Error::FakeMisconfigured` if no terminal outcome was set.
    pub fn validate(&self) -> Result<(), Error> {
        if self.terminal.is_none() {
            return Err(Error::FakeMisconfigured(
                "poller responder has no terminal response or error".to_string(),
            ));
        }
        Ok(())
    }

    /// Advance one step and return what that step observes.
    ///
    /// # Errors
    ///
    /// Returns `Error::FakeMisconfigured` if no terminal outcome was set.
    pub fn poll(&mut self) -> Result<PollStep<'_, T>, Error> {
        self.validate()?;

        self.state = match self.state {
            PollerState::NotStarted if self.non_terminal.is_empty() => PollerState::Terminal,
            PollerState::NotStarted => PollerState::NonTerminal(0),
            PollerState::NonTerminal(i) if i + 1 < self.non_terminal.len() => {
                PollerState::NonTerminal(i + 1)
            }
            PollerState::NonTerminal(_) | PollerState::Terminal => PollerState::Terminal,
        };

        match (self.state, &self.terminal) {
            (PollerState::NonTerminal(i), _) => Ok(PollStep::NonTerminal(self.non_terminal[i].as_ref())),
            (_, Some(terminal)) => Ok(PollStep::Terminal(terminal)),
            (_, None) => Err(Error::FakeMisconfigured(
                "poller responder lost its terminal outcome".to_string(),
            )),
        }
    }
}

impl<T: Serialize> PollerResponder<T> {
    /// Serialize every payload, keeping the current state.
    pub(crate) fn into_json(self) -> Result<PollerResponder<Value>, Error> {
        let non_terminal = self
            .non_terminal
            .into_iter()
            .map(|payload| payload.map(serde_json::to_value).transpose())
            .collect::<Result<Vec<_>, _>>()?;

        let terminal = match self.terminal {
            Some(TerminalOutcome::Success(payload)) => {
                Some(TerminalOutcome::Success(serde_json::to_value(payload)?))
            }
            Some(TerminalOutcome::Error(err)) => Some(TerminalOutcome::Error(err)),
            None => None,
        };

        Ok(PollerResponder {
            non_terminal,
            terminal,
            state: self.state,
        })
    }
}
