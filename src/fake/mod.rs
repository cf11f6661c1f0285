//! Fake server for testing code that uses [`crate::VirtualMachinesClient`].
//!
//! Register closures on a [`VirtualMachinesServer`], wrap it in a
//! [`ServerTransport`] and pass that as the client's transport. Each handler
//! returns a responder describing what the service should answer:
//! [`Responder`] for plain calls, [`PollerResponder`] for long-running
//! operations and [`PagerResponder`] for listings.

mod credential;
mod pager_responder;
mod poller_responder;
mod responder;
mod server;
mod transport;

pub use credential::FakeTokenCredential;
pub use pager_responder::{FakePage, PagerResponder};
pub use poller_responder::{PollStep, PollerResponder, PollerState, TerminalOutcome};
pub use responder::{ErrorResponder, Responder};
pub use server::{
    BeginDeleteArgs, BeginDeleteHandler, GetArgs, GetHandler, Handler, ListArgs,
    NewListPagerHandler, Operation, ResponderRegistry, VirtualMachinesServer,
};
pub use transport::{RecordedCall, ServerTransport, PAGE_TOKEN_PARAM, POLL_TOKEN_PARAM};
