//! Compute SDK for Rust
//!
//! Client for virtual machine operations on a resource-manager API, plus a
//! [`fake`] server for testing code that uses it without a network.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use cloudcompute::fake::{FakeTokenCredential, Responder, ServerTransport, VirtualMachinesServer};
//! use cloudcompute::{ClientOptions, VirtualMachinesClient, VirtualMachinesGetResponse};
//!
//! let server = VirtualMachinesServer::new()
//!     .on_get(|_| Responder::with_response(VirtualMachinesGetResponse::default()));
//! let options = ClientOptions::default().with_transport(Arc::new(ServerTransport::new(server)));
//! let client = VirtualMachinesClient::new("sub", Arc::new(FakeTokenCredential::new()), Some(options))?;
//! let vm = client.get("rg", "vm", None).await?;
//! ```

pub mod client;
pub mod clients;
pub mod credential;
pub mod error;
pub mod fake;
pub mod pager;
pub mod poller;
pub mod transport;
pub mod types;

// Re-exports
pub use client::{ClientOptions, ComputeClient};
pub use clients::VirtualMachinesClient;
pub use credential::{AccessToken, StaticTokenCredential, TokenCredential};
pub use error::{Error, ResponseError};
pub use pager::Pager;
pub use poller::{PollStatus, PollUntilDoneOptions, Poller};
pub use transport::{HttpTransport, Request, Response, RetryConfig, Transport};
pub use types::{
    BeginDeleteOptions, GetOptions, ListOptions, Page, VirtualMachine, VirtualMachineListResult,
    VirtualMachinesDeleteResponse, VirtualMachinesGetResponse, VirtualMachinesListResponse,
};
