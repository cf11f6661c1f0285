//! Fake virtual machines server: per-operation handler registry.
//!
//! Handlers are closures, so a test can capture its own locals:
//!
//! ```rust,ignore
//! let server = VirtualMachinesServer::new().on_get(move |args| {
//!     Responder::with_response(VirtualMachinesGetResponse { virtual_machine: vm.clone() })
//! });
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::fake::pager_responder::PagerResponder;
use crate::fake::poller_responder::PollerResponder;
use crate::fake::responder::{ErrorResponder, Responder};
use crate::types::{
    BeginDeleteOptions, GetOptions, ListOptions, VirtualMachinesDeleteResponse,
    VirtualMachinesGetResponse, VirtualMachinesListResponse,
};

/// Client operation a handler stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    BeginDelete,
    NewListPager,
}

impl Operation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "Get",
            Self::BeginDelete => "BeginDelete",
            Self::NewListPager => "NewListPager",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of a faked `get` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetArgs {
    pub resource_group_name: String,
    pub vm_name: String,
    pub options: GetOptions,
}

/// Arguments of a faked `begin_delete` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeginDeleteArgs {
    pub resource_group_name: String,
    pub vm_name: String,
    pub options: BeginDeleteOptions,
}

/// Arguments of a faked `new_list_pager` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    pub resource_group_name: String,
    pub options: ListOptions,
}

pub type GetHandler =
    Box<dyn Fn(&GetArgs) -> Responder<VirtualMachinesGetResponse> + Send + Sync>;

pub type BeginDeleteHandler = Box<
    dyn Fn(&BeginDeleteArgs) -> (PollerResponder<VirtualMachinesDeleteResponse>, ErrorResponder)
        + Send
        + Sync,
>;

pub type NewListPagerHandler =
    Box<dyn Fn(&ListArgs) -> PagerResponder<VirtualMachinesListResponse> + Send + Sync>;

/// A handler bound to the operation it fakes.
pub enum Handler {
    Get(GetHandler),
    BeginDelete(BeginDeleteHandler),
    NewListPager(NewListPagerHandler),
}

impl Handler {
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::Get(_) => Operation::Get,
            Self::BeginDelete(_) => Operation::BeginDelete,
            Self::NewListPager(_) => Operation::NewListPager,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({})", self.operation())
    }
}

/// Operation → handler table. Registering twice replaces the earlier handler.
#[derive(Debug, Default)]
pub struct ResponderRegistry {
    handlers: HashMap<Operation, Handler>,
}

impl ResponderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handler`, replacing any handler for the same operation.
    pub fn register(&mut self, handler: Handler) {
        self.handlers.insert(handler.operation(), handler);
    }

    #[must_use]
    pub fn lookup(&self, operation: Operation) -> Option<&Handler> {
        self.handlers.get(&operation)
    }

    #[must_use]
    pub fn contains(&self, operation: Operation) -> bool {
        self.handlers.contains_key(&operation)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Fake for `VirtualMachinesClient`. Operations without a handler fail with
/// `Error::FakeMisconfigured` when called.
#[derive(Debug, Default)]
pub struct VirtualMachinesServer {
    registry: ResponderRegistry,
}

impl VirtualMachinesServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fake `VirtualMachinesClient::get`.
    #[must_use]
    pub fn on_get<F>(mut self, handler: F) -> Self
    where
        F: Fn(&GetArgs) -> Responder<VirtualMachinesGetResponse> + Send + Sync + 'static,
    {
        self.register(Handler::Get(Box::new(handler)));
        self
    }

    /// Fake `VirtualMachinesClient::begin_delete`.
    #[must_use]
    pub fn on_begin_delete<F>(mut self, handler: F) -> Self
    where
        F: Fn(&BeginDeleteArgs) -> (PollerResponder<VirtualMachinesDeleteResponse>, ErrorResponder)
            + Send
            + Sync
            + 'static,
    {
        self.register(Handler::BeginDelete(Box::new(handler)));
        self
    }

    /// Fake `VirtualMachinesClient::new_list_pager`.
    #[must_use]
    pub fn on_new_list_pager<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ListArgs) -> PagerResponder<VirtualMachinesListResponse> + Send + Sync + 'static,
    {
        self.register(Handler::NewListPager(Box::new(handler)));
        self
    }

    pub fn register(&mut self, handler: Handler) {
        self.registry.register(handler);
    }

    #[must_use]
    pub fn registry(&self) -> &ResponderRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VirtualMachine;

    fn named(name: &str) -> Responder<VirtualMachinesGetResponse> {
        Responder::with_response(VirtualMachinesGetResponse {
            virtual_machine: VirtualMachine {
                name: Some(name.to_string()),
                ..VirtualMachine::default()
            },
        })
    }

    fn get_args() -> GetArgs {
        GetArgs {
            resource_group_name: "rg".to_string(),
            vm_name: "vm".to_string(),
            options: GetOptions::default(),
        }
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::Get.to_string(), "Get");
        assert_eq!(Operation::BeginDelete.as_str(), "BeginDelete");
        assert_eq!(Operation::NewListPager.as_str(), "NewListPager");
    }

    #[test]
    fn test_lookup_missing_operation() {
        let server = VirtualMachinesServer::new().on_get(|_| named("vm"));

        assert!(server.registry().contains(Operation::Get));
        assert!(server.registry().lookup(Operation::BeginDelete).is_none());
        assert_eq!(server.registry().len(), 1);
    }

    #[test]
    fn test_last_registration_wins() {
        let server = VirtualMachinesServer::new()
            .on_get(|_| named("first"))
            .on_get(|_| named("second"));

        assert_eq!(server.registry().len(), 1);
        let Some(Handler::Get(handler)) = server.registry().lookup(Operation::Get) else {
            panic!("get handler should be registered");
        };
        let response = handler(&get_args()).into_outcome().expect("payload");
        assert_eq!(response.virtual_machine.name.as_deref(), Some("second"));
    }

    #[test]
    fn test_handler_captures_test_locals() {
        let expected = "captured".to_string();
        let server = VirtualMachinesServer::new().on_get(move |args| {
            let mut responder = Responder::new();
            responder.set(VirtualMachinesGetResponse {
                virtual_machine: VirtualMachine {
                    name: Some(format!("{expected}-{}", args.vm_name)),
                    ..VirtualMachine::default()
                },
            });
            responder
        });

        let Some(Handler::Get(handler)) = server.registry().lookup(Operation::Get) else {
            panic!("get handler should be registered");
        };
        let response = handler(&get_args()).into_outcome().expect("payload");
        assert_eq!(response.virtual_machine.name.as_deref(), Some("captured-vm"));
    }
}
