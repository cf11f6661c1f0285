//! Property-based tests for the fake server.
//!
//! These tests validate replay properties across generated sequences.

use std::sync::Arc;

use proptest::prelude::*;

use cloudcompute::fake::{
    ErrorResponder, FakeTokenCredential, Operation, PagerResponder, PollerResponder, Responder,
    ServerTransport, VirtualMachinesServer,
};
use cloudcompute::{
    ClientOptions, Error, VirtualMachine, VirtualMachineListResult, VirtualMachinesClient,
    VirtualMachinesDeleteResponse, VirtualMachinesGetResponse, VirtualMachinesListResponse,
};

const RESOURCE_GROUP: &str = "fake-resource-group";

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime should build")
}

fn fake_client(server: VirtualMachinesServer) -> (VirtualMachinesClient, Arc<ServerTransport>) {
    let transport = Arc::new(ServerTransport::new(server));
    let client = VirtualMachinesClient::new(
        "subscriptionID",
        Arc::new(FakeTokenCredential::new()),
        Some(ClientOptions::default().with_transport(transport.clone())),
    )
    .expect("client creation should succeed");
    (client, transport)
}

/// `Some(n)` is a page of `n` machines, `None` is an error entry.
fn pager_entries() -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(prop_oneof![(0usize..6).prop_map(Some), Just(None)], 1..9)
}

proptest! {
    /// A set payload comes back unchanged.
    #[test]
    fn test_responder_returns_exact_payload(
        name in "[a-z][a-z0-9-]{0,20}",
        location in "[a-z]{2,10}",
    ) {
        let vm = VirtualMachine {
            name: Some(name.clone()),
            location: Some(location.clone()),
            ..VirtualMachine::default()
        };
        let expected = vm.clone();
        let server = VirtualMachinesServer::new().on_get(move |_| {
            Responder::with_response(VirtualMachinesGetResponse { virtual_machine: vm.clone() })
        });
        let (client, _) = fake_client(server);

        let response = runtime()
            .block_on(client.get(RESOURCE_GROUP, "vm", None))
            .expect("get should succeed");
        prop_assert_eq!(response.virtual_machine, expected);
    }

    /// N non-terminal entries then success takes exactly N + 1 polls.
    #[test]
    fn test_poller_success_takes_n_plus_one_polls(non_terminal in 0usize..6) {
        let server = VirtualMachinesServer::new().on_begin_delete(move |_| {
            let mut responder = PollerResponder::new();
            for _ in 0..non_terminal {
                responder.add_non_terminal_response(None);
            }
            responder.set_terminal_response(VirtualMachinesDeleteResponse::default());
            (responder, ErrorResponder::new())
        });
        let (client, transport) = fake_client(server);

        let rt = runtime();
        let mut poller = rt
            .block_on(client.begin_delete(RESOURCE_GROUP, "vm", None))
            .expect("begin should be accepted");
        let result = rt.block_on(poller.poll_until_done(None));

        prop_assert!(result.is_ok());
        prop_assert_eq!(poller.polls() as usize, non_terminal + 1);
        prop_assert_eq!(transport.calls_for(Operation::BeginDelete), non_terminal + 2);
    }

    /// A terminal error surfaces as a response error with its status and code.
    #[test]
    fn test_poller_terminal_error_carries_status(
        non_terminal in 0usize..4,
        status in 400u16..600,
        code in "[A-Z][A-Za-z]{2,15}",
    ) {
        let error_code = code.clone();
        let server = VirtualMachinesServer::new().on_begin_delete(move |_| {
            let mut responder = PollerResponder::new();
            for _ in 0..non_terminal {
                responder.add_non_terminal_response(None);
            }
            responder.set_terminal_error(&error_code, status);
            (responder, ErrorResponder::new())
        });
        let (client, _) = fake_client(server);

        let rt = runtime();
        let mut poller = rt
            .block_on(client.begin_delete(RESOURCE_GROUP, "vm", None))
            .expect("begin should be accepted");
        let err = rt
            .block_on(poller.poll_until_done(None))
            .expect_err("operation should fail");

        let response_err = err.as_response_error().expect("should be a response error");
        prop_assert_eq!(response_err.status_code, status);
        prop_assert_eq!(&response_err.error_code, &code);
    }

    /// Items delivered equal items registered; one `next_page` per entry.
    #[test]
    fn test_pager_walks_every_entry(entries in pager_entries()) {
        let expected_items: usize = entries.iter().flatten().sum();
        let expected_pages = entries.iter().filter(|e| e.is_some()).count();
        let expected_errors = entries.len() - expected_pages;

        let registered = entries.clone();
        let server = VirtualMachinesServer::new().on_new_list_pager(move |_| {
            let mut responder = PagerResponder::new();
            for entry in &registered {
                match entry {
                    Some(count) => responder.add_page(
                        VirtualMachinesListResponse {
                            result: VirtualMachineListResult {
                                value: vec![VirtualMachine::default(); *count],
                                next_link: None,
                            },
                        },
                        None,
                    ),
                    None => responder.add_error(Error::transport("transient")),
                }
            }
            responder
        });
        let (client, transport) = fake_client(server);

        let rt = runtime();
        let mut pager = client.new_list_pager(RESOURCE_GROUP, None);
        let (mut items, mut pages, mut errors, mut calls) = (0, 0, 0, 0);
        while pager.more() {
            calls += 1;
            match rt.block_on(pager.next_page()) {
                Ok(page) => {
                    items += page.result.value.len();
                    pages += 1;
                }
                Err(_) => errors += 1,
            }
        }

        prop_assert_eq!(items, expected_items);
        prop_assert_eq!(pages, expected_pages);
        prop_assert_eq!(errors, expected_errors);
        prop_assert_eq!(calls, entries.len());
        prop_assert_eq!(pager.pages() as usize, expected_pages);
        prop_assert_eq!(transport.calls_for(Operation::NewListPager), entries.len());
        prop_assert_eq!(transport.active_pagers(), 0);
    }
}
