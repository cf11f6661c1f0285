//! Transport shim that serves client requests from a [`VirtualMachinesServer`].
//!
//! Long-running operations and pagers span several requests. Their cursors
//! live in token-keyed maps owned by each `ServerTransport`, with the token
//! carried in the `Location` link (`fakePollToken`) or the `nextLink`
//! (`fakePageToken`). A pager that has not delivered a page yet is also
//! reachable by the correlation id its client sends, so a failed first page
//! can be retried without starting a new instance.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderName, LOCATION, RETRY_AFTER};
use reqwest::{Method, StatusCode, Url};
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::{CORRELATION_ID_HEADER, REQUEST_ID_HEADER};
use crate::error::{Error, ResponseError};
use crate::fake::pager_responder::PagerResponder;
use crate::fake::poller_responder::{PollStep, PollerResponder, TerminalOutcome};
use crate::fake::server::{
    BeginDeleteArgs, GetArgs, Handler, ListArgs, Operation, VirtualMachinesServer,
};
use crate::transport::{Request, Response, Transport};
use crate::types::{BeginDeleteOptions, GetOptions, ListOptions};

/// Query parameter correlating polls with their operation.
pub const POLL_TOKEN_PARAM: &str = "fakePollToken";

/// Query parameter correlating page requests with their pager.
pub const PAGE_TOKEN_PARAM: &str = "fakePageToken";

/// Record of a request served by the shim.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Operation the request belongs to; polls count as `BeginDelete`
    pub operation: Operation,
    pub method: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Get(GetArgs),
    BeginDelete(BeginDeleteArgs),
    Poll { token: String },
    List { args: ListArgs, token: Option<String> },
}

impl Route {
    fn parse(request: &Request) -> Result<Self, Error> {
        let unroutable = || {
            Error::FakeMisconfigured(format!(
                "no fake route for {} {}",
                request.method,
                request.url.path()
            ))
        };

        let segments: Vec<&str> = request
            .url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let literal = |i: usize, expected: &str| {
            segments
                .get(i)
                .map_or(false, |seg| seg.eq_ignore_ascii_case(expected))
        };

        let is_vm_collection = segments.len() >= 7
            && literal(0, "subscriptions")
            && literal(2, "resourceGroups")
            && literal(4, "providers")
            && literal(5, "Microsoft.Compute")
            && literal(6, "virtualMachines");
        if !is_vm_collection || segments.len() > 8 {
            return Err(unroutable());
        }

        let resource_group_name = segments[3].to_string();
        let vm_name = segments.get(7).map(|s| (*s).to_string());

        match vm_name {
            Some(vm_name) if request.method == Method::GET => {
                if let Some(token) = request.query_param(POLL_TOKEN_PARAM) {
                    return Ok(Self::Poll { token });
                }
                Ok(Self::Get(GetArgs {
                    resource_group_name,
                    vm_name,
                    options: GetOptions {
                        expand: request.query_param("$expand"),
                    },
                }))
            }
            Some(vm_name) if request.method == Method::DELETE => {
                Ok(Self::BeginDelete(BeginDeleteArgs {
                    resource_group_name,
                    vm_name,
                    options: BeginDeleteOptions {
                        force_deletion: request
                            .query_param("forceDeletion")
                            .map(|v| v.eq_ignore_ascii_case("true")),
                    },
                }))
            }
            None if request.method == Method::GET => Ok(Self::List {
                args: ListArgs {
                    resource_group_name,
                    options: ListOptions {
                        filter: request.query_param("$filter"),
                    },
                },
                token: request.query_param(PAGE_TOKEN_PARAM),
            }),
            _ => Err(unroutable()),
        }
    }

    fn operation(&self) -> Operation {
        match self {
            Self::Get(_) => Operation::Get,
            Self::BeginDelete(_) | Self::Poll { .. } => Operation::BeginDelete,
            Self::List { .. } => Operation::NewListPager,
        }
    }
}

/// Cursor state. Pollers are kept until [`ServerTransport::clear`], since
/// terminal operations stay pollable. Pagers leave once their last entry is
/// served; abandoned ones stay until `clear`.
#[derive(Default)]
struct ShimState {
    pollers: HashMap<String, PollerResponder<Value>>,
    pagers: HashMap<String, PagerResponder<Value>>,
    /// Correlation id → token for pagers with no delivered page yet.
    pending_pagers: HashMap<String, String>,
    calls: Vec<RecordedCall>,
}

impl ShimState {
    fn close_pager(&mut self, token: &str) {
        self.pagers.remove(token);
        self.pending_pagers.retain(|_, pending| pending.as_str() != token);
    }
}

/// [`Transport`] that answers from a fake server instead of the network.
pub struct ServerTransport {
    server: VirtualMachinesServer,
    state: Mutex<ShimState>,
}

impl ServerTransport {
    pub fn new(server: VirtualMachinesServer) -> Self {
        Self {
            server,
            state: Mutex::new(ShimState::default()),
        }
    }

    /// All requests served so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Number of requests served for `operation`.
    #[must_use]
    pub fn calls_for(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    /// Operations started and not forgotten; terminal ones stay pollable.
    #[must_use]
    pub fn active_pollers(&self) -> usize {
        self.lock().pollers.len()
    }

    /// Pagers with entries still to serve.
    #[must_use]
    pub fn active_pagers(&self) -> usize {
        self.lock().pagers.len()
    }

    /// Forget every operation and pager cursor. The call log is kept.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.pollers.clear();
        state.pagers.clear();
        state.pending_pagers.clear();
    }

    fn lock(&self) -> MutexGuard<'_, ShimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn dispatch(&self, request: &Request) -> Result<Response, Error> {
        let route = Route::parse(request)?;
        let operation = route.operation();
        debug!(%operation, method = %request.method, path = request.url.path(), "serving fake request");

        self.lock().calls.push(RecordedCall {
            operation,
            method: request.method.to_string(),
            url: request.url.to_string(),
            timestamp: Utc::now(),
        });

        match route {
            Route::Get(args) => self.serve_get(&args),
            Route::BeginDelete(args) => self.serve_begin_delete(request, &args),
            Route::Poll { token } => self.serve_poll(request, &token),
            Route::List { args, token } => self.serve_list(request, &args, token),
        }
    }

    fn serve_get(&self, args: &GetArgs) -> Result<Response, Error> {
        let Some(Handler::Get(handler)) = self.server.registry().lookup(Operation::Get) else {
            return Err(not_faked(Operation::Get));
        };

        match handler(args).into_outcome() {
            Ok(response) => Response::new(StatusCode::OK).with_json(&response),
            Err(err) => error_to_wire(err),
        }
    }

    fn serve_begin_delete(
        &self,
        request: &Request,
        args: &BeginDeleteArgs,
    ) -> Result<Response, Error> {
        let Some(Handler::BeginDelete(handler)) =
            self.server.registry().lookup(Operation::BeginDelete)
        else {
            return Err(not_faked(Operation::BeginDelete));
        };

        let (poller, error_responder) = handler(args);
        if let Some(err) = error_responder.into_error() {
            debug!(error = %err, "failing begin request from error responder");
            return error_to_wire(err);
        }

        poller.validate()?;
        let poller = poller.into_json()?;

        let token = Uuid::new_v4().to_string();
        let location = link_with_token(&request.url, POLL_TOKEN_PARAM, &token, None);
        debug!(%token, non_terminal = poller.non_terminal_count(), "started fake operation");
        self.lock().pollers.insert(token, poller);

        accepted(&location, None)
    }

    fn serve_poll(&self, request: &Request, token: &str) -> Result<Response, Error> {
        let mut guard = self.lock();
        let poller = guard.pollers.get_mut(token).ok_or_else(|| {
            Error::FakeMisconfigured(format!("unknown {POLL_TOKEN_PARAM} {token}"))
        })?;

        debug!(%token, "polling fake operation");
        match poller.poll()? {
            PollStep::NonTerminal(payload) => accepted(&request.url, payload),
            PollStep::Terminal(TerminalOutcome::Success(payload)) => success(payload),
            PollStep::Terminal(TerminalOutcome::Error(err)) => error_response(err),
        }
    }

    fn serve_list(
        &self,
        request: &Request,
        args: &ListArgs,
        token: Option<String>,
    ) -> Result<Response, Error> {
        let token = match token {
            Some(token) => token,
            None => {
                let correlation_id = request
                    .headers
                    .get(CORRELATION_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .map(String::from);
                let pending = correlation_id
                    .as_ref()
                    .and_then(|id| self.lock().pending_pagers.get(id).cloned());
                match pending {
                    Some(token) => token,
                    None => self.start_pager(args, correlation_id)?,
                }
            }
        };

        let mut guard = self.lock();
        let state = &mut *guard;
        let pager = state.pagers.get_mut(&token).ok_or_else(|| {
            Error::FakeMisconfigured(format!("unknown {PAGE_TOKEN_PARAM} {token}"))
        })?;

        let Some(entry) = pager.next_page() else {
            state.close_pager(&token);
            warn!(%token, "fake pager has no entries left");
            return Err(Error::FakeMisconfigured(format!(
                "{PAGE_TOKEN_PARAM} {token} has no entries left"
            )));
        };
        let more = pager.more();

        match entry {
            Ok(page) => {
                if more {
                    state.pending_pagers.retain(|_, pending| *pending != token);
                } else {
                    state.close_pager(&token);
                }
                debug!(%token, more, "served fake page");

                let mut payload = page.payload;
                if let Value::Object(map) = &mut payload {
                    if more {
                        let next = link_with_token(
                            &request.url,
                            PAGE_TOKEN_PARAM,
                            &token,
                            page.continuation_token.as_deref(),
                        );
                        map.insert("nextLink".to_string(), Value::String(next.to_string()));
                    } else {
                        map.remove("nextLink");
                    }
                }

                Response::new(StatusCode::OK).with_json(&payload)
            }
            Err(err) if more => {
                debug!(%token, error = %err, "served fake page error");
                error_to_wire(err)
            }
            Err(err) => {
                state.close_pager(&token);
                debug!(%token, error = %err, "served final fake page error");
                Err(final_page_error(err))
            }
        }
    }

    fn start_pager(&self, args: &ListArgs, correlation_id: Option<String>) -> Result<String, Error> {
        let Some(Handler::NewListPager(handler)) =
            self.server.registry().lookup(Operation::NewListPager)
        else {
            return Err(not_faked(Operation::NewListPager));
        };

        let pager = handler(args);
        if !pager.more() {
            return Err(Error::FakeMisconfigured(
                "pager responder has no pages or errors".to_string(),
            ));
        }
        let pager = pager.into_json()?;

        let token = Uuid::new_v4().to_string();
        debug!(%token, entries = pager.remaining(), "started fake pager");

        let mut state = self.lock();
        state.pagers.insert(token.clone(), pager);
        if let Some(correlation_id) = correlation_id {
            state.pending_pagers.insert(correlation_id, token.clone());
        }
        Ok(token)
    }
}

#[async_trait]
impl Transport for ServerTransport {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        self.dispatch(&request)
    }
}

fn not_faked(operation: Operation) -> Error {
    Error::FakeMisconfigured(format!("operation {operation} not faked"))
}

/// Same path, keeping only api-version, plus the correlation token.
fn link_with_token(url: &Url, param: &str, token: &str, skip_token: Option<&str>) -> Url {
    let api_version = url
        .query_pairs()
        .find(|(key, _)| key == "api-version")
        .map(|(_, value)| value.into_owned());

    let mut link = url.clone();
    link.set_query(None);
    {
        let mut pairs = link.query_pairs_mut();
        if let Some(api_version) = &api_version {
            pairs.append_pair("api-version", api_version);
        }
        pairs.append_pair(param, token);
        if let Some(skip_token) = skip_token {
            pairs.append_pair("$skipToken", skip_token);
        }
    }
    link
}

fn accepted(location: &Url, payload: Option<&Value>) -> Result<Response, Error> {
    let response = Response::new(StatusCode::ACCEPTED)
        .with_header(LOCATION, location.as_str())?
        .with_header(RETRY_AFTER, "0")?;

    match payload {
        Some(payload) => response.with_json(payload),
        None => Ok(response),
    }
}

fn success(payload: &Value) -> Result<Response, Error> {
    if payload.is_null() {
        return Ok(Response::new(StatusCode::NO_CONTENT));
    }
    Response::new(StatusCode::OK).with_json(payload)
}

fn error_to_wire(err: Error) -> Result<Response, Error> {
    match err {
        Error::Response(err) => error_response(&err),
        other => Err(other),
    }
}

/// Mark the last entry's error so the client stops paging. Service errors
/// are checked the same way as when they go on the wire.
fn final_page_error(err: Error) -> Error {
    match err {
        Error::Response(err) => match error_response(&err) {
            Ok(_) => Error::FinalPage(Box::new(Error::Response(err))),
            Err(misconfigured) => misconfigured,
        },
        other => Error::FinalPage(Box::new(other)),
    }
}

fn error_response(err: &ResponseError) -> Result<Response, Error> {
    let status = StatusCode::from_u16(err.status_code)
        .ok()
        .filter(|s| s.is_client_error() || s.is_server_error())
        .ok_or_else(|| {
            Error::FakeMisconfigured(format!(
                "fake error status {} is not a 4xx or 5xx status",
                err.status_code
            ))
        })?;

    let mut response = Response::new(status).with_json(&json!({
        "error": { "code": err.error_code, "message": err.message }
    }))?;
    if let Some(request_id) = &err.request_id {
        response = response.with_header(HeaderName::from_static(REQUEST_ID_HEADER), request_id)?;
    }
    Ok(response)
}
