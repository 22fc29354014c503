//! Wire Transport Adapter
//!
//! Serves a [`FakeServer`] over the ARM-style async-operation and paging
//! protocol defined in `armfake-wire`.
//!
//! - Sync handlers answer `200` with the item, or the error's status
//! - Poller handlers answer `202` with `Azure-AsyncOperation`, `Location` and
//!   `Retry-After`; every `GET /operations/{id}` consumes one poller entry
//! - Pager handlers answer the first entry right away; `nextLink` points at
//!   `/pages/{id}?$skiptoken=...` and each fetch consumes one pager entry
//!
//! In-flight simulators are keyed by a random ID and dropped once terminal or
//! exhausted.

mod router;

pub use router::{route, Route};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use armfake_wire::{
    decode_skip_token, encode_skip_token, AsyncOperationBody, ErrorDetail, PageBody,
    WireError, WireRequest, WireResponse, ASYNC_OPERATION_HEADER, LOCATION_HEADER,
    NEXT_LINK_HEADER, RETRY_AFTER_HEADER, SKIP_TOKEN_PARAM,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::TransportSettings;
use crate::fake::{
    Dispatch, FakeError, FakeServer, PagerSimulator, PollStatus, PollerSimulator, Request,
    ResourcePath, ResponseError, STATUS_ACCEPTED, STATUS_OK,
};

const STATUS_BAD_REQUEST: u16 = 400;
const STATUS_NOT_FOUND: u16 = 404;
const STATUS_METHOD_NOT_ALLOWED: u16 = 405;
const STATUS_INTERNAL_ERROR: u16 = 500;
const STATUS_NOT_IMPLEMENTED: u16 = 501;

/// In-process fake HTTP transport.
pub struct FakeTransport<T> {
    server: FakeServer<T>,
    settings: TransportSettings,
    pollers: Arc<Mutex<HashMap<String, PollerSimulator<T>>>>,
    pagers: Arc<Mutex<HashMap<String, PagerSimulator<T>>>>,
}

impl<T> Clone for FakeTransport<T> {
    fn clone(&self) -> Self {
        Self {
            server: self.server.clone(),
            settings: self.settings.clone(),
            pollers: Arc::clone(&self.pollers),
            pagers: Arc::clone(&self.pagers),
        }
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Serialize + Clone> FakeTransport<T> {
    pub fn new(server: FakeServer<T>, settings: TransportSettings) -> Self {
        Self {
            server,
            settings,
            pollers: Arc::new(Mutex::new(HashMap::new())),
            pagers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn server(&self) -> &FakeServer<T> {
        &self.server
    }

    /// Pollers that have not reached a terminal state.
    pub fn in_flight_pollers(&self) -> usize {
        lock(&self.pollers).len()
    }

    /// Pagers with entries left.
    pub fn in_flight_pagers(&self) -> usize {
        lock(&self.pagers).len()
    }

    // === Request handling ===

    /// Handle one wire request.
    pub fn handle(&self, request: &WireRequest) -> WireResponse {
        debug!(method = %request.method, path = %request.path, "fake transport request");

        match route(request.method, &request.path) {
            Route::Resource { operation, path } => self.handle_resource(operation, path, request),
            Route::OperationStatus(id) => self.handle_poll(&id),
            Route::NextPage(id) => self.handle_next_page(&id, request.query_param(SKIP_TOKEN_PARAM)),
            Route::MethodNotAllowed => WireResponse::error(
                STATUS_METHOD_NOT_ALLOWED,
                ErrorDetail::new(
                    "MethodNotAllowed",
                    format!("{} is not supported on {}", request.method, request.path),
                ),
            ),
            Route::NotFound => WireResponse::error(
                STATUS_NOT_FOUND,
                ErrorDetail::new("PathNotFound", format!("no route for {}", request.path)),
            ),
        }
    }

    /// Handle a JSON-encoded [`WireRequest`], returning a JSON-encoded
    /// [`WireResponse`].
    pub fn handle_json(&self, json_request: &str) -> Result<String, WireError> {
        let request: WireRequest = serde_json::from_str(json_request)?;
        let response = self.handle(&request);
        Ok(serde_json::to_string(&response)?)
    }

    fn handle_resource(
        &self,
        operation: &str,
        path: ResourcePath,
        wire: &WireRequest,
    ) -> WireResponse {
        let mut request = Request::new(operation, path.scope.resource_group)
            .with_subscription(path.scope.subscription_id);
        request.resource_name = path.name;
        request.options = wire.query.clone();
        request.body = wire.body.clone();

        match self.server.dispatch(&request) {
            Ok(Dispatch::Sync(item)) => json_response(STATUS_OK, &item),
            Ok(Dispatch::Poller(poller)) => self.start_poller(poller),
            Ok(Dispatch::Pager(pager)) => self.start_pager(pager),
            Err(FakeError::OperationFailed(err)) => response_error(&err),
            Err(FakeError::UnknownOperation(name)) => WireResponse::error(
                STATUS_NOT_IMPLEMENTED,
                ErrorDetail::new(
                    "UnhandledOperation",
                    format!("no fake handler registered for {}", name),
                ),
            ),
            Err(other) => internal_error(&other),
        }
    }

    fn start_poller(&self, poller: PollerSimulator<T>) -> WireResponse {
        let id = Uuid::new_v4().to_string();
        let url = self.operation_url(&id);
        debug!(operation_id = %id, entries = poller.remaining(), "poller started");
        lock(&self.pollers).insert(id, poller);

        WireResponse::empty(STATUS_ACCEPTED)
            .with_header(ASYNC_OPERATION_HEADER, url.clone())
            .with_header(LOCATION_HEADER, url)
            .with_header(RETRY_AFTER_HEADER, self.settings.retry_after_seconds.to_string())
    }

    fn handle_poll(&self, id: &str) -> WireResponse {
        let mut pollers = lock(&self.pollers);
        let Some(poller) = pollers.get_mut(id) else {
            return WireResponse::error(
                STATUS_NOT_FOUND,
                ErrorDetail::new("OperationNotFound", format!("no operation with id {}", id)),
            );
        };

        match poller.poll() {
            Ok(PollStatus::Running { status, payload }) => {
                let properties = match payload.as_ref().map(to_json).transpose() {
                    Ok(properties) => properties,
                    Err(resp) => return resp,
                };
                json_response(status, &AsyncOperationBody::in_progress(id, properties))
                    .with_header(RETRY_AFTER_HEADER, self.settings.retry_after_seconds.to_string())
            }
            Ok(PollStatus::Succeeded { status, payload }) => {
                pollers.remove(id);
                debug!(operation_id = %id, status, "poller succeeded, discarded");
                match to_json(&payload) {
                    Ok(properties) => {
                        json_response(status, &AsyncOperationBody::succeeded(id, properties))
                    }
                    Err(resp) => resp,
                }
            }
            Err(FakeError::OperationFailed(err)) => {
                pollers.remove(id);
                debug!(operation_id = %id, error = %err, "poller failed, discarded");
                json_response(
                    err.http_status,
                    &AsyncOperationBody::failed(id, error_detail(&err)),
                )
            }
            Err(other) => {
                pollers.remove(id);
                internal_error(&other)
            }
        }
    }

    fn handle_next_page(&self, id: &str, token: Option<&str>) -> WireResponse {
        let mut pagers = lock(&self.pagers);
        let Some(pager) = pagers.get_mut(id) else {
            return WireResponse::error(
                STATUS_NOT_FOUND,
                ErrorDetail::new("PagerNotFound", format!("no pager with id {}", id)),
            );
        };

        let cursor = match token.map(decode_skip_token) {
            Some(Ok(cursor)) => cursor,
            Some(Err(err)) => return reject_token(id, err.to_string()),
            None => return reject_token(id, format!("missing {}", SKIP_TOKEN_PARAM)),
        };
        if cursor != pager.cursor() {
            let message = format!("token cursor {} does not match pager cursor {}", cursor, pager.cursor());
            return reject_token(id, message);
        }

        let response = self.next_page_response(id, pager);
        if !pager.has_more() {
            debug!(pager_id = %id, pages = pager.pages_served(), "pager exhausted, discarded");
            pagers.remove(id);
        }
        response
    }

    /// Serve the first entry of a fresh pager and park it if entries remain.
    fn start_pager(&self, mut pager: PagerSimulator<T>) -> WireResponse {
        let id = Uuid::new_v4().to_string();
        let response = self.next_page_response(&id, &mut pager);
        if pager.has_more() {
            lock(&self.pagers).insert(id, pager);
        } else {
            debug!(pager_id = %id, pages = pager.pages_served(), "pager exhausted, discarded");
        }
        response
    }

    /// Consume one pager entry. The pager stays usable whatever the response.
    fn next_page_response(&self, id: &str, pager: &mut PagerSimulator<T>) -> WireResponse {
        let served = pager.next_response();
        let next_link = pager.has_more().then(|| self.next_link(id, pager.cursor()));

        match served {
            Ok(page) => match page.items.iter().map(to_json).collect::<Result<Vec<_>, _>>() {
                Ok(value) => json_response(page.status, &PageBody { value, next_link }),
                Err(resp) => resp,
            },
            Err(FakeError::TransientPageError(err)) => {
                let resp = response_error(&err);
                match next_link {
                    Some(link) => resp.with_header(NEXT_LINK_HEADER, link),
                    None => resp,
                }
            }
            Err(FakeError::PagesExhausted) => json_response(
                STATUS_OK,
                &PageBody::<Value> {
                    value: Vec::new(),
                    next_link: None,
                },
            ),
            Err(other) => internal_error(&other),
        }
    }

    fn operation_url(&self, id: &str) -> String {
        format!("{}/operations/{}", self.settings.base_url, id)
    }

    fn next_link(&self, id: &str, cursor: usize) -> String {
        format!(
            "{}/pages/{}?{}={}",
            self.settings.base_url,
            id,
            SKIP_TOKEN_PARAM,
            encode_skip_token(cursor)
        )
    }
}

fn to_json<V: Serialize>(value: &V) -> Result<Value, WireResponse> {
    serde_json::to_value(value).map_err(|e| {
        WireResponse::error(
            STATUS_INTERNAL_ERROR,
            ErrorDetail::new("SerializationFailed", e.to_string()),
        )
    })
}

fn json_response<V: Serialize>(status: u16, value: &V) -> WireResponse {
    match to_json(value) {
        Ok(body) => WireResponse::json(status, body),
        Err(resp) => resp,
    }
}

fn reject_token(id: &str, message: String) -> WireResponse {
    warn!(pager_id = %id, %message, "rejected continuation token");
    WireResponse::error(
        STATUS_BAD_REQUEST,
        ErrorDetail::new("InvalidContinuationToken", message),
    )
}

fn error_detail(err: &ResponseError) -> ErrorDetail {
    ErrorDetail::new(
        err.error_code.clone(),
        format!("simulated failure: HTTP {}", err.http_status),
    )
}

fn response_error(err: &ResponseError) -> WireResponse {
    WireResponse::error(err.http_status, error_detail(err))
}

fn internal_error(err: &FakeError) -> WireResponse {
    warn!(code = err.code(), error = %err, "harness error while serving request");
    WireResponse::error(
        STATUS_INTERNAL_ERROR,
        ErrorDetail::new(err.code(), err.to_string()),
    )
}
