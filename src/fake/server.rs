//! Fake Server Dispatch Table
//!
//! Maps logical operation names to handler closures. A server is assembled
//! once through [`FakeServerBuilder`] and is immutable afterwards; every
//! dispatch calls the handler again, so each invocation gets a fresh
//! simulator that no other invocation can observe.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::{FakeError, ResponseError};
use super::pager::PagerSimulator;
use super::poller::PollerSimulator;

/// Logical request handed to a handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Operation name (e.g. `Get`, `BeginDelete`, `List`)
    pub operation: String,
    #[serde(default)]
    pub subscription_id: String,
    /// Scoping name, i.e. the resource group
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl Request {
    pub fn new(operation: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            scope: scope.into(),
            ..Self::default()
        }
    }

    pub fn with_subscription(mut self, subscription_id: impl Into<String>) -> Self {
        self.subscription_id = subscription_id.into();
        self
    }

    pub fn with_resource(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(name.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// What kind of response a handler produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    Sync,
    Poller,
    Pager,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKind::Sync => write!(f, "sync"),
            HandlerKind::Poller => write!(f, "poller"),
            HandlerKind::Pager => write!(f, "pager"),
        }
    }
}

pub type SyncHandler<T> = Arc<dyn Fn(&Request) -> Result<T, ResponseError> + Send + Sync>;
pub type PollerHandler<T> =
    Arc<dyn Fn(&Request) -> Result<PollerSimulator<T>, ResponseError> + Send + Sync>;
pub type PagerHandler<T> = Arc<dyn Fn(&Request) -> PagerSimulator<T> + Send + Sync>;

enum Handler<T> {
    Sync(SyncHandler<T>),
    Poller(PollerHandler<T>),
    Pager(PagerHandler<T>),
}

impl<T> Handler<T> {
    fn kind(&self) -> HandlerKind {
        match self {
            Handler::Sync(_) => HandlerKind::Sync,
            Handler::Poller(_) => HandlerKind::Poller,
            Handler::Pager(_) => HandlerKind::Pager,
        }
    }
}

impl<T> Clone for Handler<T> {
    fn clone(&self) -> Self {
        match self {
            Handler::Sync(f) => Handler::Sync(Arc::clone(f)),
            Handler::Poller(f) => Handler::Poller(Arc::clone(f)),
            Handler::Pager(f) => Handler::Pager(Arc::clone(f)),
        }
    }
}

/// Result of dispatching a request.
#[derive(Debug)]
pub enum Dispatch<T> {
    Sync(T),
    Poller(PollerSimulator<T>),
    Pager(PagerSimulator<T>),
}

impl<T> Dispatch<T> {
    pub fn kind(&self) -> HandlerKind {
        match self {
            Dispatch::Sync(_) => HandlerKind::Sync,
            Dispatch::Poller(_) => HandlerKind::Poller,
            Dispatch::Pager(_) => HandlerKind::Pager,
        }
    }
}

/// Registers handlers before the server is frozen.
pub struct FakeServerBuilder<T> {
    handlers: HashMap<String, Handler<T>>,
}

impl<T> FakeServerBuilder<T> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    fn register(mut self, operation: impl Into<String>, handler: Handler<T>) -> Self {
        let operation = operation.into();
        if let Some(previous) = self.handlers.insert(operation.clone(), handler) {
            debug!(%operation, replaced = %previous.kind(), "handler replaced");
        }
        self
    }

    /// Register a synchronous operation.
    pub fn sync<F>(self, operation: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request) -> Result<T, ResponseError> + Send + Sync + 'static,
    {
        self.register(operation, Handler::Sync(Arc::new(handler)))
    }

    /// Register a long-running operation.
    pub fn poller<F>(self, operation: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request) -> Result<PollerSimulator<T>, ResponseError> + Send + Sync + 'static,
    {
        self.register(operation, Handler::Poller(Arc::new(handler)))
    }

    /// Register a paginated operation.
    pub fn pager<F>(self, operation: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request) -> PagerSimulator<T> + Send + Sync + 'static,
    {
        self.register(operation, Handler::Pager(Arc::new(handler)))
    }

    pub fn build(self) -> FakeServer<T> {
        FakeServer {
            handlers: Arc::new(self.handlers),
        }
    }
}

impl<T> Default for FakeServerBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable dispatch table for a simulated backend.
pub struct FakeServer<T> {
    handlers: Arc<HashMap<String, Handler<T>>>,
}

impl<T> FakeServer<T> {
    pub fn builder() -> FakeServerBuilder<T> {
        FakeServerBuilder::new()
    }

    /// Registered operation names, sorted.
    pub fn operations(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn handler_kind(&self, operation: &str) -> Option<HandlerKind> {
        self.handlers.get(operation).map(Handler::kind)
    }

    /// Invoke the handler registered for `request.operation`.
    ///
    /// Handler-level errors are terminal business failures and surface as
    /// [`FakeError::OperationFailed`].
    pub fn dispatch(&self, request: &Request) -> Result<Dispatch<T>, FakeError> {
        let handler = self
            .handlers
            .get(&request.operation)
            .ok_or_else(|| FakeError::UnknownOperation(request.operation.clone()))?;

        debug!(
            operation = %request.operation,
            kind = %handler.kind(),
            scope = %request.scope,
            "dispatching fake request"
        );

        let dispatched = match handler {
            Handler::Sync(f) => f(request).map(Dispatch::Sync),
            Handler::Poller(f) => f(request).map(Dispatch::Poller),
            Handler::Pager(f) => Ok(Dispatch::Pager(f(request))),
        };
        dispatched.map_err(FakeError::OperationFailed)
    }

    fn expect_kind(&self, request: &Request, expected: HandlerKind) -> Result<(), FakeError> {
        match self.handler_kind(&request.operation) {
            None => Err(FakeError::UnknownOperation(request.operation.clone())),
            Some(actual) if actual != expected => Err(FakeError::KindMismatch {
                operation: request.operation.clone(),
                expected,
                actual,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Call a synchronous operation.
    pub fn get(&self, request: &Request) -> Result<T, FakeError> {
        self.expect_kind(request, HandlerKind::Sync)?;
        match self.dispatch(request)? {
            Dispatch::Sync(value) => Ok(value),
            other => Err(self.mismatch(request, HandlerKind::Sync, other.kind())),
        }
    }

    /// Start a long-running operation.
    pub fn begin(&self, request: &Request) -> Result<PollerSimulator<T>, FakeError> {
        self.expect_kind(request, HandlerKind::Poller)?;
        match self.dispatch(request)? {
            Dispatch::Poller(poller) => Ok(poller),
            other => Err(self.mismatch(request, HandlerKind::Poller, other.kind())),
        }
    }

    /// Start a paginated listing.
    pub fn pager(&self, request: &Request) -> Result<PagerSimulator<T>, FakeError> {
        self.expect_kind(request, HandlerKind::Pager)?;
        match self.dispatch(request)? {
            Dispatch::Pager(pager) => Ok(pager),
            other => Err(self.mismatch(request, HandlerKind::Pager, other.kind())),
        }
    }

    fn mismatch(&self, request: &Request, expected: HandlerKind, actual: HandlerKind) -> FakeError {
        FakeError::KindMismatch {
            operation: request.operation.clone(),
            expected,
            actual,
        }
    }
}

impl<T> Clone for FakeServer<T> {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
        }
    }
}

impl<T> fmt::Debug for FakeServer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeServer")
            .field("operations", &self.operations())
            .finish()
    }
}
