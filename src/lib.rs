//! armfake - simulated cloud-resource backend for client tests
//!
//! Fakes a resource management service for synchronous calls, long-running
//! operations (pollers) and paginated listings. Test code drives the
//! simulators in [`fake`] directly, or through [`transport::FakeTransport`]
//! which speaks the async-operation and paging wire protocol.

pub mod config;
pub mod fake;
pub mod logging;
pub mod poll;
pub mod scenario;
pub mod signal;
pub mod transport;

pub use config::{EffectiveConfig, Settings};
pub use fake::{FakeError, FakeServer, PagerSimulator, PollerSimulator, Request, Resource, ResponseError};
pub use poll::{poll_until_done, PollOptions};
pub use scenario::{RunReport, Scenario};
pub use signal::CancelToken;
pub use transport::FakeTransport;
