//! Simulated Backend
//!
//! Building blocks for faking a cloud-resource management service in tests.
//!
//! # Components
//!
//! - [`ResponseQueue`]: consume-once sequence of canned entries
//! - [`PollerSimulator`]: long-running operation driven to a terminal state
//! - [`PagerSimulator`]: multi-page listing with transient errors
//! - [`FakeServer`]: dispatch table from operation name to handler
//!
//! # Usage
//!
//! ```
//! use armfake::fake::{FakeServer, PollerSimulator, Request, Resource};
//!
//! let server: FakeServer<Resource> = FakeServer::builder()
//!     .poller("BeginDelete", |_req: &Request| {
//!         let mut poller = PollerSimulator::new();
//!         poller.add_non_terminal(None).expect("no terminal yet");
//!         poller.set_terminal_failure("NotFound", 404).expect("first terminal");
//!         Ok(poller)
//!     })
//!     .build();
//!
//! let mut poller = server.begin(&Request::new("BeginDelete", "rg")).unwrap();
//! assert!(poller.poll().unwrap().is_running());
//! assert!(poller.poll().is_err());
//! assert!(poller.is_done());
//! ```

mod errors;
mod pager;
mod poller;
mod queue;
mod resource;
mod server;

pub use errors::{FakeError, ResponseError};
pub use pager::{Page, PageEntry, PagerSimulator};
pub use poller::{
    PollStatus, PollerEntry, PollerSimulator, PollerState, Terminal, STATUS_ACCEPTED, STATUS_OK,
};
pub use queue::ResponseQueue;
pub use resource::{Resource, ResourcePath, ResourceScope};
pub use server::{
    Dispatch, FakeServer, FakeServerBuilder, HandlerKind, PagerHandler, PollerHandler, Request,
    SyncHandler,
};
