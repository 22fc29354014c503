//! Declarative scenarios
//!
//! A scenario file describes a fake backend (one handler per
//! `[[operation]]`) together with the expected outcome of calling each
//! operation once. [`run`] builds nothing itself: callers build the server
//! with [`Scenario::build_server`] so the same server can also be served
//! over the wire transport.

mod report;
mod runner;
mod spec;

pub use report::{ExitCode, OperationReport, Outcome, RunReport, REPORT_SCHEMA_ID};
pub use runner::run;
pub use spec::{Expectation, OperationSpec, PageSpec, Scenario, ScenarioError};
