//! Drives every operation of a scenario against a fake server.

use std::time::Instant;

use tracing::{debug, info, warn};

use super::report::{OperationReport, Outcome, RunReport};
use super::spec::{OperationSpec, Scenario};
use crate::fake::{
    FakeError, FakeServer, HandlerKind, PagerSimulator, PollerSimulator, PollerState, Request,
    Resource,
};
use crate::poll::{poll_until_done, PollOptions};
use crate::signal::CancelToken;

/// Run `scenario` against `server`.
///
/// Simulated failures and exhausted polling budgets are recorded in the
/// report. Cancellation and harness misuse abort the run.
pub fn run(
    scenario: &Scenario,
    server: &FakeServer<Resource>,
    subscription_id: &str,
    options: &PollOptions,
    cancel: Option<&CancelToken>,
) -> Result<RunReport, FakeError> {
    let started = Instant::now();
    let subscription_id = scenario.subscription_id.as_deref().unwrap_or(subscription_id);
    let mut operations = Vec::with_capacity(scenario.operations.len());

    for op in &scenario.operations {
        let mut request =
            Request::new(op.name.clone(), scenario.resource_group.clone()).with_subscription(subscription_id);
        request.resource_name = op.resource.clone();

        let outcome = match op.kind {
            HandlerKind::Sync => run_sync(server, &request)?,
            HandlerKind::Poller => run_poller(server, &request, options, cancel)?,
            HandlerKind::Pager => run_pager(server, &request, cancel)?,
        };

        let failures = check(op, &outcome, &scenario.resource_group);
        if failures.is_empty() {
            info!(operation = %op.name, kind = %op.kind, "operation passed");
        } else {
            for failure in &failures {
                warn!(operation = %op.name, %failure, "expectation not met");
            }
        }

        operations.push(OperationReport {
            operation: op.name.clone(),
            outcome,
            failures,
        });
    }

    let report = RunReport::new(
        scenario.name.clone(),
        operations,
        started.elapsed().as_millis() as u64,
    );
    info!(
        scenario = %report.scenario,
        passed = report.passed,
        duration_ms = report.duration_ms,
        "{}",
        report.human_summary
    );
    Ok(report)
}

fn run_sync(server: &FakeServer<Resource>, request: &Request) -> Result<Outcome, FakeError> {
    match server.get(request) {
        Ok(resource) => Ok(Outcome::Sync {
            resource: Some(resource),
            error: None,
        }),
        Err(FakeError::OperationFailed(err)) => Ok(Outcome::Sync {
            resource: None,
            error: Some(err),
        }),
        Err(other) => Err(other),
    }
}

fn run_poller(
    server: &FakeServer<Resource>,
    request: &Request,
    options: &PollOptions,
    cancel: Option<&CancelToken>,
) -> Result<Outcome, FakeError> {
    match server.begin(request) {
        Ok(poller) => drive_poller(poller, options, cancel),
        Err(FakeError::OperationFailed(err)) => Ok(Outcome::Poller {
            polls: 0,
            state: PollerState::Failed,
            resource: None,
            error: Some(err),
            timed_out: false,
        }),
        Err(other) => Err(other),
    }
}

fn drive_poller(
    mut poller: PollerSimulator<Resource>,
    options: &PollOptions,
    cancel: Option<&CancelToken>,
) -> Result<Outcome, FakeError> {
    let (resource, error, timed_out) = match poll_until_done(&mut poller, options, cancel) {
        Ok(resource) => (Some(resource), None, false),
        Err(FakeError::OperationFailed(err)) => (None, Some(err), false),
        Err(FakeError::Timeout { .. }) => (None, None, true),
        Err(other) => return Err(other),
    };

    Ok(Outcome::Poller {
        polls: poller.polls(),
        state: poller.state(),
        resource,
        error,
        timed_out,
    })
}

fn run_pager(
    server: &FakeServer<Resource>,
    request: &Request,
    cancel: Option<&CancelToken>,
) -> Result<Outcome, FakeError> {
    drain_pager(server.pager(request)?, cancel)
}

fn drain_pager(
    mut pager: PagerSimulator<Resource>,
    cancel: Option<&CancelToken>,
) -> Result<Outcome, FakeError> {
    let mut items = Vec::new();
    let mut errors = Vec::new();

    // Transient errors are retried by asking for the next page
    while pager.has_more() {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            debug!(consumed = pager.cursor(), "paging cancelled");
            return Err(FakeError::Cancelled {
                polls: u32::try_from(pager.cursor()).unwrap_or(u32::MAX),
            });
        }
        match pager.next_page() {
            Ok(page) => items.extend(page),
            Err(FakeError::TransientPageError(err)) => errors.push(err),
            Err(other) => return Err(other),
        }
    }

    Ok(Outcome::Pager {
        items,
        pages: pager.pages_served(),
        errors,
    })
}

/// Unmet expectations for one operation.
fn check(op: &OperationSpec, outcome: &Outcome, resource_group: &str) -> Vec<String> {
    let expect = op.expectation();
    let mut failures = Vec::new();

    for resource in outcome.resources() {
        if !resource.id_contains(resource_group) {
            failures.push(format!(
                "resource id '{}' does not contain resource group '{}'",
                resource.id, resource_group
            ));
        }
    }

    if let Outcome::Poller { state, timed_out, .. } = outcome {
        if let Some(expected) = expect.state {
            if *state != expected {
                failures.push(format!("expected state {}, got {}", expected, state));
            }
        } else if *timed_out {
            failures.push("polling budget exhausted before a terminal state".to_string());
        }
    }

    if expect.http_status.is_some() || expect.error_code.is_some() {
        match outcome.error() {
            None => failures.push("expected an error, operation succeeded".to_string()),
            Some(err) => {
                if let Some(status) = expect.http_status {
                    if err.http_status != status {
                        failures.push(format!("expected HTTP {}, got {}", status, err.http_status));
                    }
                }
                if let Some(code) = &expect.error_code {
                    if &err.error_code != code {
                        failures.push(format!("expected error code {}, got {}", code, err.error_code));
                    }
                }
            }
        }
    }

    if let Some(name) = &expect.name {
        match outcome.resources().first() {
            Some(resource) if &resource.name == name => {}
            Some(resource) => {
                failures.push(format!("expected name {}, got {}", name, resource.name))
            }
            None => failures.push(format!("expected resource {}, got none", name)),
        }
    }

    if let Outcome::Pager { items, pages, errors } = outcome {
        let counts = [
            ("items", expect.items, items.len()),
            ("pages", expect.pages, *pages),
            ("errors", expect.errors, errors.len()),
        ];
        for (what, expected, actual) in counts {
            if let Some(expected) = expected {
                if expected != actual {
                    failures.push(format!("expected {} {}, got {}", expected, what, actual));
                }
            }
        }
    }

    failures
}
