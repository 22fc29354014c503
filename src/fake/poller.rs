//! Long-running operation simulator.
//!
//! A [`PollerSimulator`] owns one response queue and one current state. Each
//! call to [`poll`](PollerSimulator::poll) consumes exactly one entry:
//!
//! - non-terminal entries keep the operation `Pending`
//! - a terminal success entry moves it to `Succeeded`
//! - a terminal failure entry moves it to `Failed`
//!
//! Nothing leaves a terminal state. The terminal entry must be the last entry
//! added, and there can only be one.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::{FakeError, ResponseError};
use super::queue::ResponseQueue;

/// Status attached to non-terminal entries unless overridden.
pub const STATUS_ACCEPTED: u16 = 202;

/// Status attached to the terminal success entry unless overridden.
pub const STATUS_OK: u16 = 200;

/// Poller state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollerState {
    /// Operation still in progress
    Pending,
    /// Terminal success
    Succeeded,
    /// Terminal failure
    Failed,
}

impl PollerState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollerState::Succeeded | PollerState::Failed)
    }
}

impl fmt::Display for PollerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollerState::Pending => write!(f, "Pending"),
            PollerState::Succeeded => write!(f, "Succeeded"),
            PollerState::Failed => write!(f, "Failed"),
        }
    }
}

/// One canned poll response.
#[derive(Debug, Clone, PartialEq)]
pub enum PollerEntry<T> {
    NonTerminal { status: u16, payload: Option<T> },
    Succeeded { status: u16, payload: T },
    Failed(ResponseError),
}

impl<T> PollerEntry<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollerEntry::NonTerminal { .. })
    }
}

/// How a scripted poller ends.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal<T> {
    Success(T),
    Failure(ResponseError),
}

/// Result of a single successful poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus<T> {
    /// The operation is still running.
    Running { status: u16, payload: Option<T> },
    /// The operation completed; carries the final payload.
    Succeeded { status: u16, payload: T },
}

impl<T> PollStatus<T> {
    pub fn is_running(&self) -> bool {
        matches!(self, PollStatus::Running { .. })
    }
}

/// Simulated long-running operation.
#[derive(Debug, Clone)]
pub struct PollerSimulator<T> {
    queue: ResponseQueue<PollerEntry<T>>,
    state: PollerState,
    terminal_set: bool,
    outcome: Option<Result<T, ResponseError>>,
    polls: u32,
    history: Vec<(PollerState, DateTime<Utc>)>,
}

impl<T> PollerSimulator<T> {
    /// Create an empty poller in the `Pending` state.
    pub fn new() -> Self {
        Self {
            queue: ResponseQueue::new(),
            state: PollerState::Pending,
            terminal_set: false,
            outcome: None,
            polls: 0,
            history: vec![(PollerState::Pending, Utc::now())],
        }
    }

    /// Build a poller from non-terminal payloads followed by its terminal
    /// outcome. Cannot fail: the terminal entry is always last.
    pub fn from_script(non_terminal: Vec<Option<T>>, terminal: Terminal<T>) -> Self {
        let mut poller = Self::new();
        for payload in non_terminal {
            poller.queue.push(PollerEntry::NonTerminal {
                status: STATUS_ACCEPTED,
                payload,
            });
        }
        let entry = match terminal {
            Terminal::Success(payload) => PollerEntry::Succeeded {
                status: STATUS_OK,
                payload,
            },
            Terminal::Failure(err) => PollerEntry::Failed(err),
        };
        poller.queue.push(entry);
        poller.terminal_set = true;
        poller
    }

    /// Append a non-terminal entry (operation still in progress).
    pub fn add_non_terminal(&mut self, payload: Option<T>) -> Result<(), FakeError> {
        self.add_non_terminal_with_status(STATUS_ACCEPTED, payload)
    }

    pub fn add_non_terminal_with_status(
        &mut self,
        status: u16,
        payload: Option<T>,
    ) -> Result<(), FakeError> {
        self.push(PollerEntry::NonTerminal { status, payload })
    }

    /// Append the terminal success entry.
    pub fn set_terminal_success(&mut self, payload: T) -> Result<(), FakeError> {
        self.set_terminal_success_with_status(STATUS_OK, payload)
    }

    pub fn set_terminal_success_with_status(
        &mut self,
        status: u16,
        payload: T,
    ) -> Result<(), FakeError> {
        self.push(PollerEntry::Succeeded { status, payload })
    }

    /// Append the terminal failure entry.
    pub fn set_terminal_failure(
        &mut self,
        error_code: impl Into<String>,
        http_status: u16,
    ) -> Result<(), FakeError> {
        self.push(PollerEntry::Failed(ResponseError::new(http_status, error_code)))
    }

    fn push(&mut self, entry: PollerEntry<T>) -> Result<(), FakeError> {
        if self.terminal_set {
            return Err(FakeError::TerminalAlreadySet);
        }
        self.terminal_set = entry.is_terminal();
        self.queue.push(entry);
        Ok(())
    }

    /// Consume the next entry and advance the state machine.
    pub fn poll(&mut self) -> Result<PollStatus<T>, FakeError>
    where
        T: Clone,
    {
        if self.state.is_terminal() {
            return Err(FakeError::AlreadyTerminal(self.state));
        }

        let entry = self.queue.pop()?;
        self.polls += 1;

        match entry {
            PollerEntry::NonTerminal { status, payload } => {
                self.transition(PollerState::Pending);
                Ok(PollStatus::Running { status, payload })
            }
            PollerEntry::Succeeded { status, payload } => {
                self.transition(PollerState::Succeeded);
                self.outcome = Some(Ok(payload.clone()));
                Ok(PollStatus::Succeeded { status, payload })
            }
            PollerEntry::Failed(err) => {
                self.transition(PollerState::Failed);
                self.outcome = Some(Err(err.clone()));
                Err(FakeError::OperationFailed(err))
            }
        }
    }

    fn transition(&mut self, state: PollerState) {
        debug!(from = %self.state, to = %state, poll = self.polls, "poller transition");
        self.state = state;
        self.history.push((state, Utc::now()));
    }

    /// True iff the poller reached `Succeeded` or `Failed`.
    pub fn is_done(&self) -> bool {
        self.state.is_terminal()
    }

    /// Final payload, or the stored failure. Only valid once done.
    pub fn result(&self) -> Result<T, FakeError>
    where
        T: Clone,
    {
        match &self.outcome {
            None => Err(FakeError::NotDone),
            Some(Ok(payload)) => Ok(payload.clone()),
            Some(Err(err)) => Err(FakeError::OperationFailed(err.clone())),
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Number of entries consumed so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Entries still queued.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Whether a terminal entry has been queued.
    pub fn has_terminal(&self) -> bool {
        self.terminal_set
    }

    /// State history for debugging
    pub fn history(&self) -> &[(PollerState, DateTime<Utc>)] {
        &self.history
    }
}

impl<T> Default for PollerSimulator<T> {
    fn default() -> Self {
        Self::new()
    }
}
