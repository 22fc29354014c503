//! Polling loop for simulated long-running operations
//!
//! [`poll_until_done`] is the "block until done" convenience on top of
//! [`PollerSimulator::poll`]. Its limits are imposed by the caller:
//! - `max_polls`: number of polls before giving up with `Timeout`
//! - `frequency`: sleep between polls (zero by default)
//! - an optional [`CancelToken`] checked before every poll
//!
//! The simulator itself has no notion of time or cancellation.

use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::fake::{FakeError, PollStatus, PollerSimulator};
use crate::signal::CancelToken;

/// Upper bound on `max_polls`.
pub const MAX_POLLS_LIMIT: u32 = 100_000;

/// Upper bound on the sleep between polls.
pub const MAX_FREQUENCY: Duration = Duration::from_secs(60);

/// Caller-supplied polling limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Maximum number of polls (default: 100)
    pub max_polls: u32,

    /// Delay between polls (default: none)
    pub frequency: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            max_polls: 100,
            frequency: Duration::ZERO,
        }
    }
}

impl PollOptions {
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls;
        self
    }

    pub fn with_frequency(mut self, frequency: Duration) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn validate(&self) -> Result<(), PollOptionsError> {
        // max_polls must be in (0, MAX_POLLS_LIMIT]
        if self.max_polls == 0 || self.max_polls > MAX_POLLS_LIMIT {
            return Err(PollOptionsError::MaxPollsOutOfBounds {
                value: self.max_polls,
            });
        }

        if self.frequency > MAX_FREQUENCY {
            return Err(PollOptionsError::FrequencyOutOfBounds {
                value_ms: self.frequency.as_millis() as u64,
            });
        }

        Ok(())
    }
}

/// Polling option validation errors
#[derive(Debug, thiserror::Error)]
pub enum PollOptionsError {
    #[error("max_polls must be in (0, 100000], got {value}")]
    MaxPollsOutOfBounds { value: u32 },

    #[error("poll frequency must be at most 60000 ms, got {value_ms} ms")]
    FrequencyOutOfBounds { value_ms: u64 },
}

/// Poll until the simulator reaches a terminal state.
///
/// Returns the final payload, `OperationFailed` for a terminal failure,
/// `Timeout` when `max_polls` polls did not reach a terminal state, or
/// `Cancelled` when `cancel` fires. `Cancelled` counts every entry the poller
/// has consumed, including polls made before this call. A poller that is already done returns its
/// stored result without polling.
pub fn poll_until_done<T: Clone>(
    poller: &mut PollerSimulator<T>,
    options: &PollOptions,
    cancel: Option<&CancelToken>,
) -> Result<T, FakeError> {
    let mut polls = 0u32;

    while !poller.is_done() {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            debug!(polls = poller.polls(), "polling cancelled");
            return Err(FakeError::Cancelled {
                polls: poller.polls(),
            });
        }

        if polls >= options.max_polls {
            warn!(max_polls = options.max_polls, "polling budget exhausted");
            return Err(FakeError::Timeout {
                max_polls: options.max_polls,
            });
        }

        if polls > 0 && !options.frequency.is_zero() {
            thread::sleep(options.frequency);
        }

        polls += 1;
        match poller.poll()? {
            PollStatus::Running { status, .. } => {
                debug!(poll = polls, status, "operation still running");
            }
            PollStatus::Succeeded { payload, .. } => return Ok(payload),
        }
    }

    poller.result()
}
