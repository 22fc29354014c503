//! Cancellation tokens and interrupt handling
//!
//! The polling loop checks a [`CancelToken`] before every poll. The CLI wires
//! Ctrl-C into the token:
//! 1. First interrupt: cancel the token; the run stops at the next poll
//! 2. Second interrupt: exit immediately with [`EXIT_CODE_CANCELLED`]
//! 3. Any further interrupts are ignored

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Exit code for cancelled runs
pub const EXIT_CODE_CANCELLED: i32 = 130;

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    immediate_exit: AtomicBool,
    signal_count: AtomicU8,
}

/// Shared, cloneable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Arc<TokenState>,
}

/// Action to take after receiving a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// First signal: cancel in-flight polling
    Cancel,
    /// Second signal: exit immediately
    ImmediateExit,
    /// Third+ signal: ignore
    Ignore,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Check if immediate exit has been requested (double interrupt)
    pub fn is_immediate_exit(&self) -> bool {
        self.state.immediate_exit.load(Ordering::SeqCst)
    }

    pub fn signal_count(&self) -> u8 {
        self.state.signal_count.load(Ordering::SeqCst)
    }

    /// Record one interrupt and return what the caller should do.
    pub fn handle_signal(&self) -> SignalAction {
        let count = self.state.signal_count.fetch_add(1, Ordering::SeqCst);
        match count {
            0 => {
                self.cancel();
                SignalAction::Cancel
            }
            1 => {
                self.state.immediate_exit.store(true, Ordering::SeqCst);
                SignalAction::ImmediateExit
            }
            _ => SignalAction::Ignore,
        }
    }
}

/// Install a Ctrl-C handler that drives `token`.
///
/// Must be called at most once per process.
pub fn install_interrupt_handler(token: CancelToken) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || match token.handle_signal() {
        SignalAction::Cancel => {
            tracing::warn!("interrupt received, cancelling in-flight polling");
        }
        SignalAction::ImmediateExit => {
            tracing::warn!("second interrupt received, exiting immediately");
            std::process::exit(EXIT_CODE_CANCELLED);
        }
        SignalAction::Ignore => {}
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_initial() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(!token.is_immediate_exit());
        assert_eq!(token.signal_count(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let observer = token.clone();
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn test_signal_sequence() {
        let token = CancelToken::new();

        assert_eq!(token.handle_signal(), SignalAction::Cancel);
        assert!(token.is_cancelled());
        assert!(!token.is_immediate_exit());

        assert_eq!(token.handle_signal(), SignalAction::ImmediateExit);
        assert!(token.is_immediate_exit());

        assert_eq!(token.handle_signal(), SignalAction::Ignore);
        assert_eq!(token.signal_count(), 3);
    }
}
