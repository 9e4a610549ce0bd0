//! Shutdown signalling for the supervised server
//!
//! SIGINT and SIGTERM sent to the launcher are counted on a [`ShutdownToken`].
//! The supervisor polls the token and forwards an escalating signal to the
//! child for each one received:
//!
//! 1. first signal: SIGINT, letting the server shut down cleanly
//! 2. second signal: SIGTERM
//! 3. any further signal: SIGKILL

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::warn;

/// What to deliver to the child for a given signal count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Interrupt,
    Terminate,
    Kill,
}

impl SignalAction {
    /// Action for the `n`th received signal (1-based).
    pub fn for_count(n: u8) -> Self {
        match n {
            0 | 1 => SignalAction::Interrupt,
            2 => SignalAction::Terminate,
            _ => SignalAction::Kill,
        }
    }
}

/// Cancellation token shared between the signal handler and the supervisor.
///
/// Cloning is cheap and every clone observes the same count.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    signal_count: Arc<AtomicU8>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a received signal and return what should be forwarded.
    pub fn trigger(&self) -> SignalAction {
        let prev = self
            .signal_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_add(1))
            })
            .unwrap_or(u8::MAX);
        SignalAction::for_count(prev.saturating_add(1))
    }

    pub fn signal_count(&self) -> u8 {
        self.signal_count.load(Ordering::SeqCst)
    }
}

/// Route SIGINT/SIGTERM to `token`. Can only be installed once per process.
pub fn install_handler(token: &ShutdownToken) -> Result<(), ctrlc::Error> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        let action = token.trigger();
        match action {
            SignalAction::Interrupt => warn!("interrupt received, stopping server..."),
            SignalAction::Terminate => warn!("second interrupt received, terminating server"),
            SignalAction::Kill => warn!("killing server"),
        }
    })
}
