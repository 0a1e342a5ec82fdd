//! Interrupt handling (Ctrl-C)
//!
//! First interrupt: cancel the attached request through its
//! [`CancellationSignal`]. Second interrupt: exit immediately with the
//! cancelled exit code. Further interrupts are ignored.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, warn};

use crate::cancel::CancellationSignal;
use crate::connection::ExitKind;

/// Exit code used when a request is cancelled.
pub const EXIT_CODE_CANCELLED: i32 = ExitKind::Cancelled.code();

/// Action to take after an interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// First interrupt: cancel the attached request
    Cancel,
    /// Second interrupt: exit immediately
    ImmediateExit,
    /// Third+ interrupt: ignore
    Ignore,
}

/// Interrupt counter plus the signal of the request currently in flight.
#[derive(Debug, Default)]
pub struct InterruptState {
    count: AtomicU8,
    attached: Mutex<Option<Arc<CancellationSignal>>>,
}

impl InterruptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route the next interrupt to `signal`.
    pub fn attach(&self, signal: Arc<CancellationSignal>) {
        *self.attached.lock().unwrap_or_else(PoisonError::into_inner) = Some(signal);
    }

    /// Stop routing interrupts to the previously attached signal.
    pub fn detach(&self) {
        self.attached.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    /// Number of interrupts received
    pub fn interrupt_count(&self) -> u8 {
        self.count.load(Ordering::SeqCst)
    }

    /// Handle one interrupt and report what the caller should do.
    pub fn handle_interrupt(&self) -> SignalAction {
        let previous = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_add(1)))
            .unwrap_or(u8::MAX);

        match previous {
            0 => {
                let signal = self.attached.lock().unwrap_or_else(PoisonError::into_inner).clone();
                match signal {
                    Some(signal) => {
                        if let Err(err) = signal.cancel() {
                            error!(error = %err, "cancellation after interrupt failed");
                        }
                    }
                    None => warn!("interrupt received with no request in flight"),
                }
                SignalAction::Cancel
            }
            1 => SignalAction::ImmediateExit,
            _ => SignalAction::Ignore,
        }
    }
}

/// Install the process-wide Ctrl-C handler.
///
/// Must be called at most once per process.
pub fn install(state: Arc<InterruptState>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || match state.handle_interrupt() {
        SignalAction::Cancel => {
            eprintln!("\nReceived interrupt, cancelling request...");
        }
        SignalAction::ImmediateExit => {
            eprintln!("\nReceived second interrupt, exiting immediately...");
            std::process::exit(EXIT_CODE_CANCELLED);
        }
        SignalAction::Ignore => {}
    })
}
