//! Timeout-driven cancellation
//!
//! The cancellation primitives have no notion of time. A timeout is a
//! collaborator that calls [`CancellationSignal::cancel`] once a deadline
//! passes; cancellation then proceeds like any other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::cancel::CancellationSignal;

/// Upper bound for `overall_seconds`: one day.
pub const MAX_OVERALL_SECONDS: u64 = 86_400;

/// Timeout configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Maximum wall-clock time per model request
    pub overall_seconds: u64,
}

impl TimeoutConfig {
    /// overall_seconds must be in (0, 86400]
    pub fn validate(&self) -> Result<(), TimeoutValidationError> {
        if self.overall_seconds == 0 || self.overall_seconds > MAX_OVERALL_SECONDS {
            return Err(TimeoutValidationError::OverallOutOfBounds {
                value: self.overall_seconds,
            });
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.overall_seconds)
    }
}

/// Timeout validation errors
#[derive(Debug, thiserror::Error)]
pub enum TimeoutValidationError {
    #[error("timeout_seconds must be in (0, 86400], got {value}")]
    OverallOutOfBounds { value: u64 },
}

/// Watchdog that cancels a signal when a deadline passes.
///
/// Disarming (or dropping) the timer before the deadline stops the watchdog
/// without cancelling.
#[derive(Debug)]
pub struct CancelTimer {
    disarm: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    fired: Arc<AtomicBool>,
}

impl CancelTimer {
    /// Start a watchdog that cancels `signal` after `timeout`.
    pub fn start(signal: Arc<CancellationSignal>, timeout: Duration) -> Self {
        let (disarm, disarmed) = mpsc::channel::<()>();
        let fired = Arc::new(AtomicBool::new(false));
        let fired_flag = Arc::clone(&fired);

        let handle = thread::spawn(move || match disarmed.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "deadline passed, cancelling");
                fired_flag.store(true, Ordering::SeqCst);
                if let Err(err) = signal.cancel() {
                    error!(error = %err, "cancellation after timeout failed");
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                debug!("cancel timer disarmed");
            }
        });

        Self {
            disarm: Some(disarm),
            handle: Some(handle),
            fired,
        }
    }

    /// Whether the deadline passed and the timer requested cancellation.
    pub fn fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Stop the watchdog. Returns whether it had already fired.
    pub fn disarm(mut self) -> bool {
        self.shutdown();
        self.fired()
    }

    fn shutdown(&mut self) {
        if let Some(disarm) = self.disarm.take() {
            // The watchdog may have exited already; a failed send is fine.
            let _ = disarm.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CancelTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
