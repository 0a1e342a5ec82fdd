//! Client-side cancellation.
//!
//! [`CancellationSignal`] is the single source of truth for "has this
//! operation been cancelled". The client owns it and hands the provider only
//! its cross-version view, which can observe but never trigger cancellation.
//!
//! Cancel flows:
//! - explicit: the caller invokes [`CancellationSignal::cancel`]
//! - interrupt: Ctrl-C, see [`crate::interrupt`]
//! - timeout: see [`crate::timeout`]

mod forward;

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use tooling_protocol::{CallbackError, CancellationHandler, CrossVersionCancellationHandle};
use tracing::{debug, warn};

pub use forward::{forward_cancellation, CancelNotifier};

/// Error returned by [`CancellationSignal::cancel`].
#[derive(Debug, thiserror::Error)]
pub enum CancellationError {
    /// A cancellation handler failed. Handlers registered after it were not run.
    #[error("cancellation handler #{index} failed: {source}")]
    CallbackFailed {
        index: usize,
        #[source]
        source: CallbackError,
    },
}

#[derive(Default)]
struct SignalState {
    cancelled: bool,
    handlers: Vec<CancellationHandler>,
    /// Thread running the handlers, while `cancel()` is dispatching.
    dispatching: Option<ThreadId>,
}

/// Thread-safe cancellation flag with handler registration.
///
/// The flag is monotonic: once set it stays set. Every handler runs at most
/// once, including handlers registered after cancellation, which run during
/// registration.
#[derive(Default)]
pub struct CancellationSignal {
    state: Mutex<SignalState>,
    dispatch_done: Condvar,
}

impl CancellationSignal {
    /// Create a signal that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cross-version view of this signal, safe to hand to a provider.
    pub fn cross_version_handle(self: &Arc<Self>) -> Arc<dyn CrossVersionCancellationHandle> {
        Arc::clone(self) as Arc<dyn CrossVersionCancellationHandle>
    }

    /// Whether cancellation has been requested.
    pub fn is_cancellation_requested(&self) -> bool {
        self.lock().cancelled
    }

    /// Always true: this type exists to create cancellable operations.
    pub fn can_be_cancelled(&self) -> bool {
        true
    }

    /// Register `handler` to run on cancellation.
    ///
    /// Returns the cancellation state at the moment of registration. If the
    /// signal is already cancelled the handler runs before this returns. Its
    /// error, if any, is logged: there is no caller waiting on `cancel()` to
    /// report it to.
    pub fn add_callback(&self, handler: CancellationHandler) -> bool {
        {
            let mut state = self.lock();
            if !state.cancelled {
                state.handlers.push(handler);
                return false;
            }
        }

        if let Err(err) = handler() {
            warn!(error = %err, "cancellation handler registered after cancel failed");
        }
        true
    }

    /// Request cancellation. Idempotent.
    ///
    /// The first call sets the flag and runs every registered handler in
    /// registration order. The first handler that fails stops the rest, which
    /// are dropped without running, and its error is returned.
    ///
    /// Later calls return `Ok(())` once the first call has finished running
    /// handlers. A handler that calls `cancel()` on its own thread returns at
    /// once; one that waits on another thread calling `cancel()` deadlocks.
    ///
    /// TODO: decide whether remaining handlers should still run with the
    /// failures aggregated; for now the first failure aborts the rest.
    pub fn cancel(&self) -> Result<(), CancellationError> {
        let current = thread::current().id();
        let handlers = {
            let mut state = self.lock();
            if state.cancelled {
                while state.dispatching.is_some_and(|id| id != current) {
                    state = self.dispatch_done.wait(state).unwrap_or_else(PoisonError::into_inner);
                }
                return Ok(());
            }
            state.cancelled = true;
            state.dispatching = Some(current);
            std::mem::take(&mut state.handlers)
        };
        let _done = DispatchDone(self);

        debug!(handlers = handlers.len(), "cancellation requested");

        // Handlers run outside the lock so they may query the signal or
        // register further handlers without deadlocking.
        for (index, handler) in handlers.into_iter().enumerate() {
            if let Err(source) = handler() {
                warn!(index, error = %source, "cancellation handler failed");
                return Err(CancellationError::CallbackFailed { index, source });
            }
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, SignalState> {
        // Every critical section leaves the state consistent, so a poisoned
        // lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the dispatching marker and wakes waiting `cancel()` callers, also
/// when a handler fails or panics.
struct DispatchDone<'a>(&'a CancellationSignal);

impl Drop for DispatchDone<'_> {
    fn drop(&mut self) {
        self.0.lock().dispatching = None;
        self.0.dispatch_done.notify_all();
    }
}

impl CrossVersionCancellationHandle for CancellationSignal {
    fn can_be_cancelled(&self) -> bool {
        CancellationSignal::can_be_cancelled(self)
    }

    fn is_cancellation_requested(&self) -> bool {
        CancellationSignal::is_cancellation_requested(self)
    }

    fn add_callback(&self, handler: CancellationHandler) -> bool {
        CancellationSignal::add_callback(self, handler)
    }
}

impl fmt::Debug for CancellationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("CancellationSignal")
            .field("cancelled", &state.cancelled)
            .field("pending_handlers", &state.handlers.len())
            .finish()
    }
}
