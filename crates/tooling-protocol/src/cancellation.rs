//! Cross-version cancellation contract.

use std::error::Error;

/// Error raised by a cancellation handler.
pub type CallbackError = Box<dyn Error + Send + Sync>;

/// A handler run when cancellation is requested.
///
/// Handlers are `FnOnce`: a handler runs at most once.
pub type CancellationHandler = Box<dyn FnOnce() -> Result<(), CallbackError> + Send>;

/// The cancellation view that crosses the client/provider boundary.
///
/// DO NOT CHANGE THIS TRAIT - it is part of the cross-version protocol
/// (`cancellation@1`). Adding, removing or re-typing an operation breaks every
/// provider built against an older client and every client talking to an
/// older provider. A new capability gets a new trait and a new interface name
/// in [`crate::interfaces`], which the other side detects through the
/// provider descriptor.
///
/// Consumer compatibility: used by every client speaking protocol 1.
/// Provider compatibility: accepted by every provider speaking protocol 1.
///
/// The handle is observe-only. Only the client that owns the underlying
/// signal can request cancellation.
pub trait CrossVersionCancellationHandle: Send + Sync {
    /// Whether the operation this handle accompanies can be cancelled at all.
    fn can_be_cancelled(&self) -> bool;

    /// Whether cancellation has been requested.
    fn is_cancellation_requested(&self) -> bool;

    /// Registers a handler to run when cancellation is requested.
    ///
    /// Returns the cancellation state at the moment of registration. When it
    /// returns `true` the handler has already run.
    fn add_callback(&self, handler: CancellationHandler) -> bool;
}

/// Handle for an operation that structurally cannot be cancelled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancelled;

impl CrossVersionCancellationHandle for NeverCancelled {
    fn can_be_cancelled(&self) -> bool {
        false
    }

    fn is_cancellation_requested(&self) -> bool {
        false
    }

    fn add_callback(&self, _handler: CancellationHandler) -> bool {
        // Cancellation never happens, so the handler would never run.
        false
    }
}
