//! Provider-local cancellation interface.
//!
//! Unlike the cross-version handle, this trait belongs to the provider and
//! may grow as the provider's execution code needs.

use tooling_protocol::CancellationHandler;

use crate::producer::BuildError;

/// Cancellation token as seen by provider-side execution code.
pub trait BuildCancellationToken: Send + Sync {
    /// Whether the running operation can be cancelled at all.
    fn can_be_cancelled(&self) -> bool;

    /// Whether cancellation has been requested.
    fn is_cancellation_requested(&self) -> bool;

    /// Registers a handler to run on cancellation.
    ///
    /// Returns `true` if cancellation was already requested, in which case
    /// the handler has already run.
    fn add_callback(&self, handler: CancellationHandler) -> bool;

    /// Returns [`BuildError::Cancelled`] once cancellation has been requested.
    ///
    /// Long-running producers call this between units of work.
    fn ensure_not_cancelled(&self) -> Result<(), BuildError> {
        if self.is_cancellation_requested() {
            Err(BuildError::Cancelled)
        } else {
            Ok(())
        }
    }
}
