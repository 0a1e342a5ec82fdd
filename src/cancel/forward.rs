//! Forwarding client-side cancellation to a remote provider.
//!
//! When the provider runs in another process, the transport owns a live
//! channel back to it. Registering a forwarding handler on the signal makes a
//! local `cancel()` reach the provider.

use std::sync::Arc;

use tooling_protocol::CallbackError;
use tracing::debug;

use super::CancellationSignal;

/// Transport-side hook that tells the provider a request was cancelled.
pub trait CancelNotifier: Send + Sync {
    fn notify_cancel(&self, request_id: &str) -> Result<(), CallbackError>;
}

/// Register a handler on `signal` that notifies the provider when the
/// request identified by `request_id` is cancelled.
///
/// Returns `true` if cancellation had already been requested, in which case
/// the provider has already been notified.
pub fn forward_cancellation(
    signal: &CancellationSignal,
    request_id: &str,
    notifier: Arc<dyn CancelNotifier>,
) -> bool {
    let request_id = request_id.to_string();
    signal.add_callback(Box::new(move || {
        debug!(request_id = %request_id, "forwarding cancellation to provider");
        notifier.notify_cancel(&request_id)
    }))
}
