//! Adapter from the cross-version handle to the provider's local token.

use std::fmt;
use std::sync::Arc;

use tooling_protocol::{CancellationHandler, CrossVersionCancellationHandle};

use crate::token::BuildCancellationToken;

/// Exposes a received [`CrossVersionCancellationHandle`] as a
/// [`BuildCancellationToken`].
///
/// Pure forwarding: no state of its own. One adapter is built per inbound
/// request and dropped when the request completes.
pub struct BuildCancellationTokenAdapter {
    handle: Arc<dyn CrossVersionCancellationHandle>,
}

impl BuildCancellationTokenAdapter {
    pub fn new(handle: Arc<dyn CrossVersionCancellationHandle>) -> Self {
        Self { handle }
    }
}

impl BuildCancellationToken for BuildCancellationTokenAdapter {
    fn can_be_cancelled(&self) -> bool {
        self.handle.can_be_cancelled()
    }

    fn is_cancellation_requested(&self) -> bool {
        self.handle.is_cancellation_requested()
    }

    fn add_callback(&self, handler: CancellationHandler) -> bool {
        self.handle.add_callback(handler)
    }
}

impl fmt::Debug for BuildCancellationTokenAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildCancellationTokenAdapter")
            .field("cancellation_requested", &self.handle.is_cancellation_requested())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tooling_protocol::NeverCancelled;

    /// Records every call so delegation can be checked one-to-one.
    #[derive(Default)]
    struct RecordingHandle {
        requested: AtomicBool,
        registered: AtomicUsize,
        handlers: Mutex<Vec<CancellationHandler>>,
    }

    impl CrossVersionCancellationHandle for RecordingHandle {
        fn can_be_cancelled(&self) -> bool {
            true
        }

        fn is_cancellation_requested(&self) -> bool {
            self.requested.load(Ordering::SeqCst)
        }

        fn add_callback(&self, handler: CancellationHandler) -> bool {
            self.registered.fetch_add(1, Ordering::SeqCst);
            self.handlers.lock().unwrap().push(handler);
            self.requested.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_forwards_state() {
        let handle = Arc::new(RecordingHandle::default());
        let adapter = BuildCancellationTokenAdapter::new(handle.clone());

        assert!(adapter.can_be_cancelled());
        assert!(!adapter.is_cancellation_requested());

        handle.requested.store(true, Ordering::SeqCst);
        assert!(adapter.is_cancellation_requested());
        assert!(matches!(adapter.ensure_not_cancelled(), Err(crate::BuildError::Cancelled)));
    }

    #[test]
    fn test_forwards_callback_registration() {
        let handle = Arc::new(RecordingHandle::default());
        let adapter = BuildCancellationTokenAdapter::new(handle.clone());

        let already = adapter.add_callback(Box::new(|| Ok(())));

        assert!(!already);
        assert_eq!(handle.registered.load(Ordering::SeqCst), 1);
        assert_eq!(handle.handlers.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_forwards_not_cancellable() {
        let adapter = BuildCancellationTokenAdapter::new(Arc::new(NeverCancelled));
        assert!(!adapter.can_be_cancelled());
        assert!(adapter.ensure_not_cancelled().is_ok());
    }
}
