//! tooling-link - cancellable model requests between tooling clients and
//! build providers
//!
//! The client owns a [`CancellationSignal`] per request and passes its
//! cross-version view to the provider. The provider side lives in
//! `tooling-provider`; the frozen contract between the two in
//! `tooling-protocol`.

pub mod cancel;
pub mod config;
pub mod connection;
pub mod interrupt;
pub mod request;
pub mod timeout;

pub use cancel::{forward_cancellation, CancelNotifier, CancellationError, CancellationSignal};
pub use config::{ClientConfig, ConfigError, ConfigSource, LinkConfig, LoadedConfig};
pub use connection::{into_model, ConnectError, ExitKind, ModelError, ProviderConnection};
pub use interrupt::{InterruptState, SignalAction};
pub use request::ModelRequest;
pub use timeout::{CancelTimer, TimeoutConfig, TimeoutValidationError};
