//! Tooling Protocol Types
//!
//! The cross-version contract between tooling clients and build providers.
//! Clients and providers are released independently, so everything in this
//! crate that is marked as part of the cross-version protocol is frozen once
//! published: new capabilities arrive as new interfaces, never as changes to
//! existing ones.

pub mod builder;
pub mod cancellation;
pub mod descriptor;
pub mod model;
pub mod result;

pub use builder::CancellableModelBuilder;
pub use cancellation::{CallbackError, CancellationHandler, CrossVersionCancellationHandle, NeverCancelled};
pub use descriptor::{ProviderDescriptor, VersionMismatch};
pub use model::{BuildParameters, ModelIdentifier};
pub use result::{BuildFailure, ModelResult};

/// Minimum protocol version supported by this implementation.
pub const PROTOCOL_MIN: i32 = 1;

/// Maximum protocol version supported by this implementation.
pub const PROTOCOL_MAX: i32 = 1;

/// Current provider version string.
pub const PROVIDER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Published interface names.
///
/// A provider lists the interfaces it implements in its descriptor. Once a
/// name is published its shape never changes.
pub mod interfaces {
    pub const CANCELLATION_V1: &str = "cancellation@1";
    pub const CANCELLABLE_MODEL_BUILDER_V1: &str = "cancellable_model_builder@1";

    /// Interfaces a client requires before it will send model requests.
    pub const REQUIRED: &[&str] = &[CANCELLATION_V1, CANCELLABLE_MODEL_BUILDER_V1];
}
