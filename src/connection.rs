//! Client-side provider connection.
//!
//! Negotiates a protocol version with the provider, sends model requests and
//! maps each [`ModelResult`] onto a typed client error.

use std::sync::Arc;

use serde_json::Value;
use tooling_protocol::{
    interfaces, BuildFailure, BuildParameters, CancellableModelBuilder, ModelIdentifier, ModelResult,
    ProviderDescriptor, VersionMismatch,
};
use tracing::{debug, info};

use crate::cancel::{forward_cancellation, CancelNotifier, CancellationSignal};
use crate::config::ClientConfig;
use crate::request::ModelRequest;

/// Errors establishing a provider connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    VersionMismatch(#[from] VersionMismatch),

    #[error("provider {provider_version} does not implement interface '{interface}'")]
    MissingInterface {
        provider_version: String,
        interface: String,
    },
}

/// Errors returned for a model request.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("build failed: {}", .0.message)]
    BuildFailed(BuildFailure),

    #[error("build cancelled: {}", .0.message)]
    Cancelled(BuildFailure),

    #[error("unsupported model '{model}': {message}")]
    UnsupportedModel { model: String, message: String },

    #[error("unsupported argument '{argument}': {message}")]
    UnsupportedArgument { argument: String, message: String },

    #[error("illegal state: {0}")]
    IllegalState(String),
}

/// Process exit codes for model request outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Success = 0,
    BuildFailed = 1,
    Unsupported = 2,
    IllegalState = 3,
    Cancelled = 80,
}

impl ExitKind {
    /// Process exit code.
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl ModelError {
    /// Map to an exit code kind.
    pub fn exit_kind(&self) -> ExitKind {
        match self {
            ModelError::BuildFailed(_) => ExitKind::BuildFailed,
            ModelError::Cancelled(_) => ExitKind::Cancelled,
            ModelError::UnsupportedModel { .. } | ModelError::UnsupportedArgument { .. } => ExitKind::Unsupported,
            ModelError::IllegalState(_) => ExitKind::IllegalState,
        }
    }
}

/// Convert a provider result into the client's error type.
pub fn into_model(result: ModelResult) -> Result<Value, ModelError> {
    match result {
        ModelResult::Success { model } => Ok(model),
        ModelResult::BuildFailure(failure) if failure.cancelled => Err(ModelError::Cancelled(failure)),
        ModelResult::BuildFailure(failure) => Err(ModelError::BuildFailed(failure)),
        ModelResult::UnsupportedModel { model, message } => Err(ModelError::UnsupportedModel { model, message }),
        ModelResult::UnsupportedArgument { argument, message } => {
            Err(ModelError::UnsupportedArgument { argument, message })
        }
        ModelResult::IllegalState { message } => Err(ModelError::IllegalState(message)),
    }
}

/// A negotiated connection to a model provider.
pub struct ProviderConnection {
    provider: Arc<dyn CancellableModelBuilder>,
    descriptor: ProviderDescriptor,
    protocol_version: i32,
    notifier: Option<Arc<dyn CancelNotifier>>,
}

impl ProviderConnection {
    /// Check the provider speaks a common protocol version and implements
    /// every interface the client needs.
    pub fn connect(
        provider: Arc<dyn CancellableModelBuilder>,
        descriptor: ProviderDescriptor,
        config: &ClientConfig,
    ) -> Result<Self, ConnectError> {
        let protocol_version = descriptor.negotiate(config.protocol_min, config.protocol_max)?;

        if let Some(interface) = descriptor.missing_interface(interfaces::REQUIRED) {
            return Err(ConnectError::MissingInterface {
                provider_version: descriptor.provider_version.clone(),
                interface: interface.to_string(),
            });
        }

        info!(
            provider_version = %descriptor.provider_version,
            protocol_version,
            "connected to provider"
        );

        Ok(Self {
            provider,
            descriptor,
            protocol_version,
            notifier: None,
        })
    }

    /// Forward each request's cancellation to the provider through
    /// `notifier`, keyed by request ID.
    pub fn with_notifier(mut self, notifier: Arc<dyn CancelNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The negotiated protocol version.
    pub fn protocol_version(&self) -> i32 {
        self.protocol_version
    }

    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    /// Request a model, cancellable through `signal`.
    ///
    /// With a notifier configured, cancelling `signal` also notifies the
    /// provider, immediately if it is already cancelled.
    pub fn get_model(
        &self,
        model: ModelIdentifier,
        signal: &Arc<CancellationSignal>,
        parameters: BuildParameters,
    ) -> Result<Value, ModelError> {
        let request = ModelRequest::new(model, signal.cross_version_handle(), parameters);
        if let Some(notifier) = &self.notifier {
            if forward_cancellation(signal, &request.request_id, Arc::clone(notifier)) {
                debug!(request_id = %request.request_id, "request cancelled before it was sent");
            }
        }
        into_model(self.send(&request))
    }

    /// Send a prepared request.
    pub fn send(&self, request: &ModelRequest) -> ModelResult {
        let result = request.send(self.provider.as_ref());
        if !result.is_success() {
            debug!(request_id = %request.request_id, outcome = result.code(), "model request did not succeed");
        }
        result
    }
}
