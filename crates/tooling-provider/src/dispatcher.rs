//! Model request dispatcher.
//!
//! Entry point on the provider side for "give me model X, honoring this
//! cancellation handle". Every producer-level error is converted into a
//! [`ModelResult`] here; nothing a producer does can take the provider down.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tooling_protocol::{
    BuildFailure, BuildParameters, CancellableModelBuilder, CrossVersionCancellationHandle, ModelIdentifier,
    ModelResult, ProviderDescriptor,
};
use tracing::{debug, info, warn};

use crate::adapter::BuildCancellationTokenAdapter;
use crate::config::ProviderConfig;
use crate::producer::{BuildContext, BuildError};
use crate::registry::ProducerRegistry;

/// Resolves model requests to registered producers.
#[derive(Debug)]
pub struct ModelRequestDispatcher {
    registry: ProducerRegistry,
    descriptor: ProviderDescriptor,
    stopped: AtomicBool,
}

impl ModelRequestDispatcher {
    /// Create a dispatcher over an explicit registry.
    pub fn new(registry: ProducerRegistry, config: &ProviderConfig) -> Self {
        Self {
            registry,
            descriptor: config.descriptor(),
            stopped: AtomicBool::new(false),
        }
    }

    /// Create a dispatcher with the built-in producers.
    pub fn with_builtin(config: &ProviderConfig) -> Self {
        Self::new(ProducerRegistry::builtin(config), config)
    }

    /// Descriptor advertised to clients.
    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    /// The producers this dispatcher resolves against.
    pub fn registry(&self) -> &ProducerRegistry {
        &self.registry
    }

    /// Stop the connection. Later requests fail with ILLEGAL_STATE.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            info!("provider connection stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl ModelRequestDispatcher {
    /// Resolve, check options and build. Runs inside the unwind guard, so
    /// every call into producer code is covered.
    fn dispatch(
        &self,
        model: &ModelIdentifier,
        cancellation: Arc<dyn CrossVersionCancellationHandle>,
        parameters: &BuildParameters,
    ) -> ModelResult {
        let Some(producer) = self.registry.resolve(model.name()) else {
            debug!(model = %model, "no producer registered");
            return ModelResult::unsupported_model(model.name());
        };

        if let Some(option) = parameters
            .option_names()
            .into_iter()
            .find(|name| !producer.accepts_option(name))
        {
            debug!(model = %model, option, "unsupported option");
            return ModelResult::unsupported_argument(model.name(), option);
        }

        let token = BuildCancellationTokenAdapter::new(cancellation);
        let context = BuildContext::new(&token, parameters);

        debug!(model = %model, "dispatching to producer");
        match producer.build(model, &context) {
            Ok(value) => ModelResult::success(value),
            Err(BuildError::Cancelled) => {
                info!(model = %model, "build cancelled");
                ModelResult::BuildFailure(BuildFailure::cancelled(format!("build of '{}' was cancelled", model)))
            }
            Err(err) => {
                warn!(model = %model, error = %err, "build failed");
                ModelResult::BuildFailure(BuildFailure::from_error(&err))
            }
        }
    }
}

impl CancellableModelBuilder for ModelRequestDispatcher {
    fn get_model(
        &self,
        model: &ModelIdentifier,
        cancellation: Arc<dyn CrossVersionCancellationHandle>,
        parameters: &BuildParameters,
    ) -> ModelResult {
        if self.is_stopped() {
            debug!(model = %model, "rejecting request on stopped connection");
            return ModelResult::stopped();
        }

        match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(model, cancellation, parameters))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(model = %model, panic = %message, "producer panicked");
                ModelResult::BuildFailure(BuildFailure {
                    message: format!("producer for '{}' panicked", model),
                    causes: vec![message],
                    cancelled: false,
                })
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
