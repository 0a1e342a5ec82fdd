//! Model requests as the client sends them.

use std::fmt;
use std::sync::Arc;

use tooling_protocol::{
    BuildParameters, CancellableModelBuilder, CrossVersionCancellationHandle, ModelIdentifier, ModelResult,
};
use tracing::debug;

/// One model request: identifier, parameters and exactly one cancellation
/// handle.
pub struct ModelRequest {
    /// Caller-chosen ID for correlation, unique per request.
    pub request_id: String,
    pub model: ModelIdentifier,
    pub parameters: BuildParameters,
    cancellation: Arc<dyn CrossVersionCancellationHandle>,
}

impl ModelRequest {
    /// Create a request with a fresh request ID.
    pub fn new(
        model: ModelIdentifier,
        cancellation: Arc<dyn CrossVersionCancellationHandle>,
        parameters: BuildParameters,
    ) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            model,
            parameters,
            cancellation,
        }
    }

    /// The cancellation handle travelling with this request.
    pub fn cancellation(&self) -> &Arc<dyn CrossVersionCancellationHandle> {
        &self.cancellation
    }

    /// Send the request to a provider and wait for its result.
    pub fn send(&self, provider: &dyn CancellableModelBuilder) -> ModelResult {
        debug!(request_id = %self.request_id, model = %self.model, "sending model request");
        let result = provider.get_model(&self.model, Arc::clone(&self.cancellation), &self.parameters);
        debug!(request_id = %self.request_id, outcome = result.code(), "model request finished");
        result
    }
}

impl fmt::Debug for ModelRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRequest")
            .field("request_id", &self.request_id)
            .field("model", &self.model)
            .field("parameters", &self.parameters)
            .field("cancellation_requested", &self.cancellation.is_cancellation_requested())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tooling_protocol::NeverCancelled;

    struct Fixed;

    impl CancellableModelBuilder for Fixed {
        fn get_model(
            &self,
            model: &ModelIdentifier,
            cancellation: Arc<dyn CrossVersionCancellationHandle>,
            _parameters: &BuildParameters,
        ) -> ModelResult {
            ModelResult::success(json!({
                "model": model.name(),
                "cancellable": cancellation.can_be_cancelled(),
            }))
        }
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = ModelRequest::new(ModelIdentifier::new("a"), Arc::new(NeverCancelled), BuildParameters::new());
        let b = ModelRequest::new(ModelIdentifier::new("a"), Arc::new(NeverCancelled), BuildParameters::new());
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_send_passes_handle() {
        let request = ModelRequest::new(ModelIdentifier::new("a.B"), Arc::new(NeverCancelled), BuildParameters::new());
        let result = request.send(&Fixed);
        assert_eq!(result, ModelResult::success(json!({ "model": "a.B", "cancellable": false })));
    }
}
