//! Cross-version model builder contract.

use std::sync::Arc;

use crate::cancellation::CrossVersionCancellationHandle;
use crate::model::{BuildParameters, ModelIdentifier};
use crate::result::ModelResult;

/// Implemented by a provider connection so clients can request models.
///
/// DO NOT CHANGE THIS TRAIT - it is part of the cross-version protocol
/// (`cancellable_model_builder@1`).
///
/// Consumer compatibility: used by every client speaking protocol 1.
/// Provider compatibility: implemented by every provider speaking protocol 1.
pub trait CancellableModelBuilder: Send + Sync {
    /// Builds the requested model, honoring `cancellation`.
    ///
    /// Never panics and never returns a transport-level error: build
    /// failures, unsupported models, unsupported options and a stopped
    /// connection are all reported as [`ModelResult`] variants.
    fn get_model(
        &self,
        model: &ModelIdentifier,
        cancellation: Arc<dyn CrossVersionCancellationHandle>,
        parameters: &BuildParameters,
    ) -> ModelResult;
}
