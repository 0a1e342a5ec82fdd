//! Model result envelope.

use std::error::Error;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a model request. Exactly one variant per response.
///
/// Part of the cross-version protocol: variants may be added in a new
/// protocol version, existing variants and their fields never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ModelResult {
    /// The model was built.
    Success { model: Value },
    /// The producer failed, or stopped because cancellation was requested.
    BuildFailure(BuildFailure),
    /// No registered producer builds the requested model.
    UnsupportedModel { model: String, message: String },
    /// The producer does not understand one of the supplied options.
    UnsupportedArgument { argument: String, message: String },
    /// The provider connection has already been stopped.
    IllegalState { message: String },
}

impl ModelResult {
    /// Create a success result.
    pub fn success(model: Value) -> Self {
        Self::Success { model }
    }

    /// Create an UNSUPPORTED_MODEL result.
    pub fn unsupported_model(model: &str) -> Self {
        Self::UnsupportedModel {
            model: model.to_string(),
            message: format!("no producer is registered for model '{}'", model),
        }
    }

    /// Create an UNSUPPORTED_ARGUMENT result.
    pub fn unsupported_argument(model: &str, argument: &str) -> Self {
        Self::UnsupportedArgument {
            argument: argument.to_string(),
            message: format!("option '{}' is not supported when building '{}'", argument, model),
        }
    }

    /// Create an ILLEGAL_STATE result for a stopped connection.
    pub fn stopped() -> Self {
        Self::IllegalState {
            message: "provider connection has been stopped".to_string(),
        }
    }

    /// Stable machine-readable code for this outcome.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Success { .. } => "OK",
            Self::BuildFailure(_) => "BUILD_FAILED",
            Self::UnsupportedModel { .. } => "UNSUPPORTED_MODEL",
            Self::UnsupportedArgument { .. } => "UNSUPPORTED_ARGUMENT",
            Self::IllegalState { .. } => "ILLEGAL_STATE",
        }
    }

    /// Whether the model was built.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Structured cause of a failed build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildFailure {
    /// Top-level failure message.
    pub message: String,

    /// Messages of the underlying causes, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,

    /// Whether the build stopped because cancellation was requested.
    #[serde(default)]
    pub cancelled: bool,
}

impl BuildFailure {
    /// Create a failure with no recorded causes.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            causes: Vec::new(),
            cancelled: false,
        }
    }

    /// Capture an error and its source chain.
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: error.to_string(),
            causes,
            cancelled: false,
        }
    }

    /// Failure for a build that stopped on cancellation.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self {
            cancelled: true,
            ..Self::new(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("walk failed")]
    struct Outer {
        #[source]
        inner: std::io::Error,
    }

    #[test]
    fn test_codes() {
        assert_eq!(ModelResult::success(json!({})).code(), "OK");
        assert_eq!(ModelResult::unsupported_model("x").code(), "UNSUPPORTED_MODEL");
        assert_eq!(ModelResult::unsupported_argument("x", "y").code(), "UNSUPPORTED_ARGUMENT");
        assert_eq!(ModelResult::stopped().code(), "ILLEGAL_STATE");
        assert_eq!(
            ModelResult::BuildFailure(BuildFailure::new("boom")).code(),
            "BUILD_FAILED"
        );
    }

    #[test]
    fn test_result_serializes_with_outcome_tag() {
        let value = serde_json::to_value(ModelResult::unsupported_model("a.B")).unwrap();
        assert_eq!(value["outcome"], "unsupported_model");
        assert_eq!(value["model"], "a.B");

        let value = serde_json::to_value(ModelResult::BuildFailure(BuildFailure::cancelled("stopped"))).unwrap();
        assert_eq!(value["outcome"], "build_failure");
        assert_eq!(value["cancelled"], true);
    }

    #[test]
    fn test_failure_captures_source_chain() {
        let error = Outer {
            inner: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let failure = BuildFailure::from_error(&error);

        assert_eq!(failure.message, "walk failed");
        assert_eq!(failure.causes, vec!["denied".to_string()]);
        assert!(!failure.cancelled);
    }
}
