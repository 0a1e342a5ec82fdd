//! Model producer contract.

use std::error::Error;

use serde_json::Value;
use tooling_protocol::{BuildParameters, ModelIdentifier};

use crate::token::BuildCancellationToken;

/// Errors a producer can raise while building a model.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build cancelled")]
    Cancelled,

    #[error("unexpected request to build model '{0}'")]
    UnexpectedModel(String),

    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },
}

impl BuildError {
    /// A failure with no underlying cause.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }

    /// A failure caused by another error.
    pub fn caused_by(message: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        Self::Failed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// What a producer gets to work with while building.
pub struct BuildContext<'a> {
    cancellation: &'a dyn BuildCancellationToken,
    parameters: &'a BuildParameters,
}

impl<'a> BuildContext<'a> {
    pub fn new(cancellation: &'a dyn BuildCancellationToken, parameters: &'a BuildParameters) -> Self {
        Self {
            cancellation,
            parameters,
        }
    }

    /// The client's cancellation, seen through the provider-local token.
    pub fn cancellation(&self) -> &dyn BuildCancellationToken {
        self.cancellation
    }

    /// The parameters the client sent.
    pub fn parameters(&self) -> &BuildParameters {
        self.parameters
    }
}

/// Builds one or more kinds of model.
///
/// Producers are responsible for their own cancellation checks: poll
/// [`BuildContext::cancellation`] or register a callback on it, and return
/// [`BuildError::Cancelled`] to unwind.
pub trait ModelProducer: Send + Sync {
    /// Whether this producer builds the named model.
    fn matches(&self, model: &str) -> bool;

    /// Model names this producer advertises, for diagnostics.
    fn models(&self) -> Vec<String>;

    /// Whether this producer understands the named option.
    fn accepts_option(&self, _name: &str) -> bool {
        false
    }

    /// Build the model.
    fn build(&self, model: &ModelIdentifier, context: &BuildContext<'_>) -> Result<Value, BuildError>;
}
