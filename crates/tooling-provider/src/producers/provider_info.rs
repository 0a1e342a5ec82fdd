//! Provider information model.
//!
//! Describes the provider itself: version, protocol range, published
//! interfaces and the host it runs on.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tooling_protocol::{ModelIdentifier, ProviderDescriptor};

use crate::config::ProviderConfig;
use crate::producer::{BuildContext, BuildError, ModelProducer};

/// Model name served by [`ProviderInfoProducer`].
pub const PROVIDER_INFO_MODEL: &str = "tooling.model.ProviderInfo";

#[derive(Debug, Serialize)]
struct ProviderInfo<'a> {
    schema_version: u32,
    created_at: chrono::DateTime<Utc>,
    #[serde(flatten)]
    descriptor: &'a ProviderDescriptor,
    os: &'static str,
    arch: &'static str,
}

/// Produces the provider information model.
#[derive(Debug, Clone)]
pub struct ProviderInfoProducer {
    descriptor: ProviderDescriptor,
}

impl ProviderInfoProducer {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            descriptor: config.descriptor(),
        }
    }
}

impl ModelProducer for ProviderInfoProducer {
    fn matches(&self, model: &str) -> bool {
        model == PROVIDER_INFO_MODEL
    }

    fn models(&self) -> Vec<String> {
        vec![PROVIDER_INFO_MODEL.to_string()]
    }

    fn build(&self, model: &ModelIdentifier, _context: &BuildContext<'_>) -> Result<Value, BuildError> {
        if !self.matches(model.name()) {
            return Err(BuildError::UnexpectedModel(model.name().to_string()));
        }

        let info = ProviderInfo {
            schema_version: 1,
            created_at: Utc::now(),
            descriptor: &self.descriptor,
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        };

        serde_json::to_value(info).map_err(|e| BuildError::caused_by("failed to serialize provider info", e))
    }
}
