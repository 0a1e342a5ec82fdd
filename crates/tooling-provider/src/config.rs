//! Provider configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tooling_protocol::{interfaces, ProviderDescriptor, PROTOCOL_MAX, PROTOCOL_MIN, PROVIDER_VERSION};

/// Provider configuration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Minimum supported protocol version.
    pub protocol_min: i32,
    /// Maximum supported protocol version.
    pub protocol_max: i32,
    /// Directory the workspace inventory model walks.
    pub workspace_root: PathBuf,
    /// Built-in models that should not be registered.
    pub disabled_models: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            protocol_min: PROTOCOL_MIN,
            protocol_max: PROTOCOL_MAX,
            workspace_root: PathBuf::from("."),
            disabled_models: Vec::new(),
        }
    }
}

impl ProviderConfig {
    /// Descriptor advertised to clients for version negotiation.
    pub fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            provider_version: PROVIDER_VERSION.to_string(),
            protocol_min: self.protocol_min,
            protocol_max: self.protocol_max,
            interfaces: vec![
                interfaces::CANCELLATION_V1.to_string(),
                interfaces::CANCELLABLE_MODEL_BUILDER_V1.to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol_constants() {
        let config = ProviderConfig::default();
        assert_eq!(config.protocol_min, PROTOCOL_MIN);
        assert_eq!(config.protocol_max, PROTOCOL_MAX);
        assert_eq!(config.workspace_root, PathBuf::from("."));
        assert!(config.disabled_models.is_empty());
    }

    #[test]
    fn test_descriptor_publishes_required_interfaces() {
        let descriptor = ProviderConfig::default().descriptor();
        assert_eq!(descriptor.missing_interface(interfaces::REQUIRED), None);
        assert_eq!(descriptor.provider_version, PROVIDER_VERSION);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ProviderConfig =
            serde_json::from_value(serde_json::json!({ "workspace_root": "/srv/ws" })).unwrap();
        assert_eq!(config.workspace_root, PathBuf::from("/srv/ws"));
        assert_eq!(config.protocol_max, PROTOCOL_MAX);
    }
}
