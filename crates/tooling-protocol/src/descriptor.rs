//! Provider descriptor used for version negotiation.

use serde::{Deserialize, Serialize};

/// What a provider speaks: protocol range and published interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Provider software version.
    pub provider_version: String,
    /// Minimum supported protocol version.
    pub protocol_min: i32,
    /// Maximum supported protocol version.
    pub protocol_max: i32,
    /// Published interface names this provider implements.
    pub interfaces: Vec<String>,
}

/// No protocol version is supported by both sides.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "no common protocol version: client [{client_min}, {client_max}] vs provider [{provider_min}, {provider_max}]"
)]
pub struct VersionMismatch {
    pub client_min: i32,
    pub client_max: i32,
    pub provider_min: i32,
    pub provider_max: i32,
}

impl ProviderDescriptor {
    /// Whether the provider implements the named interface.
    pub fn supports(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface)
    }

    /// The first of `required` that this provider does not implement.
    pub fn missing_interface<'a>(&self, required: &[&'a str]) -> Option<&'a str> {
        required.iter().copied().find(|i| !self.supports(i))
    }

    /// Select the highest protocol version both sides support.
    pub fn negotiate(&self, client_min: i32, client_max: i32) -> Result<i32, VersionMismatch> {
        let low = client_min.max(self.protocol_min);
        let high = client_max.min(self.protocol_max);
        if low > high {
            return Err(VersionMismatch {
                client_min,
                client_max,
                provider_min: self.protocol_min,
                provider_max: self.protocol_max,
            });
        }
        Ok(high)
    }
}
