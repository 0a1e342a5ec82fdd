//! Link configuration
//!
//! Parses and validates the link configuration file (default
//! `.tooling/link.toml`). Every field has a built-in default, so an empty
//! file and a missing default file both yield a usable configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tooling_protocol::{PROTOCOL_MAX, PROTOCOL_MIN};
use tooling_provider::ProviderConfig;

use crate::timeout::{TimeoutConfig, TimeoutValidationError};

/// Default configuration path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".tooling/link.toml";

/// Schema version understood by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Schema version for forward compatibility
    pub schema_version: u32,

    pub client: ClientConfig,

    pub provider: ProviderConfig,
}

/// Client-side settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Cancel a model request after this many seconds (none: no timeout)
    pub timeout_seconds: Option<u64>,

    /// Lowest protocol version the client will speak
    pub protocol_min: i32,

    /// Highest protocol version the client will speak
    pub protocol_max: i32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            protocol_min: PROTOCOL_MIN,
            protocol_max: PROTOCOL_MAX,
        }
    }
}

impl ClientConfig {
    /// Timeout settings, if a timeout is configured.
    pub fn timeout(&self) -> Option<TimeoutConfig> {
        self.timeout_seconds.map(|overall_seconds| TimeoutConfig { overall_seconds })
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSource {
    /// File path (None for built-in defaults)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of the raw file bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// A validated configuration plus its provenance.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: LinkConfig,
    pub source: ConfigSource,
}

/// Errors that can occur when loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Config file {} is not valid UTF-8: {source}", .path.display())]
    InvalidUtf8 {
        path: PathBuf,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Unsupported schema_version {0}")]
    UnsupportedSchema(u32),

    #[error("[{section}] protocol range is inverted: min {min} > max {max}")]
    InvertedProtocolRange { section: &'static str, min: i32, max: i32 },

    #[error("[client] {0}")]
    Timeout(#[from] TimeoutValidationError),
}

impl LinkConfig {
    /// Load configuration.
    ///
    /// With `Some(path)` the file must exist. With `None` the default path is
    /// used if present, otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !path.exists() {
            if required {
                return Err(ConfigError::NotFound(path));
            }
            return Ok(LoadedConfig {
                config: LinkConfig::builtin(),
                source: ConfigSource {
                    path: None,
                    digest: None,
                },
            });
        }

        let bytes = fs::read(&path)?;
        let content = std::str::from_utf8(&bytes).map_err(|source| ConfigError::InvalidUtf8 {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(content)?;

        Ok(LoadedConfig {
            config,
            source: ConfigSource {
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(hex::encode(Sha256::digest(&bytes))),
            },
        })
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: LinkConfig = toml::from_str(content)?;
        if config.schema_version == 0 {
            config.schema_version = SCHEMA_VERSION;
        }
        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults.
    pub fn builtin() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedSchema(self.schema_version));
        }

        if self.client.protocol_min > self.client.protocol_max {
            return Err(ConfigError::InvertedProtocolRange {
                section: "client",
                min: self.client.protocol_min,
                max: self.client.protocol_max,
            });
        }

        if self.provider.protocol_min > self.provider.protocol_max {
            return Err(ConfigError::InvertedProtocolRange {
                section: "provider",
                min: self.provider.protocol_min,
                max: self.provider.protocol_max,
            });
        }

        if let Some(timeout) = self.client.timeout() {
            timeout.validate()?;
        }

        Ok(())
    }
}
