//! Configuration types for the luck consensus core
//!
//! The host process owns configuration loading; this module only describes
//! the shape, the defaults, and two convenience loaders (environment and
//! TOML text).

use serde::Deserialize;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default commit deadline in milliseconds
pub const DEFAULT_COMMIT_TIMEOUT_MS: u64 = 3_000;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// TOML text could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A required value is missing or empty
    #[error("Missing config value: {0}")]
    Missing(&'static str),

    /// A value is present but unusable
    #[error("Invalid config value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Runtime configuration for a luck consensus node
///
/// ```toml
/// peer_id = "QmNodeA"
/// commit_timeout_ms = 3000
///
/// [block]
/// type = "luckyblock"
/// name = "luckyblock"
/// namespace = "blocktop"
/// version = "v1"
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LuckyBlockConfig {
    /// This node's peer identity, stamped on every block it proposes
    pub peer_id: String,

    /// Block type identity, constant per node build
    pub block: BlockTypeConfig,

    /// Deadline for a single commit-family operation
    pub commit_timeout_ms: u64,
}

impl Default for LuckyBlockConfig {
    fn default() -> Self {
        Self {
            peer_id: String::new(),
            block: BlockTypeConfig::default(),
            commit_timeout_ms: DEFAULT_COMMIT_TIMEOUT_MS,
        }
    }
}

/// Block type name, namespace and version
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BlockTypeConfig {
    /// Key under which the host registers this generator
    #[serde(rename = "type")]
    pub block_type: String,
    /// Block resource name carried in every block
    pub name: String,
    /// Block resource namespace
    pub namespace: String,
    /// Block format version
    pub version: String,
}

impl Default for BlockTypeConfig {
    fn default() -> Self {
        Self {
            block_type: "luckyblock".to_string(),
            name: "luckyblock".to_string(),
            namespace: "blocktop".to_string(),
            version: "v1".to_string(),
        }
    }
}

impl LuckyBlockConfig {
    /// Create a default configuration for the given peer
    pub fn for_peer(peer_id: impl Into<String>) -> Self {
        Self {
            peer_id: peer_id.into(),
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LUCKYBLOCK_PEER_ID`: Peer identity (default: empty)
    /// - `LUCKYBLOCK_BLOCK_TYPE`: Generator type key (default: luckyblock)
    /// - `LUCKYBLOCK_BLOCK_NAME`: Block name (default: luckyblock)
    /// - `LUCKYBLOCK_BLOCK_NAMESPACE`: Block namespace (default: blocktop)
    /// - `LUCKYBLOCK_BLOCK_VERSION`: Block version (default: v1)
    /// - `LUCKYBLOCK_COMMIT_TIMEOUT_MS`: Commit deadline (default: 3000)
    pub fn from_env() -> Self {
        let defaults = BlockTypeConfig::default();

        Self {
            peer_id: env::var("LUCKYBLOCK_PEER_ID").unwrap_or_default(),
            block: BlockTypeConfig {
                block_type: env::var("LUCKYBLOCK_BLOCK_TYPE").unwrap_or(defaults.block_type),
                name: env::var("LUCKYBLOCK_BLOCK_NAME").unwrap_or(defaults.name),
                namespace: env::var("LUCKYBLOCK_BLOCK_NAMESPACE").unwrap_or(defaults.namespace),
                version: env::var("LUCKYBLOCK_BLOCK_VERSION").unwrap_or(defaults.version),
            },
            commit_timeout_ms: env::var("LUCKYBLOCK_COMMIT_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_COMMIT_TIMEOUT_MS),
        }
    }

    /// Parse configuration from a TOML string and validate it.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations a node cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peer_id.trim().is_empty() {
            return Err(ConfigError::Missing("peer_id"));
        }
        if self.block.block_type.trim().is_empty() {
            return Err(ConfigError::Missing("block.type"));
        }
        if self.commit_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "commit_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Commit deadline as a duration
    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }
}
