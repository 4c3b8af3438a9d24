//! Session configuration with TOML file support.

use std::path::Path;

use fairchain_vrf::{OutcomeConfig, OutcomeDeriver};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::message::MessageConfig;

/// Configuration for a fairchain session.
///
/// Can be loaded from a TOML file via [`ProtocolConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Number of seeds generated per chain.
    #[serde(default = "default_chain_length")]
    pub chain_length: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Round message shape sent to the signer.
    #[serde(default)]
    pub message: MessageConfig,

    /// Signature → multiplier derivation.
    #[serde(default)]
    pub outcome: OutcomeConfig,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_chain_length() -> usize {
    10
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ProtocolConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ProtocolError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ProtocolError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ProtocolError> {
        toml::from_str(s).map_err(|e| ProtocolError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("ProtocolConfig is always serializable to TOML")
    }

    /// Reject settings no session could run with.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let needed = self.outcome.derivation.seeds_per_round();
        if self.chain_length < needed {
            return Err(ProtocolError::Config(format!(
                "chain_length {} is too short, {:?} derivation needs at least {needed}",
                self.chain_length, self.outcome.derivation
            )));
        }
        self.message.validate()?;
        OutcomeDeriver::new(self.outcome.clone())
            .map_err(|e| ProtocolError::Config(e.to_string()))?;
        Ok(())
    }

    /// Rounds a full chain of this length yields.
    pub fn rounds_per_chain(&self) -> usize {
        (self.chain_length + 1).saturating_sub(self.outcome.derivation.seeds_per_round())
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            chain_length: default_chain_length(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            message: MessageConfig::default(),
            outcome: OutcomeConfig::default(),
        }
    }
}
