//! Deployment configuration loading and validation.
//!
//! Per-chain deployment tooling produces one of these files; the engine only
//! consumes it.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CoreError;

/// Full deployment configuration for one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Administrator identity for the ledger and the router.
    pub admin: Address,

    /// Chain settings.
    pub chain: ChainConfig,

    /// Addresses of the engine's own contracts.
    pub contracts: ContractsConfig,

    /// Swap adapter to install on the router, if any.
    #[serde(default)]
    pub adapter: Option<AdapterConfig>,

    /// Tokens accepted at deployment time.
    #[serde(default)]
    pub tokens: Vec<AcceptedTokenConfig>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// EIP-155 chain identifier, bound into every signed permit.
    pub chain_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// Settlement ledger (fixed for the router's lifetime).
    pub ledger: Address,
    /// Payment router.
    pub router: Address,
    /// Shared-allowance contract used when a token lacks permit support.
    pub shared_allowance: Address,
}

/// Swap adapter construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterConfig {
    /// Adapter bound to one immutable exchange address.
    Aggregator {
        address: Address,
        exchange: Address,
        wrapped_native: Address,
    },
    /// Adapter resolving the exchange through an upgradeable directory.
    Settler {
        address: Address,
        directory: Address,
        wrapped_native: Address,
    },
}

impl AdapterConfig {
    /// Address the adapter is deployed at.
    pub fn address(&self) -> Address {
        match self {
            Self::Aggregator { address, .. } | Self::Settler { address, .. } => *address,
        }
    }

    /// Canonical wrapped-native token used for native input.
    pub fn wrapped_native(&self) -> Address {
        match self {
            Self::Aggregator { wrapped_native, .. } | Self::Settler { wrapped_native, .. } => {
                *wrapped_native
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedTokenConfig {
    pub token: Address,
    pub recipient: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl DeploymentConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(contents: &str) -> Result<Self, CoreError> {
        let config: DeploymentConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!(
            path = %path.display(),
            chain_id = config.chain.chain_id,
            tokens = config.tokens.len(),
            "Deployment configuration loaded"
        );
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        tracing::debug!(path = %path.display(), "Deployment configuration saved");
        Ok(())
    }

    /// Reject null addresses and inconsistent contract layouts.
    pub fn validate(&self) -> Result<(), CoreError> {
        non_zero(self.admin, "admin")?;
        non_zero(self.contracts.ledger, "contracts.ledger")?;
        non_zero(self.contracts.router, "contracts.router")?;
        non_zero(self.contracts.shared_allowance, "contracts.shared_allowance")?;

        let contracts = [
            self.contracts.ledger,
            self.contracts.router,
            self.contracts.shared_allowance,
        ];
        if contracts[0] == contracts[1] || contracts[0] == contracts[2] || contracts[1] == contracts[2]
        {
            return Err(CoreError::InvalidConfig(
                "ledger, router and shared allowance must have distinct addresses".into(),
            ));
        }

        if let Some(adapter) = &self.adapter {
            non_zero(adapter.address(), "adapter.address")?;
            non_zero(adapter.wrapped_native(), "adapter.wrapped_native")?;
            match adapter {
                AdapterConfig::Aggregator { exchange, .. } => non_zero(*exchange, "adapter.exchange")?,
                AdapterConfig::Settler { directory, .. } => {
                    non_zero(*directory, "adapter.directory")?
                }
            }
            if contracts.contains(&adapter.address()) {
                return Err(CoreError::InvalidConfig(
                    "adapter address collides with an engine contract".into(),
                ));
            }
        }

        for entry in &self.tokens {
            non_zero(entry.recipient, "tokens.recipient")?;
        }

        Ok(())
    }
}

fn non_zero(address: Address, field: &'static str) -> Result<(), CoreError> {
    if address.is_zero() {
        return Err(CoreError::ZeroAddress(field));
    }
    Ok(())
}
