//! Configuration management for the OasisX tooling.

use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rpc: RpcConfig,
    /// Network name as given to the migration (`development`, `rinkeby`, ...).
    pub network: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub url: String,
    /// Hex private key registered as a local signer, if any.
    pub private_key: Option<String>,
    pub receipt_poll_interval_ms: u64,
    pub receipt_timeout_secs: u64,
}

impl RpcConfig {
    /// Local development node.
    pub const DEFAULT_URL: &'static str = "http://localhost:8545";

    /// Number of receipt polls that fit in the configured timeout.
    pub fn receipt_attempts(&self) -> u32 {
        let interval = self.receipt_poll_interval_ms.max(1);
        let attempts = self.receipt_timeout_secs.saturating_mul(1000) / interval;
        attempts.clamp(1, u32::MAX as u64) as u32
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: Self::DEFAULT_URL.to_string(),
            private_key: None,
            receipt_poll_interval_ms: 500,
            receipt_timeout_secs: 120,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = RpcConfig::default();
        Ok(Self {
            rpc: RpcConfig {
                url: env::var("RPC_URL").unwrap_or(defaults.url),
                private_key: env::var("DEPLOYER_PRIVATE_KEY").ok(),
                receipt_poll_interval_ms: parse_var("RECEIPT_POLL_INTERVAL_MS")?
                    .unwrap_or(defaults.receipt_poll_interval_ms),
                receipt_timeout_secs: parse_var("RECEIPT_TIMEOUT_SECS")?
                    .unwrap_or(defaults.receipt_timeout_secs),
            },
            network: env::var("NETWORK").unwrap_or_else(|_| "development".to_string()),
        })
    }

    /// Load configuration for testing (with defaults).
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            rpc: RpcConfig::default(),
            network: "development".to_string(),
        }
    }
}

fn parse_var(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map(Some).map_err(|_| Error::Config {
            message: format!("{name} must be an unsigned integer, got `{value}`"),
        }),
        Err(_) => Ok(None),
    }
}

/// Target network of a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Devnet,
    Rinkeby,
    Mainnet,
}

impl Network {
    /// `rinkeby` and `mainnet` are recognised; every other name is a devnet.
    pub fn from_name(name: &str) -> Self {
        match name {
            "rinkeby" => Network::Rinkeby,
            "mainnet" => Network::Mainnet,
            _ => Network::Devnet,
        }
    }
}

/// Per-network deployment parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkParameters {
    pub chain_id: u64,
    #[serde(default)]
    pub gas_limit: Option<u64>,
}

/// Migration parameters file: one table per network.
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationParameters {
    pub devnet: NetworkParameters,
    #[serde(default)]
    pub rinkeby: Option<NetworkParameters>,
    #[serde(default)]
    pub mainnet: Option<NetworkParameters>,
}

impl MigrationParameters {
    /// Load from a file whose format follows its extension (TOML, JSON, YAML).
    #[allow(clippy::result_large_err)]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parameters for `network`.
    pub fn for_network(&self, network: Network) -> Result<&NetworkParameters> {
        let (name, params) = match network {
            Network::Devnet => return Ok(&self.devnet),
            Network::Rinkeby => ("rinkeby", self.rinkeby.as_ref()),
            Network::Mainnet => ("mainnet", self.mainnet.as_ref()),
        };

        params.ok_or_else(|| Error::Config {
            message: format!("no migration parameters for network `{name}`"),
        })
    }
}
