//! Stellar network configuration.

use std::env;

use client_blockchain_core::BlockchainConfig;
use strum::{Display, EnumString};

/// Stellar network types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StellarNetwork {
    Testnet,
    Futurenet,
    Mainnet,
    /// Local quickstart container
    Local,
}

impl StellarNetwork {
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            StellarNetwork::Testnet => "https://soroban-testnet.stellar.org",
            StellarNetwork::Futurenet => "https://rpc-futurenet.stellar.org",
            StellarNetwork::Mainnet => "https://soroban-rpc.mainnet.stellar.gateway.fm",
            StellarNetwork::Local => "http://localhost:8000/soroban/rpc",
        }
    }

    pub fn default_horizon_url(&self) -> &'static str {
        match self {
            StellarNetwork::Testnet => "https://horizon-testnet.stellar.org",
            StellarNetwork::Futurenet => "https://horizon-futurenet.stellar.org",
            StellarNetwork::Mainnet => "https://horizon.stellar.org",
            StellarNetwork::Local => "http://localhost:8000",
        }
    }

    pub fn passphrase(&self) -> &'static str {
        match self {
            StellarNetwork::Testnet => "Test SDF Network ; September 2015",
            StellarNetwork::Futurenet => "Test SDF Future Network ; October 2022",
            StellarNetwork::Mainnet => "Public Global Stellar Network ; September 2015",
            StellarNetwork::Local => "Standalone Network ; February 2017",
        }
    }

    /// Mainnet has no faucet.
    pub fn default_friendbot_url(&self) -> Option<&'static str> {
        match self {
            StellarNetwork::Testnet => Some("https://friendbot.stellar.org"),
            StellarNetwork::Futurenet => Some("https://friendbot-futurenet.stellar.org"),
            StellarNetwork::Mainnet => None,
            StellarNetwork::Local => Some("http://localhost:8000/friendbot"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid STELLAR_NETWORK: {0}. Must be testnet, futurenet, mainnet, or local")]
    InvalidNetwork(String),
}

/// Stellar-specific configuration.
#[derive(Debug, Clone)]
pub struct StellarConfig {
    pub network: StellarNetwork,

    /// Soroban RPC endpoint (overrides network default)
    pub rpc_url: Option<String>,

    /// Horizon endpoint (overrides network default)
    pub horizon_url: Option<String>,

    /// Network passphrase (overrides network default)
    pub network_passphrase: Option<String>,

    /// Friendbot endpoint (overrides network default)
    pub friendbot_url: Option<String>,

    /// Contract id of the deployed game contract
    pub game_contract_id: Option<String>,
}

impl StellarConfig {
    pub fn new(network: StellarNetwork) -> Self {
        Self {
            network,
            rpc_url: None,
            horizon_url: None,
            network_passphrase: None,
            friendbot_url: None,
            game_contract_id: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `STELLAR_NETWORK` - testnet, futurenet, mainnet, local (default: testnet)
    /// - `STELLAR_RPC_URL` - Custom Soroban RPC endpoint
    /// - `STELLAR_HORIZON_URL` - Custom Horizon endpoint
    /// - `STELLAR_NETWORK_PASSPHRASE` - Custom network passphrase
    /// - `STELLAR_FRIENDBOT_URL` - Custom Friendbot endpoint
    /// - `CF_GAME_CONTRACT_ID` - Deployed game contract id
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = env::var("STELLAR_NETWORK").unwrap_or_else(|_| "testnet".to_string());
        let network = raw
            .trim()
            .parse::<StellarNetwork>()
            .map_err(|_| ConfigError::InvalidNetwork(raw.clone()))?;

        Ok(Self {
            network,
            rpc_url: read_var("STELLAR_RPC_URL"),
            horizon_url: read_var("STELLAR_HORIZON_URL"),
            network_passphrase: read_var("STELLAR_NETWORK_PASSPHRASE"),
            friendbot_url: read_var("STELLAR_FRIENDBOT_URL"),
            game_contract_id: read_var("CF_GAME_CONTRACT_ID"),
        })
    }

    pub fn with_horizon_url(mut self, url: impl Into<String>) -> Self {
        self.horizon_url = Some(url.into());
        self
    }

    pub fn with_friendbot_url(mut self, url: impl Into<String>) -> Self {
        self.friendbot_url = Some(url.into());
        self
    }

    pub fn with_game_contract_id(mut self, id: impl Into<String>) -> Self {
        self.game_contract_id = Some(id.into());
        self
    }

    pub fn get_rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_rpc_url())
    }

    /// Horizon URL without trailing slashes.
    pub fn get_horizon_url(&self) -> &str {
        self.horizon_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_horizon_url())
            .trim_end_matches('/')
    }

    pub fn get_network_passphrase(&self) -> &str {
        self.network_passphrase
            .as_deref()
            .unwrap_or_else(|| self.network.passphrase())
    }

    pub fn get_friendbot_url(&self) -> Option<&str> {
        self.friendbot_url
            .as_deref()
            .or_else(|| self.network.default_friendbot_url())
    }
}

fn read_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn check_url(label: &str, url: &str) -> Result<(), String> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(format!("Invalid {label} URL format: {url}"))
    }
}

impl BlockchainConfig for StellarConfig {
    fn network_name(&self) -> &str {
        match self.network {
            StellarNetwork::Testnet => "stellar-testnet",
            StellarNetwork::Futurenet => "stellar-futurenet",
            StellarNetwork::Mainnet => "stellar-mainnet",
            StellarNetwork::Local => "stellar-local",
        }
    }

    fn rpc_url(&self) -> &str {
        self.get_rpc_url()
    }

    fn validate(&self) -> Result<(), String> {
        check_url("RPC", self.get_rpc_url())?;
        check_url("Horizon", self.get_horizon_url())?;
        if let Some(friendbot) = self.get_friendbot_url() {
            check_url("Friendbot", friendbot)?;
        }
        if self.get_network_passphrase().is_empty() {
            return Err("Network passphrase cannot be empty".to_string());
        }

        // Contract id is optional (may not be deployed yet)
        if let Some(id) = &self.game_contract_id {
            let valid = id.len() == 56
                && id.starts_with('C')
                && id
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c));
            if !valid {
                return Err(format!("Invalid game contract id: {id}"));
            }
        }
        Ok(())
    }
}

impl Default for StellarConfig {
    fn default() -> Self {
        Self::new(StellarNetwork::Testnet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testnet_defaults() {
        let config = StellarConfig::default();
        assert_eq!(config.network_name(), "stellar-testnet");
        assert_eq!(config.get_horizon_url(), "https://horizon-testnet.stellar.org");
        assert_eq!(config.get_network_passphrase(), "Test SDF Network ; September 2015");
        assert_eq!(config.get_friendbot_url(), Some("https://friendbot.stellar.org"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn network_names_parse_case_insensitively() {
        assert_eq!("Futurenet".parse::<StellarNetwork>().unwrap(), StellarNetwork::Futurenet);
        assert!("devnet".parse::<StellarNetwork>().is_err());
        assert_eq!(StellarNetwork::Mainnet.default_friendbot_url(), None);
    }

    #[test]
    fn overrides_and_validation() {
        let config = StellarConfig::new(StellarNetwork::Local)
            .with_horizon_url("http://127.0.0.1:8000///")
            .with_game_contract_id("not-a-contract");
        assert_eq!(config.get_horizon_url(), "http://127.0.0.1:8000");
        assert!(config.validate().unwrap_err().contains("game contract id"));

        let config = StellarConfig::default().with_friendbot_url("ftp://friendbot");
        assert!(config.validate().unwrap_err().contains("Friendbot"));
    }
}
