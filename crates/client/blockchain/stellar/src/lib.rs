//! Stellar integration for CipherForge.
//!
//! Provides network configuration and the Horizon-backed account service
//! used by the settlement preflight:
//!
//! ```text
//! SettlementFlow → LedgerAccounts → HorizonAccounts → Horizon / Friendbot
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use client_blockchain_stellar::{HorizonAccounts, StellarConfig};
//!
//! let config = StellarConfig::from_env()?;
//! let accounts = HorizonAccounts::new(&config);
//! let funded = accounts.account_exists(&address).await?;
//! ```

pub mod config;
pub mod horizon;

pub use config::{ConfigError, StellarConfig, StellarNetwork};
pub use horizon::HorizonAccounts;
