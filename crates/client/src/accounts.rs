//! Ledger account checks against a live network.

use anyhow::{Result, anyhow};
use client_blockchain_core::{Address, BlockchainConfig, LedgerAccounts, TransportError};
use client_blockchain_stellar::{HorizonAccounts, StellarConfig};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountStatus {
    pub address: Address,
    pub exists: bool,
    /// A funding request was sent for this account.
    pub funded: bool,
}

/// Horizon-backed ledger for `config`, validated first.
pub fn horizon_ledger(config: &StellarConfig) -> Result<HorizonAccounts> {
    config
        .validate()
        .map_err(|reason| anyhow!("invalid Stellar configuration: {reason}"))?;
    info!(network = config.network_name(), horizon = config.get_horizon_url(), "using horizon");
    Ok(HorizonAccounts::new(config))
}

/// Looks up each distinct non-empty address in order. With `fund`, missing
/// accounts are funded and looked up again.
pub async fn check_accounts(
    ledger: &dyn LedgerAccounts,
    addresses: &[Address],
    fund: bool,
) -> Result<Vec<AccountStatus>, TransportError> {
    let mut seen: Vec<&Address> = Vec::new();
    let mut statuses = Vec::new();
    for address in addresses {
        if address.is_empty() || seen.contains(&address) {
            continue;
        }
        seen.push(address);

        let mut exists = ledger.account_exists(address).await?;
        let funded = fund && !exists;
        if funded {
            ledger.fund_account(address).await?;
            exists = ledger.account_exists(address).await?;
        }
        statuses.push(AccountStatus {
            address: address.clone(),
            exists,
            funded,
        });
    }
    Ok(statuses)
}
