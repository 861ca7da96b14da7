//! Horizon account lookups and Friendbot funding.

use async_trait::async_trait;
use client_blockchain_core::{Address, LedgerAccounts, TransportError};
use reqwest::{StatusCode, Url};
use tracing::{debug, info};

use crate::config::StellarConfig;

/// [`LedgerAccounts`] backed by Horizon `GET /accounts/{id}` and Friendbot.
#[derive(Clone)]
pub struct HorizonAccounts {
    horizon_url: String,
    friendbot_url: Option<String>,
    http_client: reqwest::Client,
}

impl HorizonAccounts {
    pub fn new(config: &StellarConfig) -> Self {
        Self {
            horizon_url: config.get_horizon_url().to_string(),
            friendbot_url: config.get_friendbot_url().map(str::to_string),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn account_url(&self, address: &Address) -> String {
        format!("{}/accounts/{}", self.horizon_url, address)
    }

    /// Friendbot request URL with `addr` query-encoded.
    pub fn funding_url(&self, address: &Address) -> Result<Url, TransportError> {
        let base = self.friendbot_url.as_deref().ok_or_else(|| {
            TransportError::Config("Friendbot is not available on this network".into())
        })?;
        Url::parse_with_params(base, &[("addr", address.as_str())])
            .map_err(|err| TransportError::Config(format!("Invalid Friendbot URL {base}: {err}")))
    }
}

/// 2xx means the account exists, 404 means it does not.
fn lookup_outcome(status: StatusCode) -> Result<bool, TransportError> {
    if status.is_success() {
        Ok(true)
    } else if status == StatusCode::NOT_FOUND {
        Ok(false)
    } else {
        Err(TransportError::Network(format!(
            "Unable to verify Stellar account ({status})."
        )))
    }
}

fn funding_failure(status: StatusCode, body: &str) -> TransportError {
    let body = body.trim();
    if body.is_empty() {
        TransportError::Network(format!("Friendbot funding failed ({status})."))
    } else {
        TransportError::Network(format!("Friendbot funding failed ({status}): {body}"))
    }
}

#[async_trait]
impl LedgerAccounts for HorizonAccounts {
    async fn account_exists(&self, address: &Address) -> Result<bool, TransportError> {
        let url = self.account_url(address);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|err| TransportError::Network(format!("Horizon request failed: {err}")))?;

        let exists = lookup_outcome(response.status())?;
        debug!(account = %address, exists, "horizon account lookup");
        Ok(exists)
    }

    async fn fund_account(&self, address: &Address) -> Result<(), TransportError> {
        let url = self.funding_url(address)?;
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|err| TransportError::Network(format!("Friendbot request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(funding_failure(status, &body));
        }
        info!(account = %address, "friendbot funding requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StellarNetwork;

    const ACCOUNT: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";

    #[test]
    fn builds_endpoints() {
        let accounts = HorizonAccounts::new(
            &StellarConfig::default().with_horizon_url("https://horizon.example/"),
        );
        let address = Address::normalize(ACCOUNT);

        assert_eq!(
            accounts.account_url(&address),
            format!("https://horizon.example/accounts/{ACCOUNT}")
        );
        assert_eq!(
            accounts.funding_url(&address).unwrap().as_str(),
            format!("https://friendbot.stellar.org/?addr={ACCOUNT}")
        );
    }

    #[test]
    fn mainnet_cannot_fund() {
        let accounts = HorizonAccounts::new(&StellarConfig::new(StellarNetwork::Mainnet));
        assert!(matches!(
            accounts.funding_url(&Address::normalize(ACCOUNT)),
            Err(TransportError::Config(_))
        ));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(lookup_outcome(StatusCode::OK), Ok(true));
        assert_eq!(lookup_outcome(StatusCode::NOT_FOUND), Ok(false));
        assert_eq!(
            lookup_outcome(StatusCode::SERVICE_UNAVAILABLE),
            Err(TransportError::Network(
                "Unable to verify Stellar account (503 Service Unavailable).".into()
            ))
        );
        assert_eq!(
            funding_failure(StatusCode::BAD_REQUEST, " createAccountAlreadyExist ").to_string(),
            "Friendbot funding failed (400 Bad Request): createAccountAlreadyExist"
        );
    }
}
