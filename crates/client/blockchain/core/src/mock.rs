//! In-memory collaborators for testing without a network.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::traits::{
    ContractError, ContractResult, GameContract, LedgerAccounts, SignedPayload,
    TransactionPayload, TransportError, WalletSigner,
};
use crate::types::{Address, SessionId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Ledger with a fixed set of funded accounts.
#[derive(Clone, Default)]
pub struct MockLedger {
    funded: Arc<Mutex<HashSet<Address>>>,
    /// Accounts whose funding requests succeed without creating the account.
    unfundable: Arc<Mutex<HashSet<Address>>>,
    lookups: Arc<AtomicUsize>,
    funding_requests: Arc<AtomicUsize>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_funded<'a>(accounts: impl IntoIterator<Item = &'a Address>) -> Self {
        let ledger = Self::new();
        lock(&ledger.funded).extend(accounts.into_iter().cloned());
        ledger
    }

    pub fn make_unfundable(&self, address: &Address) {
        lock(&self.unfundable).insert(address.clone());
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn funding_requests(&self) -> usize {
        self.funding_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerAccounts for MockLedger {
    async fn account_exists(&self, address: &Address) -> Result<bool, TransportError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.funded).contains(address))
    }

    async fn fund_account(&self, address: &Address) -> Result<(), TransportError> {
        self.funding_requests.fetch_add(1, Ordering::SeqCst);
        if !lock(&self.unfundable).contains(address) {
            lock(&self.funded).insert(address.clone());
        }
        Ok(())
    }
}

/// Wallet whose connected account can be switched at runtime.
#[derive(Clone, Default)]
pub struct MockWallet {
    connected: Arc<Mutex<Option<Address>>>,
    signatures: Arc<AtomicUsize>,
}

impl MockWallet {
    pub fn connected_as(address: &Address) -> Self {
        let wallet = Self::default();
        wallet.connect(address);
        wallet
    }

    pub fn connect(&self, address: &Address) {
        *lock(&self.connected) = Some(address.clone());
    }

    pub fn disconnect(&self) {
        *lock(&self.connected) = None;
    }

    pub fn signatures(&self) -> usize {
        self.signatures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigner for MockWallet {
    fn connected_address(&self) -> Option<Address> {
        lock(&self.connected).clone()
    }

    async fn sign(
        &self,
        payload: TransactionPayload,
        account: &Address,
        network: &str,
    ) -> Result<SignedPayload, TransportError> {
        let connected = self
            .connected_address()
            .ok_or_else(|| TransportError::Rejected("wallet not connected".into()))?;
        self.signatures.fetch_add(1, Ordering::SeqCst);
        if !connected.same_as(account) {
            return Err(TransportError::Rejected(format!(
                "wallet signed as {connected}, expected {account}"
            )));
        }
        Ok(SignedPayload {
            payload,
            signer: connected,
            network: network.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
struct MockSession {
    creator: Address,
    challenger: Address,
    settled: bool,
}

/// Game contract that accepts any proof unless told otherwise.
#[derive(Clone)]
pub struct MockGameContract {
    network: String,
    sessions: Arc<Mutex<HashMap<SessionId, MockSession>>>,
    next_session: Arc<Mutex<SessionId>>,
    reject_proofs: Arc<Mutex<Option<ContractError>>>,
    transport_failure: Arc<Mutex<Option<String>>>,
    calls: Arc<AtomicUsize>,
}

impl MockGameContract {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_session: Arc::new(Mutex::new(1)),
            reject_proofs: Arc::new(Mutex::new(None)),
            transport_failure: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every later `submit_proof` returns this contract error.
    pub fn reject_proofs_with(&self, error: ContractError) {
        *lock(&self.reject_proofs) = Some(error);
    }

    /// The next call fails in transport with `message`.
    pub fn fail_next_call(&self, message: impl Into<String>) {
        *lock(&self.transport_failure) = Some(message.into());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_settled(&self, session_id: SessionId) -> bool {
        lock(&self.sessions)
            .get(&session_id)
            .is_some_and(|session| session.settled)
    }

    async fn authorize(
        &self,
        function: &str,
        account: &Address,
        signer: &dyn WalletSigner,
    ) -> Result<(), TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.transport_failure).take() {
            return Err(TransportError::Network(message));
        }
        let payload = TransactionPayload {
            function: function.to_string(),
            bytes: account.as_str().as_bytes().to_vec(),
        };
        signer
            .sign(payload, account, &self.network)
            .await
            .map(|_| ())
            .map_err(|err| TransportError::Rejected(format!("tx_bad_auth: {err}")))
    }
}

#[async_trait]
impl GameContract for MockGameContract {
    async fn create_session(
        &self,
        creator: &Address,
        challenger: &Address,
        signer: &dyn WalletSigner,
    ) -> Result<ContractResult<SessionId>, TransportError> {
        self.authorize("create_session", challenger, signer).await?;
        if creator.same_as(challenger) {
            return Ok(Err(ContractError::DuplicatePlayers));
        }

        let session_id = {
            let mut next = lock(&self.next_session);
            let Some(following) = next.checked_add(1) else {
                return Ok(Err(ContractError::CounterOverflow));
            };
            std::mem::replace(&mut *next, following)
        };
        lock(&self.sessions).insert(
            session_id,
            MockSession {
                creator: creator.clone(),
                challenger: challenger.clone(),
                settled: false,
            },
        );
        Ok(Ok(session_id))
    }

    async fn submit_proof(
        &self,
        session_id: SessionId,
        public_inputs: &[u8],
        proof_bytes: &[u8],
        signer: &dyn WalletSigner,
    ) -> Result<ContractResult<()>, TransportError> {
        let account = signer.connected_address().unwrap_or_default();
        self.authorize("submit_proof", &account, signer).await?;

        let mut sessions = lock(&self.sessions);
        let Some(session) = sessions.get_mut(&session_id) else {
            return Ok(Err(ContractError::SessionNotFound));
        };
        if session.settled {
            return Ok(Err(ContractError::SessionAlreadySettled));
        }
        if let Some(error) = *lock(&self.reject_proofs) {
            return Ok(Err(error));
        }
        if proof_bytes.is_empty() || public_inputs.len() % 32 != 0 {
            return Ok(Err(ContractError::ZkVerificationFailed));
        }
        if account.same_as(&session.creator) || !account.same_as(&session.challenger) {
            return Err(TransportError::Rejected("tx_bad_auth".into()));
        }
        session.settled = true;
        Ok(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_numbered_from_one() {
        let creator = Address::normalize("GCREATOR");
        let challenger = Address::normalize("GCHALLENGER");
        let wallet = MockWallet::connected_as(&challenger);
        let contract = MockGameContract::new("testnet");

        let first = contract.create_session(&creator, &challenger, &wallet).await.unwrap();
        let second = contract.create_session(&creator, &challenger, &wallet).await.unwrap();
        assert_eq!((first, second), (Ok(1), Ok(2)));
        assert_eq!(wallet.signatures(), 2);
    }

    #[tokio::test]
    async fn wrong_signer_is_bad_auth() {
        let creator = Address::normalize("GCREATOR");
        let challenger = Address::normalize("GCHALLENGER");
        let wallet = MockWallet::connected_as(&creator);
        let contract = MockGameContract::new("testnet");

        let err = contract
            .create_session(&creator, &challenger, &wallet)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("tx_bad_auth"));
    }

    #[tokio::test]
    async fn ledger_funding() {
        let known = Address::normalize("GKNOWN");
        let ledger = MockLedger::with_funded([&known]);
        let fresh = Address::normalize("GFRESH");

        assert!(ledger.account_exists(&known).await.unwrap());
        assert!(!ledger.account_exists(&fresh).await.unwrap());
        ledger.fund_account(&fresh).await.unwrap();
        assert!(ledger.account_exists(&fresh).await.unwrap());
        assert_eq!((ledger.lookups(), ledger.funding_requests()), (3, 1));
    }
}
