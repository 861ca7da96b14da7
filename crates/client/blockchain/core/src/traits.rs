//! Collaborator traits consumed by the settlement flow.
//!
//! - [`LedgerAccounts`]: account existence and testnet funding
//! - [`WalletSigner`]: the connected wallet
//! - [`GameContract`]: session creation and proof verification on chain
//! - [`ChallengeStore`]: challenge persistence

use async_trait::async_trait;
use zk::CommitmentError;

use crate::types::{Address, Challenge, ChallengeId, NewChallenge, SessionId};

// ============================================================================
// Error Types
// ============================================================================

/// Transport layer errors. Messages are kept verbatim for classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Backend(String),
}

/// Error variant of a contract call result. Codes match the game contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("Contract error #1: AlreadyInitialized")]
    AlreadyInitialized,
    #[error("Contract error #2: NotInitialized")]
    NotInitialized,
    #[error("Contract error #3: SessionNotFound")]
    SessionNotFound,
    #[error("Contract error #4: SessionAlreadySettled")]
    SessionAlreadySettled,
    #[error("Contract error #5: CounterOverflow")]
    CounterOverflow,
    #[error("Contract error #6: ZkVerificationFailed")]
    ZkVerificationFailed,
    #[error("Contract error #7: DuplicatePlayers")]
    DuplicatePlayers,
    #[error("Contract error #{0}")]
    Unknown(u32),
}

impl ContractError {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Self::AlreadyInitialized,
            2 => Self::NotInitialized,
            3 => Self::SessionNotFound,
            4 => Self::SessionAlreadySettled,
            5 => Self::CounterOverflow,
            6 => Self::ZkVerificationFailed,
            7 => Self::DuplicatePlayers,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::AlreadyInitialized => 1,
            Self::NotInitialized => 2,
            Self::SessionNotFound => 3,
            Self::SessionAlreadySettled => 4,
            Self::CounterOverflow => 5,
            Self::ZkVerificationFailed => 6,
            Self::DuplicatePlayers => 7,
            Self::Unknown(code) => code,
        }
    }
}

/// Explicit success/error union returned by contract calls.
pub type ContractResult<T> = Result<T, ContractError>;

/// Challenge persistence errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Connect your wallet first.")]
    Unauthenticated,

    #[error("Challenge not found.")]
    NotFound(ChallengeId),

    #[error("Only the creator can publish this challenge.")]
    NotCreator,

    #[error(transparent)]
    InvalidHash(#[from] CommitmentError),

    #[error("Challenge store unavailable: {0}")]
    Transport(String),
}

// ============================================================================
// Collaborators
// ============================================================================

/// Ledger account service.
#[async_trait]
pub trait LedgerAccounts: Send + Sync {
    async fn account_exists(&self, address: &Address) -> Result<bool, TransportError>;

    /// Idempotent funding request.
    async fn fund_account(&self, address: &Address) -> Result<(), TransportError>;
}

/// Unsigned transaction produced by a contract client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPayload {
    pub function: String,
    pub bytes: Vec<u8>,
}

/// Payload signed by a wallet account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub payload: TransactionPayload,
    pub signer: Address,
    pub network: String,
}

/// Connected wallet.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn connected_address(&self) -> Option<Address>;

    /// Prompts the user; latency is unbounded.
    async fn sign(
        &self,
        payload: TransactionPayload,
        account: &Address,
        network: &str,
    ) -> Result<SignedPayload, TransportError>;
}

/// Game contract client.
///
/// The outer `Result` is the transport; the inner [`ContractResult`] is the
/// contract's own verdict and must be unwrapped before use.
#[async_trait]
pub trait GameContract: Send + Sync {
    async fn create_session(
        &self,
        creator: &Address,
        challenger: &Address,
        signer: &dyn WalletSigner,
    ) -> Result<ContractResult<SessionId>, TransportError>;

    async fn submit_proof(
        &self,
        session_id: SessionId,
        public_inputs: &[u8],
        proof_bytes: &[u8],
        signer: &dyn WalletSigner,
    ) -> Result<ContractResult<()>, TransportError>;
}

/// Challenge persistence.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    async fn create_draft(
        &self,
        creator: &Address,
        draft: NewChallenge,
    ) -> Result<ChallengeId, StoreError>;

    /// Creator-only. Publishing a non-draft is a no-op.
    async fn publish_draft(&self, id: &ChallengeId, caller: &Address) -> Result<(), StoreError>;

    async fn get_by_id(&self, id: &ChallengeId) -> Result<Option<Challenge>, StoreError>;

    /// Newest first.
    async fn list_by_creator(&self, creator: &Address) -> Result<Vec<Challenge>, StoreError>;

    /// Non-draft challenges, newest publication first.
    async fn list_published(&self) -> Result<Vec<Challenge>, StoreError>;

    async fn record_session_start(
        &self,
        id: &ChallengeId,
        session_id: SessionId,
        challenger: &Address,
    ) -> Result<(), StoreError>;

    async fn record_settlement(
        &self,
        id: &ChallengeId,
        session_id: SessionId,
        solver: &Address,
    ) -> Result<(), StoreError>;
}
