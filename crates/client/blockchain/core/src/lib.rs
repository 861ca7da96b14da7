//! Challenge and settlement layer for CipherForge.
//!
//! # Architecture
//!
//! ```text
//! SettlementFlow (state machine, one per challenge)
//!          ├── LedgerAccounts   (account existence, funding)
//!          ├── WalletSigner     (connected wallet)
//!          ├── GameContract     (create_session, submit_proof)
//!          └── ChallengeStore   (challenge persistence)
//! ```
//!
//! Collaborators are traits so each ledger crate supplies its own
//! implementations. The `mock` feature provides in-memory doubles.
//!
//! # Usage
//!
//! ```ignore
//! use client_blockchain_core::{Collaborators, ProofSubmission, SettlementFlow};
//!
//! let mut flow = SettlementFlow::new(&challenge, collaborators);
//! flow.auto_fill_challenger();
//! let session_id = flow.start_session().await?;
//! flow.submit_proof(&ProofSubmission::from(&artifact)).await?;
//! ```

pub mod attempts;
pub mod errors;
pub mod settlement;
pub mod store;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use attempts::{
    GuessAttempt, GuessError, GuessLimiter, GuessOutcome, MAX_LOCAL_ATTEMPTS, SESSION_WINDOW,
    format_countdown, session_seconds_left,
};
pub use errors::{LedgerErrorKind, SettlementOp, classify, friendly_message};
pub use settlement::{Collaborators, SettlementError, SettlementFlow, SettlementPhase};
pub use store::{Clock, InMemoryChallengeStore};
pub use traits::{
    ChallengeStore, ContractError, ContractResult, GameContract, LedgerAccounts, SignedPayload,
    StoreError, TransactionPayload, TransportError, WalletSigner,
};
pub use types::{
    Address, BlockchainConfig, Challenge, ChallengeId, ChallengeStatus, GamePreset,
    InputFormatError, InputRules, NewChallenge, ProofSubmission, SessionId, same_address,
};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockGameContract, MockLedger, MockWallet};
