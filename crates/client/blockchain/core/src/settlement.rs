//! Settlement state machine for one challenge.
//!
//! ```text
//! NoSession -> SessionStarting -> SessionActive -> ProofSubmitting -> Settled
//! ```
//!
//! The `...ing` phases are transient. A failure returns the flow to the last
//! stable phase and surfaces the error; retrying is left to the caller.
//! Preconditions are checked before any network call.

use std::sync::Arc;

use strum::Display;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::{SettlementOp, friendly_message};
use crate::traits::{
    ChallengeStore, ContractError, ContractResult, GameContract, LedgerAccounts, StoreError,
    TransportError, WalletSigner,
};
use crate::types::{Address, Challenge, ChallengeId, ChallengeStatus, ProofSubmission, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SettlementPhase {
    NoSession,
    SessionStarting,
    SessionActive,
    ProofSubmitting,
    Settled,
}

impl SettlementPhase {
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            SettlementPhase::SessionStarting | SettlementPhase::ProofSubmitting
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    #[error("Connect your wallet first.")]
    NotConnected,

    #[error("A challenger wallet address is required.")]
    MissingChallenger,

    #[error("Connected wallet must match challenger wallet. Connected: {connected} | Challenger: {challenger}")]
    WalletMismatch {
        connected: Address,
        challenger: Address,
    },

    #[error(
        "Switch to challenger wallet to start session. Creator wallet cannot start sessions in this flow."
    )]
    CreatorCannotStart,

    #[error("Creator and challenger must be different wallets.")]
    SamePlayers,

    #[error("A session has already been started for this challenge.")]
    SessionAlreadyStarted,

    #[error("Start or wait for an on-chain session first.")]
    NoSession,

    #[error("Generate a ZK proof first.")]
    MissingProof,

    #[error("Local proof verification failed. Generate a valid proof first.")]
    InvalidProof,

    #[error("Creators cannot submit proof for their own challenge.")]
    CreatorCannotSubmit,

    #[error("Only the registered challenger wallet can submit this proof.")]
    NotRegisteredChallenger,

    #[error("This challenge is already settled.")]
    AlreadySettled,

    #[error("Another settlement step is still in progress.")]
    Busy,

    #[error("These Stellar testnet accounts are not funded yet: {}", join_addresses(.0))]
    AccountsNotFunded(Vec<Address>),

    #[error("Funding request completed but account is still unavailable.")]
    FundingIncomplete(Address),

    #[error("{op} failed: {source}")]
    Transport {
        op: SettlementOp,
        source: TransportError,
    },

    #[error("{op} rejected: {source}")]
    Contract {
        op: SettlementOp,
        source: ContractError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SettlementError {
    /// Ledger and contract failures are classified; everything else is
    /// already user text.
    pub fn user_message(&self) -> String {
        match self {
            SettlementError::Transport { op, source } => friendly_message(*op, &source.to_string()),
            SettlementError::Contract { op, source } => friendly_message(*op, &source.to_string()),
            other => other.to_string(),
        }
    }

    /// True when nothing was sent to the ledger or contract.
    pub fn is_precondition(&self) -> bool {
        !matches!(
            self,
            SettlementError::AccountsNotFunded(_)
                | SettlementError::FundingIncomplete(_)
                | SettlementError::Transport { .. }
                | SettlementError::Contract { .. }
                | SettlementError::Store(_)
        )
    }
}

fn join_addresses(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(Address::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Boundary unwrap for contract calls.
fn unwrap_contract<T>(
    op: SettlementOp,
    outcome: Result<ContractResult<T>, TransportError>,
) -> Result<T, SettlementError> {
    match outcome {
        Err(source) => Err(SettlementError::Transport { op, source }),
        Ok(Err(source)) => Err(SettlementError::Contract { op, source }),
        Ok(Ok(value)) => Ok(value),
    }
}

/// External services the flow talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub ledger: Arc<dyn LedgerAccounts>,
    pub wallet: Arc<dyn WalletSigner>,
    pub contract: Arc<dyn GameContract>,
    pub store: Arc<dyn ChallengeStore>,
}

pub struct SettlementFlow {
    challenge_id: ChallengeId,
    creator: Address,
    /// Challenger recorded with the session, if any.
    registered_challenger: Option<Address>,
    /// Challenger proposed for the next session start.
    challenger: Address,
    session_id: Option<SessionId>,
    /// Contract calls that succeeded but are not yet in the store. A retry
    /// repeats only the store write.
    unrecorded_session: Option<(SessionId, Address)>,
    unrecorded_settlement: Option<(SessionId, Address)>,
    phase: SettlementPhase,
    missing_accounts: Vec<Address>,
    status: String,
    deps: Collaborators,
}

impl SettlementFlow {
    pub fn new(challenge: &Challenge, deps: Collaborators) -> Self {
        let registered_challenger = challenge
            .challenger_address
            .clone()
            .filter(|address| !address.is_empty());
        let phase = match (challenge.status, challenge.session_id) {
            (ChallengeStatus::Settled, _) => SettlementPhase::Settled,
            (_, Some(_)) => SettlementPhase::SessionActive,
            (_, None) => SettlementPhase::NoSession,
        };

        Self {
            challenge_id: challenge.id.clone(),
            creator: challenge.creator_address.clone(),
            challenger: registered_challenger.clone().unwrap_or_default(),
            registered_challenger,
            session_id: challenge.session_id,
            unrecorded_session: None,
            unrecorded_settlement: None,
            phase,
            missing_accounts: Vec::new(),
            status: "Waiting for session start.".to_string(),
            deps,
        }
    }

    pub fn phase(&self) -> SettlementPhase {
        self.phase
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn challenger(&self) -> &Address {
        &self.challenger
    }

    pub fn missing_accounts(&self) -> &[Address] {
        &self.missing_accounts
    }

    /// Last progress or error line.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Proposes the connected wallet as challenger when none is recorded and
    /// the connected wallet is not the creator.
    pub fn auto_fill_challenger(&mut self) -> Option<&Address> {
        if self.registered_challenger.is_some() || !self.challenger.is_empty() {
            return None;
        }
        let connected = self.connected()?;
        if connected.same_as(&self.creator) {
            return None;
        }
        self.challenger = connected;
        Some(&self.challenger)
    }

    /// Ignored once a challenger is recorded with the session.
    pub fn set_challenger(&mut self, raw: &str) {
        if self.registered_challenger.is_none() {
            self.challenger = Address::normalize(raw);
        }
    }

    pub fn step_hint(&self, proof: Option<&ProofSubmission>) -> &'static str {
        if self.session_id.is_none() {
            "Step 1: Start an on-chain session."
        } else if !proof.is_some_and(ProofSubmission::is_ready) {
            "Step 2: Generate a local ZK proof."
        } else {
            "Step 3: Submit proof on-chain."
        }
    }

    /// Checks every distinct non-empty address and reports all missing ones
    /// together. Lookup failures belong to session start.
    pub async fn preflight(&mut self, addresses: &[Address]) -> Result<(), SettlementError> {
        let mut required: Vec<Address> = Vec::new();
        for address in addresses.iter().filter(|a| !a.is_empty()) {
            if !required.contains(address) {
                required.push(address.clone());
            }
        }

        let mut checks = JoinSet::new();
        for (index, address) in required.iter().cloned().enumerate() {
            let ledger = Arc::clone(&self.deps.ledger);
            checks.spawn(async move { (index, ledger.account_exists(&address).await) });
        }

        let mut exists = vec![false; required.len()];
        let mut first_error = None;
        while let Some(joined) = checks.join_next().await {
            match joined {
                Ok((index, Ok(found))) => exists[index] = found,
                Ok((_, Err(err))) => {
                    first_error.get_or_insert(err);
                }
                Err(join) => {
                    first_error.get_or_insert(TransportError::Backend(join.to_string()));
                }
            }
        }
        if let Some(err) = first_error {
            return Err(SettlementError::Transport {
                op: SettlementOp::CreateSession,
                source: err,
            });
        }

        self.missing_accounts = required
            .into_iter()
            .zip(exists)
            .filter_map(|(address, found)| (!found).then_some(address))
            .collect();

        if self.missing_accounts.is_empty() {
            Ok(())
        } else {
            warn!(missing = %join_addresses(&self.missing_accounts), "preflight found unfunded accounts");
            Err(SettlementError::AccountsNotFunded(self.missing_accounts.clone()))
        }
    }

    /// Requests funding, then re-checks the account.
    pub async fn fund_account(&mut self, address: &Address) -> Result<(), SettlementError> {
        let ledger = &self.deps.ledger;
        let funding_failed = |source| SettlementError::Transport {
            op: SettlementOp::FundAccount,
            source,
        };
        ledger.fund_account(address).await.map_err(funding_failed)?;
        let exists = ledger
            .account_exists(address)
            .await
            .map_err(funding_failed)?;
        if !exists {
            return Err(SettlementError::FundingIncomplete(address.clone()));
        }

        self.missing_accounts.retain(|missing| missing != address);
        info!(account = %address, "account funded");
        Ok(())
    }

    pub async fn start_session(&mut self) -> Result<SessionId, SettlementError> {
        self.check_start()?;
        let challenger = self.challenger.clone();
        let creator = self.creator.clone();

        let prior = self.enter(SettlementPhase::SessionStarting, "Checking Stellar testnet accounts...");
        match self.run_start(&creator, &challenger).await {
            Ok((session_id, challenger)) => {
                self.session_id = Some(session_id);
                self.registered_challenger = Some(challenger);
                self.phase = SettlementPhase::SessionActive;
                self.status = format!("Session {session_id} started on-chain.");
                info!(challenge = %self.challenge_id, session_id, "session started");
                Ok(session_id)
            }
            Err(err) => Err(self.fail(prior, err)),
        }
    }

    pub async fn submit_proof(&mut self, proof: &ProofSubmission) -> Result<(), SettlementError> {
        let (session_id, solver) = self.check_submit(proof)?;

        let prior = self.enter(SettlementPhase::ProofSubmitting, "Preparing submit_proof transaction...");
        match self.run_submit(session_id, &solver, proof).await {
            Ok(solver) => {
                self.phase = SettlementPhase::Settled;
                self.status = format!("Proof accepted on-chain for session {session_id}.");
                info!(challenge = %self.challenge_id, session_id, solver = %solver, "challenge settled");
                Ok(())
            }
            Err(err) => Err(self.fail(prior, err)),
        }
    }

    fn connected(&self) -> Option<Address> {
        self.deps
            .wallet
            .connected_address()
            .filter(|address| !address.is_empty())
    }

    fn check_start(&self) -> Result<(), SettlementError> {
        match self.phase {
            SettlementPhase::NoSession => {}
            SettlementPhase::Settled => return Err(SettlementError::AlreadySettled),
            phase if phase.is_transient() => return Err(SettlementError::Busy),
            _ => return Err(SettlementError::SessionAlreadyStarted),
        }

        let connected = self.connected().ok_or(SettlementError::NotConnected)?;
        if self.challenger.is_empty() {
            return Err(SettlementError::MissingChallenger);
        }
        if !connected.same_as(&self.challenger) {
            return Err(SettlementError::WalletMismatch {
                connected,
                challenger: self.challenger.clone(),
            });
        }
        if connected.same_as(&self.creator) {
            return Err(SettlementError::CreatorCannotStart);
        }
        if self.challenger.same_as(&self.creator) {
            return Err(SettlementError::SamePlayers);
        }
        Ok(())
    }

    fn check_submit(
        &self,
        proof: &ProofSubmission,
    ) -> Result<(SessionId, Address), SettlementError> {
        match self.phase {
            SettlementPhase::Settled => return Err(SettlementError::AlreadySettled),
            phase if phase.is_transient() => return Err(SettlementError::Busy),
            _ => {}
        }

        let connected = self.connected().ok_or(SettlementError::NotConnected)?;
        let session_id = self.session_id.ok_or(SettlementError::NoSession)?;
        if !proof.is_ready() {
            return Err(SettlementError::MissingProof);
        }
        if proof.is_valid == Some(false) {
            return Err(SettlementError::InvalidProof);
        }
        if connected.same_as(&self.creator) {
            return Err(SettlementError::CreatorCannotSubmit);
        }
        if let Some(registered) = &self.registered_challenger {
            if !connected.same_as(registered) {
                return Err(SettlementError::NotRegisteredChallenger);
            }
        }
        Ok((session_id, connected))
    }

    async fn run_start(
        &mut self,
        creator: &Address,
        challenger: &Address,
    ) -> Result<(SessionId, Address), SettlementError> {
        let (session_id, challenger) = match self.unrecorded_session.clone() {
            Some(opened) => {
                info!(session_id = opened.0, "session already open on-chain; recording it");
                opened
            }
            None => {
                self.preflight(&[creator.clone(), challenger.clone()]).await?;

                self.status = "Preparing create_session transaction...".to_string();
                let outcome = self
                    .deps
                    .contract
                    .create_session(creator, challenger, self.deps.wallet.as_ref())
                    .await;
                let session_id = unwrap_contract(SettlementOp::CreateSession, outcome)?;
                self.unrecorded_session = Some((session_id, challenger.clone()));
                (session_id, challenger.clone())
            }
        };

        self.deps
            .store
            .record_session_start(&self.challenge_id, session_id, &challenger)
            .await?;
        self.unrecorded_session = None;
        Ok((session_id, challenger))
    }

    async fn run_submit(
        &mut self,
        session_id: SessionId,
        solver: &Address,
        proof: &ProofSubmission,
    ) -> Result<Address, SettlementError> {
        let solver = match self.unrecorded_settlement.clone() {
            Some((settled, solver)) if settled == session_id => {
                info!(session_id, "proof already accepted on-chain; recording it");
                solver
            }
            _ => {
                let outcome = self
                    .deps
                    .contract
                    .submit_proof(
                        session_id,
                        &proof.public_inputs,
                        &proof.proof_bytes,
                        self.deps.wallet.as_ref(),
                    )
                    .await;
                unwrap_contract(SettlementOp::SubmitProof, outcome)?;
                self.unrecorded_settlement = Some((session_id, solver.clone()));
                solver.clone()
            }
        };

        self.deps
            .store
            .record_settlement(&self.challenge_id, session_id, &solver)
            .await?;
        self.unrecorded_settlement = None;
        Ok(solver)
    }

    fn enter(&mut self, phase: SettlementPhase, status: &str) -> SettlementPhase {
        let prior = std::mem::replace(&mut self.phase, phase);
        self.status = status.to_string();
        debug!(challenge = %self.challenge_id, from = %prior, to = %phase, "settlement phase");
        prior
    }

    fn fail(&mut self, prior: SettlementPhase, err: SettlementError) -> SettlementError {
        self.phase = prior;
        self.status = err.user_message();
        warn!(challenge = %self.challenge_id, phase = %prior, error = %err, "settlement step failed");
        err
    }
}
