//! Challenger workbench: local guesses, proof generation, settlement hand-off.

use std::sync::Arc;

use client_blockchain_core::{
    Challenge, GuessError, GuessLimiter, GuessOutcome, InputFormatError, ProofSubmission,
};
use runtime::{HostError, ProverApi, ProverHost, WarmupOutcome};
use tracing::{info, warn};
use zk::{CommitmentError, ProofArtifact, matches_commitment, prepare_witness};

/// Shown when warmup exhausted its retries.
pub const DEGRADED_WARMUP_MESSAGE: &str =
    "ZK warmup failed in the background. You can still generate proof; first attempt may take longer.";

#[derive(Debug, thiserror::Error)]
pub enum WorkbenchError {
    #[error(transparent)]
    InvalidInput(#[from] InputFormatError),

    #[error(transparent)]
    Commitment(#[from] CommitmentError),

    /// Local self-check failed; no proof was attempted.
    #[error("Incorrect victory code for this challenge. Check the hint and try again.")]
    IncorrectSecret,

    #[error(transparent)]
    Prover(#[from] HostError),
}

impl WorkbenchError {
    pub fn user_message(&self) -> String {
        match self {
            WorkbenchError::Prover(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// Workbench state for one challenge.
pub struct Workbench {
    challenge: Challenge,
    host: Arc<ProverHost>,
    limiter: GuessLimiter,
    proof: Option<ProofArtifact>,
}

impl Workbench {
    pub fn new(challenge: Challenge, host: Arc<ProverHost>) -> Self {
        Self {
            challenge,
            host,
            limiter: GuessLimiter::new(),
            proof: None,
        }
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn limiter(&self) -> &GuessLimiter {
        &self.limiter
    }

    pub fn proof(&self) -> Option<&ProofArtifact> {
        self.proof.as_ref()
    }

    /// Proof in the form the settlement flow accepts.
    pub fn submission(&self) -> Option<ProofSubmission> {
        self.proof.as_ref().map(ProofSubmission::from)
    }

    /// Masks first-proof latency. Never fails; a degraded host still proves.
    pub async fn warmup(&self) -> WarmupOutcome {
        let outcome = self.host.warmup_with_retry().await;
        if let WarmupOutcome::Degraded { error, .. } = &outcome {
            warn!(error = %error, "{DEGRADED_WARMUP_MESSAGE}");
        }
        outcome
    }

    pub fn guess(&mut self, raw: &str, now_ms: u64) -> Result<GuessOutcome, GuessError> {
        self.limiter.guess(&self.challenge, raw, now_ms)
    }

    /// Validates the input, checks it against the commitment locally, then
    /// proves through the host. Any failure clears the previous proof.
    pub async fn prove(&mut self, raw: &str) -> Result<&ProofArtifact, WorkbenchError> {
        self.proof = None;
        let secret = self.challenge.game_preset.normalize_input(raw)?;
        if !matches_commitment(&secret, &self.challenge.expected_hash_hex)? {
            return Err(WorkbenchError::IncorrectSecret);
        }

        let witness = prepare_witness(&secret, &self.challenge.expected_hash_hex)?;
        let artifact = self.host.prove_and_verify(witness).await?;
        info!(
            challenge = %self.challenge.id,
            public_inputs = artifact.public_inputs.len(),
            proof_bytes = artifact.proof_bytes.len(),
            "proof generated and verified locally"
        );
        Ok(self.proof.insert(artifact))
    }
}
