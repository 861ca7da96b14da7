//! The two operations callable across the isolation boundary.

use async_trait::async_trait;
use zk::{ProofArtifact, SecretWordWitness};

use super::errors::Result;

/// Proof capability. Worker-backed and inline implementations are
/// interchangeable; callers never learn which one is active.
#[async_trait]
pub trait ProverApi: Send + Sync {
    /// Forces runtime initialisation. Idempotent.
    async fn warmup(&self) -> Result<()>;

    /// Proves and self-verifies `witness`.
    async fn prove_and_verify(&self, witness: SecretWordWitness) -> Result<ProofArtifact>;
}
