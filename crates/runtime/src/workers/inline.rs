//! Inline fallback prover.
//!
//! Runs the proof runtime on the calling task. Used when no worker thread
//! could be started or when inline mode is configured.

use std::sync::Arc;

use async_trait::async_trait;
use zk::{ProofArtifact, ProofRuntime, SecretWordWitness};

use super::metrics::ProofMetrics;
use super::prover::prove_with_metrics;
use crate::api::{ProverApi, Result};

pub struct InlineProver {
    runtime: ProofRuntime,
    metrics: Arc<ProofMetrics>,
}

impl InlineProver {
    pub fn new(runtime: ProofRuntime, metrics: Arc<ProofMetrics>) -> Self {
        Self { runtime, metrics }
    }

    pub fn runtime(&self) -> &ProofRuntime {
        &self.runtime
    }
}

#[async_trait]
impl ProverApi for InlineProver {
    async fn warmup(&self) -> Result<()> {
        Ok(self.runtime.warmup().await?)
    }

    async fn prove_and_verify(&self, witness: SecretWordWitness) -> Result<ProofArtifact> {
        Ok(prove_with_metrics(&self.runtime, &witness, &self.metrics).await?)
    }
}
