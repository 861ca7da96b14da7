//! Cloneable façade for issuing commands to the prover worker.
//!
//! [`ProverHandle`] hides channel plumbing. Dropping every handle closes the
//! command channel, which stops the worker once its current job finishes.
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use zk::{ProofArtifact, SecretWordWitness};

use super::errors::{HostError, Result};
use super::prover::ProverApi;
use crate::workers::Command;

/// Client-facing handle to the background prover.
#[derive(Clone)]
pub struct ProverHandle {
    command_tx: mpsc::Sender<Command>,
}

impl ProverHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>) -> Self {
        Self { command_tx }
    }

    /// Whether the worker is still receiving commands.
    pub fn is_alive(&self) -> bool {
        !self.command_tx.is_closed()
    }
}

#[async_trait]
impl ProverApi for ProverHandle {
    async fn warmup(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Warmup { reply: reply_tx })
            .await
            .map_err(|_| HostError::CommandChannelClosed)?;

        Ok(reply_rx.await.map_err(HostError::ReplyChannelClosed)??)
    }

    async fn prove_and_verify(&self, witness: SecretWordWitness) -> Result<ProofArtifact> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::ProveAndVerify {
                witness,
                reply: reply_tx,
            })
            .await
            .map_err(|_| HostError::CommandChannelClosed)?;

        Ok(reply_rx.await.map_err(HostError::ReplyChannelClosed)??)
    }
}
