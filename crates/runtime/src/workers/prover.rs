//! ZK proof generation worker.
//!
//! The worker owns the one [`ProofRuntime`] of its generation and runs on a
//! dedicated OS thread with its own single-threaded executor, so multi-second
//! proving never stalls the caller's runtime. Commands arrive over an mpsc
//! channel and are processed one at a time.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};
use zk::{ProofArtifact, ProofError, ProofRuntime, SecretWordWitness};

use crate::api::{HostError, ProverHandle};
use crate::workers::ProofMetrics;

const COMMAND_BUFFER: usize = 8;
const WORKER_THREAD_NAME: &str = "zk-prover";

/// Commands that can be sent to the prover worker.
pub enum Command {
    /// Initialise the runtime if it is not ready yet.
    Warmup {
        reply: oneshot::Sender<Result<(), ProofError>>,
    },
    /// Prove and self-verify one witness.
    ProveAndVerify {
        witness: SecretWordWitness,
        reply: oneshot::Sender<Result<ProofArtifact, ProofError>>,
    },
}

/// Background prover that processes [`Command`]s sequentially.
pub struct ProverWorker {
    runtime: ProofRuntime,
    command_rx: mpsc::Receiver<Command>,
    metrics: Arc<ProofMetrics>,
}

impl ProverWorker {
    pub fn new(
        runtime: ProofRuntime,
        command_rx: mpsc::Receiver<Command>,
        metrics: Arc<ProofMetrics>,
    ) -> Self {
        Self {
            runtime,
            command_rx,
            metrics,
        }
    }

    /// Starts a worker thread that owns `runtime` and returns its handle.
    pub fn spawn(
        runtime: ProofRuntime,
        metrics: Arc<ProofMetrics>,
    ) -> Result<ProverHandle, HostError> {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);

        let executor = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(HostError::WorkerSpawn)?;

        let worker = Self::new(runtime, command_rx, metrics);
        std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.into())
            .spawn(move || executor.block_on(worker.run()))
            .map_err(HostError::WorkerSpawn)?;

        Ok(ProverHandle::new(command_tx))
    }

    /// Main worker loop. Returns once every handle has been dropped.
    pub async fn run(mut self) {
        info!("ProverWorker started");

        while let Some(command) = self.command_rx.recv().await {
            self.handle_command(command).await;
        }

        self.runtime.reset();
        info!("ProverWorker stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Warmup { reply } => {
                let result = self.runtime.warmup().await;
                if reply.send(result).is_err() {
                    debug!("warmup caller went away before the reply");
                }
            }
            Command::ProveAndVerify { witness, reply } => {
                let result = prove_with_metrics(&self.runtime, &witness, &self.metrics).await;
                if reply.send(result).is_err() {
                    debug!("proof caller went away before the reply");
                }
            }
        }
    }
}

/// Runs one proof and records it in `metrics`.
pub(crate) async fn prove_with_metrics(
    runtime: &ProofRuntime,
    witness: &SecretWordWitness,
    metrics: &ProofMetrics,
) -> Result<ProofArtifact, ProofError> {
    let attempt = metrics.begin();
    let started = Instant::now();
    let result = runtime.prove_and_verify(witness).await;

    match &result {
        Ok(artifact) => {
            let proving_time = started.elapsed();
            attempt.succeeded(proving_time);
            info!(
                proving_ms = proving_time.as_millis() as u64,
                proof_len = artifact.proof_bytes.len(),
                "Proof generated"
            );
        }
        Err(err) if err.is_incorrect_secret() => {
            attempt.failed();
            info!("Witness rejected: incorrect secret");
        }
        Err(err) => {
            attempt.failed();
            error!(error = %err, "Proof generation failed");
        }
    }

    result
}
