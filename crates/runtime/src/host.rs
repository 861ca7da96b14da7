//! Prover host: the single owner of the live proof runtime.
//!
//! Proofs run on a background worker thread when one can be started and
//! inline otherwise. Every call is wrapped in a caller-side timeout; a timeout
//! abandons the current worker and runtime, since proving cannot be
//! interrupted midway.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};
use zk::{
    AssetSource, EngineFactory, ProofArtifact, ProofRuntime, ProofRuntimeConfig,
    SecretWordWitness,
};

use crate::api::{HostError, ProverApi, ProverHandle, Result};
use crate::config::{HostConfig, ProverMode};
use crate::workers::{InlineProver, ProofMetrics, ProverWorker};

/// Which implementation currently serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveProver {
    Worker,
    Inline,
}

/// Result of [`ProverHost::warmup_with_retry`].
#[derive(Debug)]
pub enum WarmupOutcome {
    Ready { attempts: u32 },
    /// Warmup kept failing; proving is still allowed and will retry initialisation.
    Degraded { attempts: u32, error: HostError },
}

impl WarmupOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, WarmupOutcome::Ready { .. })
    }
}

#[derive(Default)]
struct Slots {
    worker: Option<ProverHandle>,
    inline: Option<Arc<InlineProver>>,
    /// Set after a failed spawn so later calls go straight to inline.
    worker_unavailable: bool,
}

pub struct ProverHost {
    config: HostConfig,
    runtime_config: ProofRuntimeConfig,
    source: Arc<dyn AssetSource>,
    engines: Arc<dyn EngineFactory>,
    metrics: Arc<ProofMetrics>,
    slots: Mutex<Slots>,
}

impl ProverHost {
    pub fn new(
        config: HostConfig,
        runtime_config: ProofRuntimeConfig,
        source: Arc<dyn AssetSource>,
        engines: Arc<dyn EngineFactory>,
    ) -> Self {
        Self {
            config,
            runtime_config,
            source,
            engines,
            metrics: Arc::new(ProofMetrics::new()),
            slots: Mutex::new(Slots::default()),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Returns a clone of the metrics Arc for external querying.
    pub fn metrics(&self) -> Arc<ProofMetrics> {
        Arc::clone(&self.metrics)
    }

    /// The implementation that would serve the next call, if one is built.
    pub fn active(&self) -> Option<ActiveProver> {
        let slots = self.lock_slots();
        match (&slots.worker, &slots.inline) {
            (Some(handle), _) if handle.is_alive() => Some(ActiveProver::Worker),
            (_, Some(_)) => Some(ActiveProver::Inline),
            _ => None,
        }
    }

    /// Drops the worker handle and the inline fallback unconditionally.
    ///
    /// The next call builds a fresh runtime. A worker still busy with an
    /// abandoned proof exits once that proof returns.
    pub fn reset(&self) {
        let (worker, inline) = {
            let mut slots = self.lock_slots();
            slots.worker_unavailable = false;
            (slots.worker.take(), slots.inline.take())
        };
        if worker.is_some() || inline.is_some() {
            info!("prover host reset");
        }
        drop(worker);
        drop(inline);
    }

    /// Warms up with up to `warmup_retry_limit` attempts, resetting between them.
    pub async fn warmup_with_retry(&self) -> WarmupOutcome {
        let limit = self.config.warmup_retry_limit.max(1);
        let mut attempt = 1;
        loop {
            match self.warmup().await {
                Ok(()) => return WarmupOutcome::Ready { attempts: attempt },
                Err(error) if attempt >= limit => {
                    warn!(attempt, limit, error = %error, "zk warmup failed; prover degraded");
                    return WarmupOutcome::Degraded {
                        attempts: attempt,
                        error,
                    };
                }
                Err(error) => {
                    warn!(attempt, limit, error = %error, "zk warmup failed; retrying");
                    self.reset();
                    attempt += 1;
                }
            }
        }
    }

    fn acquire(&self) -> Arc<dyn ProverApi> {
        let mut slots = self.lock_slots();

        if self.config.mode == ProverMode::Worker && !slots.worker_unavailable {
            if let Some(handle) = slots.worker.as_ref().filter(|h| h.is_alive()) {
                return Arc::new(handle.clone());
            }
            match ProverWorker::spawn(self.build_runtime(), self.metrics()) {
                Ok(handle) => {
                    info!("prover worker started");
                    slots.worker = Some(handle.clone());
                    return Arc::new(handle);
                }
                Err(err) => {
                    warn!(error = %err, "prover worker unavailable; proving inline");
                    slots.worker_unavailable = true;
                }
            }
        }

        if let Some(inline) = &slots.inline {
            return inline.clone();
        }
        let inline = Arc::new(InlineProver::new(self.build_runtime(), self.metrics()));
        slots.inline = Some(Arc::clone(&inline));
        inline
    }

    fn build_runtime(&self) -> ProofRuntime {
        ProofRuntime::new(
            self.runtime_config.clone(),
            Arc::clone(&self.source),
            Arc::clone(&self.engines),
        )
    }

    async fn within<T, F>(&self, operation: &'static str, limit: Duration, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(limit, call).await {
            Ok(Err(
                err @ (HostError::CommandChannelClosed | HostError::ReplyChannelClosed(_)),
            )) => {
                warn!(operation, error = %err, "prover worker lost; resetting");
                self.reset();
                Err(err)
            }
            Ok(result) => result,
            Err(_) => {
                warn!(operation, ?limit, "zk call timed out; resetting prover");
                self.reset();
                Err(HostError::TimedOut {
                    operation,
                    elapsed: limit,
                })
            }
        }
    }

    fn lock_slots(&self) -> MutexGuard<'_, Slots> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ProverApi for ProverHost {
    async fn warmup(&self) -> Result<()> {
        let prover = self.acquire();
        self.within("warmup", self.config.warmup_timeout, prover.warmup())
            .await
    }

    async fn prove_and_verify(&self, witness: SecretWordWitness) -> Result<ProofArtifact> {
        let prover = self.acquire();
        self.within(
            "proof generation",
            self.config.proof_timeout,
            prover.prove_and_verify(witness),
        )
        .await
    }
}
