//! Proof runtime lifecycle.
//!
//! `Uninitialized -> Loading -> Ready`, or `Loading -> Failed` when any
//! initialisation step fails. A failed initialisation leaves nothing cached,
//! so the next call starts over from the asset fetch. [`ProofRuntime::reset`]
//! releases the backend and returns to `Uninitialized`.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OnceCell;

use crate::artifact::CompiledCircuit;
use crate::assets::{AssetPaths, AssetSource};
use crate::backend::{
    AbiCodec, CircuitEngine, EngineError, EngineFactory, ProofOptions, ProvingBackend,
};
use crate::encoding::flatten_public_inputs;
use crate::prover::{ProofArtifact, ProofError};
use crate::witness::SecretWordWitness;

/// Static configuration of a [`ProofRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofRuntimeConfig {
    pub paths: AssetPaths,
    pub options: ProofOptions,
    /// Backend worker threads. The secret-word circuit is proved single-threaded.
    pub threads: usize,
}

impl Default for ProofRuntimeConfig {
    fn default() -> Self {
        Self {
            paths: AssetPaths::default(),
            options: ProofOptions::default(),
            threads: 1,
        }
    }
}

/// Observable lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeStatus {
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

/// Engines built from one successful initialisation.
struct LoadedRuntime {
    circuit: CompiledCircuit,
    bytecode: Vec<u8>,
    engine: Box<dyn CircuitEngine>,
    codec: Box<dyn AbiCodec>,
    backend: Box<dyn ProvingBackend>,
    /// Proving is serialised on the shared backend.
    prove_lock: Mutex<()>,
}

type RuntimeSlot = Arc<OnceCell<Arc<LoadedRuntime>>>;

/// The one live proof runtime of a session.
///
/// Owned by whoever constructs it (normally the runtime host) and passed by
/// reference. Initialisation is single-flight: concurrent callers wait on the
/// same in-flight load.
pub struct ProofRuntime {
    config: ProofRuntimeConfig,
    source: Arc<dyn AssetSource>,
    factory: Arc<dyn EngineFactory>,
    slot: Mutex<RuntimeSlot>,
    status: Mutex<RuntimeStatus>,
}

impl ProofRuntime {
    pub fn new(
        config: ProofRuntimeConfig,
        source: Arc<dyn AssetSource>,
        factory: Arc<dyn EngineFactory>,
    ) -> Self {
        Self {
            config,
            source,
            factory,
            slot: Mutex::new(Arc::new(OnceCell::new())),
            status: Mutex::new(RuntimeStatus::Uninitialized),
        }
    }

    pub fn config(&self) -> &ProofRuntimeConfig {
        &self.config
    }

    pub fn status(&self) -> RuntimeStatus {
        lock_recover(&self.status).clone()
    }

    /// Loads assets and engines once; later calls reuse the cached instance.
    pub async fn initialize(&self) -> Result<(), ProofError> {
        self.loaded().await.map(|_| ())
    }

    /// Forces initialisation to mask first-use latency. Idempotent.
    pub async fn warmup(&self) -> Result<(), ProofError> {
        self.initialize().await
    }

    /// Proves and locally verifies the secret-word relation for `witness`.
    ///
    /// A wrong secret is [`ProofError::IncorrectSecret`]. Failures that
    /// invalidate the runtime reset it before returning.
    pub async fn prove_and_verify(
        &self,
        witness: &SecretWordWitness,
    ) -> Result<ProofArtifact, ProofError> {
        witness
            .validate_shape()
            .map_err(|err| ProofError::MalformedWitness(err.to_string()))?;

        let loaded = self.loaded().await?;
        let options = self.config.options;
        let witness = witness.clone();
        // Proving is synchronous; it runs on the blocking pool so the caller
        // stays cancellable by a timeout.
        let result = tokio::task::spawn_blocking(move || loaded.prove(&witness, options))
            .await
            .unwrap_or_else(|err| {
                Err(ProofError::StateUnavailable(format!("proving task ended: {err}")))
            });

        if let Err(err) = &result {
            if err.invalidates_runtime() {
                tracing::warn!(error = %err, "proof runtime fault, resetting");
                self.reset();
            }
        }
        result
    }

    /// Clears the cache and returns to `Uninitialized`.
    ///
    /// The backend is destroyed once the last in-flight proof holding it
    /// finishes, immediately if there is none. A load still in flight is
    /// orphaned: it completes for its own callers but never reports status.
    pub fn reset(&self) {
        let previous = {
            let mut slot = lock_recover(&self.slot);
            *lock_recover(&self.status) = RuntimeStatus::Uninitialized;
            std::mem::replace(&mut *slot, Arc::new(OnceCell::new()))
        };
        if previous.initialized() {
            tracing::info!("proof runtime reset");
        }
    }

    async fn loaded(&self) -> Result<Arc<LoadedRuntime>, ProofError> {
        let cell = Arc::clone(&*lock_recover(&self.slot));
        cell.get_or_try_init(|| self.load(&cell)).await.cloned()
    }

    async fn load(&self, cell: &RuntimeSlot) -> Result<Arc<LoadedRuntime>, ProofError> {
        self.set_status_for(cell, RuntimeStatus::Loading);
        tracing::info!(source = %self.source.describe(), "initialising proof runtime");

        match self.load_inner().await {
            Ok(loaded) => {
                if !self.set_status_for(cell, RuntimeStatus::Ready) {
                    tracing::debug!("proof runtime loaded after a reset; not cached");
                }
                tracing::info!(
                    public_inputs = loaded.circuit.public_input_count(),
                    "proof runtime ready"
                );
                Ok(Arc::new(loaded))
            }
            Err(err) => {
                if let ProofError::RuntimeVersionMismatch { found, supported } = &err {
                    tracing::error!(%found, %supported, "circuit version mismatch");
                } else {
                    tracing::error!(error = %err, "proof runtime initialisation failed");
                }
                self.set_status_for(cell, RuntimeStatus::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    async fn load_inner(&self) -> Result<LoadedRuntime, ProofError> {
        let paths = &self.config.paths;
        let (engine_wasm, codec_wasm, circuit_json) = tokio::try_join!(
            self.source.fetch(&paths.circuit_engine_wasm),
            self.source.fetch(&paths.abi_codec_wasm),
            self.source.fetch(&paths.circuit_json),
        )?;

        let engine = self
            .factory
            .init_circuit_engine(&engine_wasm)
            .map_err(engine_init)?;
        let codec = self
            .factory
            .init_abi_codec(&codec_wasm)
            .map_err(engine_init)?;

        let circuit = CompiledCircuit::from_json(&circuit_json)?;
        circuit.ensure_supported_version()?;
        let bytecode = circuit.decode_bytecode()?;

        let backend = self
            .factory
            .create_backend(&bytecode, self.config.threads)
            .map_err(engine_init)?;

        Ok(LoadedRuntime {
            circuit,
            bytecode,
            engine,
            codec,
            backend,
            prove_lock: Mutex::new(()),
        })
    }

    /// Updates the status while `cell` is still the live slot. Returns false
    /// for a load orphaned by [`Self::reset`].
    fn set_status_for(&self, cell: &RuntimeSlot, status: RuntimeStatus) -> bool {
        let slot = lock_recover(&self.slot);
        let current = Arc::ptr_eq(&*slot, cell);
        if current {
            *lock_recover(&self.status) = status;
        }
        current
    }
}

impl Drop for LoadedRuntime {
    fn drop(&mut self) {
        if let Err(err) = self.backend.destroy() {
            tracing::warn!(error = %err, "failed to destroy proving backend");
        }
    }
}

impl LoadedRuntime {
    fn prove(
        &self,
        witness: &SecretWordWitness,
        options: ProofOptions,
    ) -> Result<ProofArtifact, ProofError> {
        let _guard = self
            .prove_lock
            .lock()
            .map_err(|_| ProofError::StateUnavailable("prover lock poisoned".into()))?;

        let inputs = self
            .codec
            .encode(&self.circuit.abi, &witness.to_input_map())
            .map_err(|err| ProofError::MalformedWitness(err.to_string()))?;

        let solved = self
            .engine
            .execute(&self.bytecode, &inputs)
            .map_err(|err| match err {
                EngineError::Execution(message) => ProofError::IncorrectSecret(message),
                other => ProofError::ProvingFailed(other.to_string()),
            })?;

        let proof = self
            .backend
            .generate_proof(&solved, options)
            .map_err(proving_failed)?;

        if !self
            .backend
            .verify_proof(&proof, options)
            .map_err(proving_failed)?
        {
            return Err(ProofError::ProofSelfVerificationFailed);
        }

        let expected = self.circuit.public_input_count();
        if proof.public_inputs.len() != expected {
            return Err(ProofError::ProvingFailed(format!(
                "backend returned {} public inputs, circuit declares {expected}",
                proof.public_inputs.len()
            )));
        }

        let verification_key = self
            .backend
            .verification_key(options)
            .map_err(proving_failed)?;
        let public_inputs_bytes = flatten_public_inputs(&proof.public_inputs)?;

        tracing::debug!(
            proof_len = proof.proof.len(),
            public_inputs = proof.public_inputs.len(),
            "proof generated and verified"
        );

        Ok(ProofArtifact {
            proof_bytes: proof.proof,
            verification_key,
            public_inputs: proof.public_inputs,
            public_inputs_bytes,
            is_valid: true,
        })
    }
}

fn engine_init(err: EngineError) -> ProofError {
    ProofError::EngineInit(err.to_string())
}

fn proving_failed(err: EngineError) -> ProofError {
    ProofError::ProvingFailed(err.to_string())
}

fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
