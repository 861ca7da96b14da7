//! End-to-end proof runtime behaviour against the stub engine.

#![cfg(feature = "stub")]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use zk::backend::stub::{MINIMAL_WASM, secret_word_circuit_json, supported_circuit_json};
use zk::{
    AssetPaths, AssetSource, EngineError, EngineFactory, MemoryAssetSource, ProofData,
    ProofError, ProofOptions, ProofRuntime, ProofRuntimeConfig, ProvingBackend, RuntimeStatus,
    SolvedWitness, StubEngineFactory, flatten_public_inputs, hash_secret_word, matches_commitment,
    prepare_witness,
};

const OPEN_SESAME_HASH: &str = "51b496726b4eaf172fa79885d33f61456a9e1d08576ae19f49b61a8c72ca84dd";

/// Memory source that counts fetches and can swap the circuit document.
struct CountingSource {
    inner: std::sync::Mutex<MemoryAssetSource>,
    fetches: AtomicUsize,
}

impl CountingSource {
    fn new(circuit_json: String) -> Self {
        Self {
            inner: std::sync::Mutex::new(MemoryAssetSource::stub_bundle(
                &AssetPaths::default(),
                circuit_json,
            )),
            fetches: AtomicUsize::new(0),
        }
    }

    fn replace_circuit(&self, circuit_json: String) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MemoryAssetSource::stub_bundle(&AssetPaths::default(), circuit_json);
    }
}

#[async_trait]
impl AssetSource for CountingSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, ProofError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.lock().unwrap().clone();
        inner.fetch(path).await
    }

    fn describe(&self) -> String {
        "counting".into()
    }
}

fn stub_runtime() -> (ProofRuntime, StubEngineFactory) {
    let factory = StubEngineFactory::new();
    let config = ProofRuntimeConfig::default();
    let source = MemoryAssetSource::stub_bundle(&config.paths, supported_circuit_json());
    (
        ProofRuntime::new(config, Arc::new(source), Arc::new(factory.clone())),
        factory,
    )
}

#[tokio::test]
async fn open_sesame_challenge_proves() {
    assert_eq!(hash_secret_word("OPEN_SESAME").unwrap(), OPEN_SESAME_HASH);

    // wrong case never reaches the prover
    assert!(!matches_commitment("open_sesame", OPEN_SESAME_HASH).unwrap());

    let (runtime, _) = stub_runtime();
    let witness = prepare_witness("OPEN_SESAME", OPEN_SESAME_HASH).unwrap();
    let artifact = runtime.prove_and_verify(&witness).await.unwrap();

    assert!(artifact.is_valid);
    assert_eq!(artifact.public_inputs.len(), 32);
    assert_eq!(artifact.public_inputs_bytes.len(), 32 * 32);
    assert_eq!(
        artifact.public_inputs_bytes,
        flatten_public_inputs(&artifact.public_inputs).unwrap()
    );

    // each public input word carries one byte of the commitment
    let hash_bytes = hex::decode(OPEN_SESAME_HASH).unwrap();
    for (i, byte) in hash_bytes.iter().enumerate() {
        assert_eq!(artifact.public_inputs_bytes[i * 32 + 31], *byte);
    }

    let transport = artifact.to_transport();
    assert_eq!(transport.decode().unwrap(), artifact);
}

#[tokio::test]
async fn mismatched_pair_is_incorrect_secret() {
    let (runtime, factory) = stub_runtime();
    let witness = prepare_witness("open_sesame", OPEN_SESAME_HASH).unwrap();

    let err = runtime.prove_and_verify(&witness).await.unwrap_err();
    assert!(err.is_incorrect_secret(), "{err:?}");
    assert_eq!(factory.backends_destroyed(), 0);

    // the runtime is still usable for the right secret
    let witness = prepare_witness("OPEN_SESAME", OPEN_SESAME_HASH).unwrap();
    assert!(runtime.prove_and_verify(&witness).await.unwrap().is_valid);
}

/// Proof calls seen by an [`InstrumentedBackend`].
#[derive(Default)]
struct BackendCalls {
    proofs: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

/// Stub backend that counts proofs and records how many ran at once.
struct InstrumentedBackend {
    inner: Box<dyn ProvingBackend>,
    calls: Arc<BackendCalls>,
}

impl ProvingBackend for InstrumentedBackend {
    fn generate_proof(
        &self,
        witness: &SolvedWitness,
        options: ProofOptions,
    ) -> Result<ProofData, EngineError> {
        let active = self.calls.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.max_active.fetch_max(active, Ordering::SeqCst);
        self.calls.proofs.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        let proof = self.inner.generate_proof(witness, options);
        self.calls.active.fetch_sub(1, Ordering::SeqCst);
        proof
    }

    fn verify_proof(&self, proof: &ProofData, options: ProofOptions) -> Result<bool, EngineError> {
        self.inner.verify_proof(proof, options)
    }

    fn verification_key(&self, options: ProofOptions) -> Result<Vec<u8>, EngineError> {
        self.inner.verification_key(options)
    }

    fn destroy(&self) -> Result<(), EngineError> {
        self.inner.destroy()
    }
}

#[derive(Default)]
struct InstrumentedFactory {
    stub: StubEngineFactory,
    calls: Arc<BackendCalls>,
}

impl EngineFactory for InstrumentedFactory {
    fn init_circuit_engine(
        &self,
        wasm: &[u8],
    ) -> Result<Box<dyn zk::CircuitEngine>, EngineError> {
        self.stub.init_circuit_engine(wasm)
    }

    fn init_abi_codec(&self, wasm: &[u8]) -> Result<Box<dyn zk::AbiCodec>, EngineError> {
        self.stub.init_abi_codec(wasm)
    }

    fn create_backend(
        &self,
        bytecode: &[u8],
        threads: usize,
    ) -> Result<Box<dyn ProvingBackend>, EngineError> {
        Ok(Box::new(InstrumentedBackend {
            inner: self.stub.create_backend(bytecode, threads)?,
            calls: Arc::clone(&self.calls),
        }))
    }
}

fn instrumented_runtime() -> (ProofRuntime, Arc<BackendCalls>) {
    let factory = InstrumentedFactory::default();
    let calls = Arc::clone(&factory.calls);
    let config = ProofRuntimeConfig::default();
    let source = MemoryAssetSource::stub_bundle(&config.paths, supported_circuit_json());
    (
        ProofRuntime::new(config, Arc::new(source), Arc::new(factory)),
        calls,
    )
}

#[tokio::test]
async fn every_attempt_is_proved_fresh() {
    let (runtime, calls) = instrumented_runtime();
    let hash = hash_secret_word("correct").unwrap();
    let witness = prepare_witness("correct", &hash).unwrap();

    let first = runtime.prove_and_verify(&witness).await.unwrap();
    let second = runtime.prove_and_verify(&witness).await.unwrap();

    assert_eq!(calls.proofs.load(Ordering::SeqCst), 2);
    assert_eq!(first, second);
}

#[tokio::test]
async fn concurrent_proofs_take_turns() {
    let (runtime, calls) = instrumented_runtime();
    let hash = hash_secret_word("correct").unwrap();
    let witness = prepare_witness("correct", &hash).unwrap();

    let (a, b) = tokio::join!(
        runtime.prove_and_verify(&witness),
        runtime.prove_and_verify(&witness)
    );

    assert!(a.unwrap().is_valid);
    assert!(b.unwrap().is_valid);
    assert_eq!(calls.proofs.load(Ordering::SeqCst), 2);
    assert_eq!(calls.max_active.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn version_mismatch_leaves_cache_unset() {
    let source = Arc::new(CountingSource::new(secret_word_circuit_json("0.36.0")));
    let runtime = ProofRuntime::new(
        ProofRuntimeConfig::default(),
        source.clone(),
        Arc::new(StubEngineFactory::new()),
    );

    let err = runtime.initialize().await.unwrap_err();
    assert!(matches!(err, ProofError::RuntimeVersionMismatch { .. }));
    assert!(matches!(runtime.status(), RuntimeStatus::Failed(_)));
    assert_eq!(source.fetches.load(Ordering::SeqCst), 3);

    // next call fetches again instead of returning a broken instance
    assert!(runtime.initialize().await.is_err());
    assert_eq!(source.fetches.load(Ordering::SeqCst), 6);

    source.replace_circuit(supported_circuit_json());
    runtime.initialize().await.unwrap();
    assert_eq!(runtime.status(), RuntimeStatus::Ready);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 9);

    runtime.warmup().await.unwrap();
    assert_eq!(source.fetches.load(Ordering::SeqCst), 9);
}

#[tokio::test]
async fn missing_asset_fails_initialisation() {
    let config = ProofRuntimeConfig::default();
    let mut source = MemoryAssetSource::stub_bundle(&config.paths, supported_circuit_json());
    source.remove(&config.paths.abi_codec_wasm);
    let runtime = ProofRuntime::new(
        config,
        Arc::new(source),
        Arc::new(StubEngineFactory::new()),
    );

    let err = runtime.warmup().await.unwrap_err();
    match &err {
        ProofError::AssetMissing { path, .. } => {
            assert_eq!(path, "zk/wasm/noirc_abi_wasm_bg.wasm")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.invalidates_runtime());
    assert!(err.remediation().contains("sync the zk assets"));
}

#[tokio::test]
async fn non_wasm_engine_module_is_engine_init_failure() {
    let config = ProofRuntimeConfig::default();
    let source = MemoryAssetSource::stub_bundle(&config.paths, supported_circuit_json())
        .with(config.paths.circuit_engine_wasm.clone(), b"<html>404</html>".to_vec());
    let runtime = ProofRuntime::new(
        config,
        Arc::new(source),
        Arc::new(StubEngineFactory::new()),
    );
    assert!(matches!(
        runtime.warmup().await,
        Err(ProofError::EngineInit(_))
    ));
}

/// Factory whose backend emits proofs that never verify.
struct CorruptFactory;

struct CorruptBackend;

impl ProvingBackend for CorruptBackend {
    fn generate_proof(
        &self,
        witness: &SolvedWitness,
        _options: ProofOptions,
    ) -> Result<ProofData, EngineError> {
        Ok(ProofData {
            proof: vec![0; 8],
            public_inputs: witness.public_inputs.clone(),
        })
    }

    fn verify_proof(&self, _proof: &ProofData, _options: ProofOptions) -> Result<bool, EngineError> {
        Ok(false)
    }

    fn verification_key(&self, _options: ProofOptions) -> Result<Vec<u8>, EngineError> {
        Ok(vec![])
    }

    fn destroy(&self) -> Result<(), EngineError> {
        Err(EngineError::Teardown("already gone".into()))
    }
}

impl EngineFactory for CorruptFactory {
    fn init_circuit_engine(
        &self,
        wasm: &[u8],
    ) -> Result<Box<dyn zk::CircuitEngine>, EngineError> {
        StubEngineFactory::new().init_circuit_engine(wasm)
    }

    fn init_abi_codec(&self, wasm: &[u8]) -> Result<Box<dyn zk::AbiCodec>, EngineError> {
        StubEngineFactory::new().init_abi_codec(wasm)
    }

    fn create_backend(
        &self,
        _bytecode: &[u8],
        _threads: usize,
    ) -> Result<Box<dyn ProvingBackend>, EngineError> {
        Ok(Box::new(CorruptBackend))
    }
}

#[tokio::test]
async fn self_verification_failure_resets_runtime() {
    let config = ProofRuntimeConfig::default();
    let source = MemoryAssetSource::stub_bundle(&config.paths, supported_circuit_json());
    let runtime = ProofRuntime::new(config, Arc::new(source), Arc::new(CorruptFactory));

    let witness = prepare_witness("OPEN_SESAME", OPEN_SESAME_HASH).unwrap();
    let err = runtime.prove_and_verify(&witness).await.unwrap_err();
    assert_eq!(err, ProofError::ProofSelfVerificationFailed);

    // teardown error was swallowed and the cache cleared
    assert_eq!(runtime.status(), RuntimeStatus::Uninitialized);
}

#[test]
fn minimal_wasm_has_magic() {
    assert!(zk::backend::is_wasm_module(MINIMAL_WASM));
}
