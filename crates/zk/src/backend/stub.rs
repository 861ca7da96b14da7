//! Stub engine for development and testing.
//!
//! Evaluates the secret-word relation natively and "proves" it with a digest
//! over the verification key and public inputs.
//!
//! **Warning**: Provides no cryptographic guarantees - do not use in production.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use blake2::{Blake2s256, Digest};
use num_bigint::BigUint;

use super::{
    CircuitEngine, EngineError, EngineFactory, NativeAbiCodec, ProofData, ProofOptions,
    ProvingBackend, SolvedWitness, AbiCodec, is_wasm_module,
};
use crate::abi::EncodedInputs;
use crate::artifact::SUPPORTED_NOIR_VERSION_PREFIX;
use crate::commitment::{HASH_BYTE_LENGTH, SECRET_WORD_BYTE_LENGTH, hash_padded};
use crate::encoding::{flatten_public_inputs, format_field};

const VK_DOMAIN: &[u8] = b"cipherforge-stub-vk-v1";

/// Smallest valid WebAssembly module (magic + version 1).
pub const MINIMAL_WASM: &[u8] = b"\0asm\x01\x00\x00\x00";

/// Bytecode placeholder embedded in [`secret_word_circuit_json`].
pub const STUB_BYTECODE: &[u8] = b"cipherforge-secret-word-stub";

/// Compiled-circuit document for the secret-word circuit.
pub fn secret_word_circuit_json(noir_version: &str) -> String {
    use base64::{Engine, engine::general_purpose::STANDARD};

    let u8_array = |length: usize| {
        serde_json::json!({
            "kind": "array",
            "length": length,
            "type": {"kind": "integer", "sign": "unsigned", "width": 8}
        })
    };
    serde_json::json!({
        "noir_version": noir_version,
        "bytecode": STANDARD.encode(STUB_BYTECODE),
        "abi": {
            "parameters": [
                {"name": "secret_word", "type": u8_array(SECRET_WORD_BYTE_LENGTH), "visibility": "private"},
                {"name": "expected_hash", "type": u8_array(HASH_BYTE_LENGTH), "visibility": "public"}
            ],
            "return_type": null
        }
    })
    .to_string()
}

/// Same as [`secret_word_circuit_json`] with the supported compiler version.
pub fn supported_circuit_json() -> String {
    secret_word_circuit_json(&format!("{SUPPORTED_NOIR_VERSION_PREFIX}+stub"))
}

/// Factory for the stub engine. Clones share their counters.
#[derive(Debug, Clone, Default)]
pub struct StubEngineFactory {
    counters: Arc<StubCounters>,
}

#[derive(Debug, Default)]
struct StubCounters {
    backends_created: AtomicUsize,
    backends_destroyed: AtomicUsize,
}

impl StubEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backends_created(&self) -> usize {
        self.counters.backends_created.load(Ordering::Relaxed)
    }

    pub fn backends_destroyed(&self) -> usize {
        self.counters.backends_destroyed.load(Ordering::Relaxed)
    }
}

impl EngineFactory for StubEngineFactory {
    fn init_circuit_engine(&self, wasm: &[u8]) -> Result<Box<dyn CircuitEngine>, EngineError> {
        if !is_wasm_module(wasm) {
            return Err(EngineError::Init("circuit engine module is not wasm".into()));
        }
        Ok(Box::new(StubCircuitEngine))
    }

    fn init_abi_codec(&self, wasm: &[u8]) -> Result<Box<dyn AbiCodec>, EngineError> {
        if !is_wasm_module(wasm) {
            return Err(EngineError::Init("abi codec module is not wasm".into()));
        }
        Ok(Box::new(NativeAbiCodec))
    }

    fn create_backend(
        &self,
        bytecode: &[u8],
        threads: usize,
    ) -> Result<Box<dyn ProvingBackend>, EngineError> {
        if bytecode.is_empty() {
            return Err(EngineError::Init("empty circuit bytecode".into()));
        }
        tracing::debug!(threads, bytecode_len = bytecode.len(), "creating stub backend");
        self.counters.backends_created.fetch_add(1, Ordering::Relaxed);

        let mut hasher = Blake2s256::new();
        hasher.update(VK_DOMAIN);
        hasher.update(bytecode);
        Ok(Box::new(StubBackend {
            vk: hasher.finalize().to_vec(),
            destroyed: AtomicBool::new(false),
            counters: Arc::clone(&self.counters),
        }))
    }
}

/// Checks `blake2s(secret_word) == expected_hash` on the encoded inputs.
#[derive(Debug, Clone, Copy)]
pub struct StubCircuitEngine;

impl CircuitEngine for StubCircuitEngine {
    fn execute(
        &self,
        _bytecode: &[u8],
        inputs: &EncodedInputs,
    ) -> Result<SolvedWitness, EngineError> {
        let expected_len = SECRET_WORD_BYTE_LENGTH + HASH_BYTE_LENGTH;
        if inputs.fields.len() != expected_len {
            return Err(EngineError::Execution(format!(
                "expected {expected_len} witness values, got {}",
                inputs.fields.len()
            )));
        }

        let bytes = inputs
            .fields
            .iter()
            .map(field_to_byte)
            .collect::<Result<Vec<u8>, _>>()?;

        let mut secret = [0u8; SECRET_WORD_BYTE_LENGTH];
        secret.copy_from_slice(&bytes[..SECRET_WORD_BYTE_LENGTH]);
        if hash_padded(&secret)[..] != bytes[SECRET_WORD_BYTE_LENGTH..] {
            return Err(EngineError::Execution(
                "Cannot satisfy constraint: blake2s(secret_word) != expected_hash".into(),
            ));
        }

        Ok(SolvedWitness {
            values: inputs.fields.clone(),
            public_inputs: inputs.public_fields().map(format_field).collect(),
        })
    }
}

fn field_to_byte(field: &BigUint) -> Result<u8, EngineError> {
    match field.to_u64_digits().as_slice() {
        [] => Ok(0),
        [value] if *value <= u8::MAX as u64 => Ok(*value as u8),
        _ => Err(EngineError::Execution(format!("witness value {field} exceeds u8"))),
    }
}

struct StubBackend {
    vk: Vec<u8>,
    destroyed: AtomicBool,
    counters: Arc<StubCounters>,
}

impl StubBackend {
    fn ensure_live(&self) -> Result<(), EngineError> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(EngineError::Proving("backend already destroyed".into()));
        }
        Ok(())
    }

    fn sign(&self, public_inputs: &[String], options: ProofOptions) -> Result<Vec<u8>, EngineError> {
        let flattened = flatten_public_inputs(public_inputs)
            .map_err(|err| EngineError::Proving(err.to_string()))?;
        let mut hasher = Blake2s256::new();
        hasher.update(&self.vk);
        hasher.update([options.keccak as u8]);
        hasher.update(&flattened);
        Ok(hasher.finalize().to_vec())
    }
}

impl ProvingBackend for StubBackend {
    fn generate_proof(
        &self,
        witness: &SolvedWitness,
        options: ProofOptions,
    ) -> Result<ProofData, EngineError> {
        self.ensure_live()?;
        Ok(ProofData {
            proof: self.sign(&witness.public_inputs, options)?,
            public_inputs: witness.public_inputs.clone(),
        })
    }

    fn verify_proof(&self, proof: &ProofData, options: ProofOptions) -> Result<bool, EngineError> {
        self.ensure_live()?;
        Ok(self.sign(&proof.public_inputs, options)? == proof.proof)
    }

    fn verification_key(&self, _options: ProofOptions) -> Result<Vec<u8>, EngineError> {
        self.ensure_live()?;
        Ok(self.vk.clone())
    }

    fn destroy(&self) -> Result<(), EngineError> {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return Err(EngineError::Teardown("backend already destroyed".into()));
        }
        self.counters
            .backends_destroyed
            .fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::CompiledCircuit;
    use crate::witness::SecretWordWitness;
    use crate::commitment::hash_secret_word;

    fn encoded(secret: &str, hash: &str) -> EncodedInputs {
        let circuit = CompiledCircuit::from_json(supported_circuit_json().as_bytes()).unwrap();
        let witness = SecretWordWitness::prepare(secret, hash).unwrap();
        NativeAbiCodec
            .encode(&circuit.abi, &witness.to_input_map())
            .unwrap()
    }

    #[test]
    fn solves_only_matching_witnesses() {
        let hash = hash_secret_word("correct").unwrap();
        let solved = StubCircuitEngine
            .execute(STUB_BYTECODE, &encoded("correct", &hash))
            .unwrap();
        assert_eq!(solved.public_inputs.len(), 32);

        let err = StubCircuitEngine
            .execute(STUB_BYTECODE, &encoded("wrong", &hash))
            .unwrap_err();
        assert!(err.to_string().contains("Cannot satisfy constraint"));
    }

    #[test]
    fn proofs_bind_options_and_inputs() {
        let factory = StubEngineFactory::new();
        let backend = factory.create_backend(STUB_BYTECODE, 1).unwrap();
        let hash = hash_secret_word("correct").unwrap();
        let solved = StubCircuitEngine
            .execute(STUB_BYTECODE, &encoded("correct", &hash))
            .unwrap();

        let keccak = ProofOptions { keccak: true };
        let proof = backend.generate_proof(&solved, keccak).unwrap();
        assert!(backend.verify_proof(&proof, keccak).unwrap());
        assert!(!backend.verify_proof(&proof, ProofOptions { keccak: false }).unwrap());

        let mut tampered = proof.clone();
        tampered.public_inputs.swap(0, 1);
        assert!(!backend.verify_proof(&tampered, keccak).unwrap());
    }

    #[test]
    fn destroy_is_tracked_and_final() {
        let factory = StubEngineFactory::new();
        let backend = factory.create_backend(STUB_BYTECODE, 1).unwrap();
        backend.destroy().unwrap();
        assert_eq!(factory.backends_created(), 1);
        assert_eq!(factory.backends_destroyed(), 1);
        assert!(backend.verification_key(ProofOptions::default()).is_err());
        assert!(backend.destroy().is_err());
    }

    #[test]
    fn rejects_non_wasm_modules() {
        let factory = StubEngineFactory::new();
        assert!(factory.init_circuit_engine(b"not wasm").is_err());
        assert!(factory.init_abi_codec(MINIMAL_WASM).is_ok());
    }
}
