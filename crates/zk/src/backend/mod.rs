//! Pluggable proving engines.
//!
//! A proof runs through three collaborators, each created by an
//! [`EngineFactory`] from the assets the runtime fetched:
//! - [`CircuitEngine`] solves the circuit for an encoded input map
//! - [`AbiCodec`] validates and encodes the input map against the ABI
//! - [`ProvingBackend`] turns a solved witness into a proof and checks it
//!
//! # Available Engines
//!
//! - **Stub** (`stub` feature): native secret-word engine with digest proofs
//!
//! All engine methods are synchronous and CPU-bound. The runtime host runs
//! them on a dedicated thread.

#[cfg(feature = "stub")]
pub mod stub;

use num_bigint::BigUint;
use serde_json::{Map, Value};

use crate::abi::{AbiError, EncodedInputs, encode_inputs};
use crate::artifact::Abi;

/// Errors reported by engine implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("engine initialisation failed: {0}")]
    Init(String),

    /// The witness does not satisfy the circuit.
    #[error("{0}")]
    Execution(String),

    #[error("{0}")]
    Proving(String),

    #[error("{0}")]
    Teardown(String),
}

/// Proof generation options shared by generate, verify and key extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOptions {
    /// Use the keccak transcript expected by the on-chain verifier.
    pub keccak: bool,
}

impl Default for ProofOptions {
    fn default() -> Self {
        Self { keccak: true }
    }
}

/// Satisfying assignment produced by circuit execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedWitness {
    pub values: Vec<BigUint>,
    /// Public outputs as field strings, in circuit order.
    pub public_inputs: Vec<String>,
}

/// Raw proof as produced by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofData {
    pub proof: Vec<u8>,
    pub public_inputs: Vec<String>,
}

pub trait CircuitEngine: Send + Sync {
    /// Executes the circuit; an unsatisfied constraint is [`EngineError::Execution`].
    fn execute(&self, bytecode: &[u8], inputs: &EncodedInputs)
    -> Result<SolvedWitness, EngineError>;
}

pub trait AbiCodec: Send + Sync {
    fn encode(&self, abi: &Abi, inputs: &Map<String, Value>) -> Result<EncodedInputs, AbiError>;
}

pub trait ProvingBackend: Send + Sync {
    fn generate_proof(
        &self,
        witness: &SolvedWitness,
        options: ProofOptions,
    ) -> Result<ProofData, EngineError>;

    fn verify_proof(&self, proof: &ProofData, options: ProofOptions) -> Result<bool, EngineError>;

    fn verification_key(&self, options: ProofOptions) -> Result<Vec<u8>, EngineError>;

    /// Releases backend resources. The backend must not be used afterwards.
    fn destroy(&self) -> Result<(), EngineError>;
}

/// Builds engines from fetched assets.
pub trait EngineFactory: Send + Sync {
    fn init_circuit_engine(&self, wasm: &[u8]) -> Result<Box<dyn CircuitEngine>, EngineError>;

    fn init_abi_codec(&self, wasm: &[u8]) -> Result<Box<dyn AbiCodec>, EngineError>;

    fn create_backend(
        &self,
        bytecode: &[u8],
        threads: usize,
    ) -> Result<Box<dyn ProvingBackend>, EngineError>;
}

/// ABI codec backed by [`crate::abi::encode_inputs`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeAbiCodec;

impl AbiCodec for NativeAbiCodec {
    fn encode(&self, abi: &Abi, inputs: &Map<String, Value>) -> Result<EncodedInputs, AbiError> {
        encode_inputs(abi, inputs)
    }
}

/// Checks the `\0asm` magic at the start of a WebAssembly module.
pub fn is_wasm_module(bytes: &[u8]) -> bool {
    bytes.starts_with(b"\0asm")
}
