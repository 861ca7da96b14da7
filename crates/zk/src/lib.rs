//! Secret-word proof pipeline.
//!
//! This crate covers everything between a human secret and a proof the game
//! contract can check:
//! - **Commitment**: BLAKE2s commitment over the 16-byte zero-padded secret
//! - **Encoding**: public inputs as 32-byte big-endian words for the contract
//! - **Runtime**: asset loading, engine lifecycle, prove + self-verify, reset
//!
//! # Feature Flags
//!
//! - `stub` (default): native development engine, no cryptographic guarantees
//! - `http` (default): fetch runtime assets over HTTP with `reqwest`
//!
//! # Examples
//!
//! ```toml
//! # Default: stub engine + HTTP assets
//! zk = { path = "../zk" }
//!
//! # Commitment and encoding only
//! zk = { path = "../zk", default-features = false }
//! ```

pub mod abi;
pub mod artifact;
pub mod assets;
pub mod backend;
pub mod commitment;
pub mod encoding;
pub mod prover;
pub mod runtime;
pub mod witness;

pub use abi::{AbiError, EncodedInputs, encode_inputs};
pub use artifact::{
    Abi, AbiParameter, AbiType, CompiledCircuit, SUPPORTED_NOIR_VERSION_PREFIX, Sign, Visibility,
};
#[cfg(feature = "http")]
pub use assets::HttpAssetSource;
pub use assets::{
    AssetCheck, AssetPaths, AssetSource, FsAssetSource, MemoryAssetSource, ZK_ASSET_VERSION,
    check_assets,
};
pub use backend::{
    AbiCodec, CircuitEngine, EngineError, EngineFactory, NativeAbiCodec, ProofData, ProofOptions,
    ProvingBackend, SolvedWitness,
};
pub use commitment::{
    CommitmentError, HASH_BYTE_LENGTH, SECRET_WORD_BYTE_LENGTH, decode_hash, encode_secret_word,
    hash_padded, hash_secret_word, matches_commitment, normalize_hash,
};
pub use encoding::{
    EncodingError, FIELD_BYTE_LENGTH, field_to_bytes32, flatten_public_inputs, format_field,
    parse_field,
};
pub use prover::{ProofArtifact, ProofError, ProofTransport};
pub use runtime::{ProofRuntime, ProofRuntimeConfig, RuntimeStatus};
pub use witness::{SecretWordWitness, WitnessShapeError};

#[cfg(feature = "stub")]
pub use backend::stub::StubEngineFactory;

/// Builds the secret-word witness for `secret` against a hex commitment.
pub fn prepare_witness(
    secret: &str,
    expected_hash_hex: &str,
) -> Result<SecretWordWitness, CommitmentError> {
    SecretWordWitness::prepare(secret, expected_hash_hex)
}
