//! Proof errors and the proof artifact handed to settlement.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::commitment::CommitmentError;
use crate::encoding::EncodingError;

/// Errors that can occur while initialising the runtime or producing a proof.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofError {
    #[error(transparent)]
    Commitment(#[from] CommitmentError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("asset missing: {path} ({reason})")]
    AssetMissing {
        path: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("circuit compiled with {found}, runtime supports {supported}*")]
    RuntimeVersionMismatch { found: String, supported: String },

    #[error("invalid circuit artifact: {reason}")]
    InvalidCircuit { reason: String },

    #[error("engine initialisation failed: {0}")]
    EngineInit(String),

    #[error("malformed witness: {0}")]
    MalformedWitness(String),

    #[error("incorrect secret: circuit constraints not satisfied ({0})")]
    IncorrectSecret(String),

    #[error("proof generation failed: {0}")]
    ProvingFailed(String),

    #[error("proof failed local verification")]
    ProofSelfVerificationFailed,

    #[error("prover state unavailable: {0}")]
    StateUnavailable(String),
}

impl ProofError {
    /// Whether this failure leaves the cached runtime unusable.
    ///
    /// Callers must reset the runtime before retrying after such an error.
    pub fn invalidates_runtime(&self) -> bool {
        matches!(
            self,
            ProofError::AssetMissing { .. }
                | ProofError::RuntimeVersionMismatch { .. }
                | ProofError::InvalidCircuit { .. }
                | ProofError::EngineInit(_)
                | ProofError::ProvingFailed(_)
                | ProofError::ProofSelfVerificationFailed
                | ProofError::StateUnavailable(_)
        )
    }

    /// Wrong-secret outcomes, whether caught by the hash self-check or by the circuit.
    pub fn is_incorrect_secret(&self) -> bool {
        matches!(self, ProofError::IncorrectSecret(_))
    }

    /// Actionable text for the person at the keyboard.
    pub fn remediation(&self) -> String {
        match self {
            ProofError::Commitment(err) => format!("Check your input: {err}."),
            ProofError::Encoding(err) => format!("Public inputs could not be encoded: {err}."),
            ProofError::AssetMissing { path, .. } => format!(
                "ZK asset `{path}` is missing. Rebuild the circuit and sync the zk assets, then reload."
            ),
            ProofError::RuntimeVersionMismatch { .. } | ProofError::InvalidCircuit { .. } => {
                "ZK runtime mismatch. Rebuild the circuit and sync the zk assets, then reload."
                    .to_string()
            }
            ProofError::EngineInit(_) => {
                "The proving engine failed to start. Reload and try again.".to_string()
            }
            ProofError::MalformedWitness(_) => {
                "Proof input was malformed. Re-enter the secret and try again.".to_string()
            }
            ProofError::IncorrectSecret(_) => {
                "Incorrect secret for this challenge. Try another guess.".to_string()
            }
            ProofError::ProvingFailed(_) | ProofError::StateUnavailable(_) => {
                "Proof generation failed. Retry once; if it keeps failing, rebuild and reload."
                    .to_string()
            }
            ProofError::ProofSelfVerificationFailed => {
                "Generated proof did not verify locally. Rebuild the zk assets and reload."
                    .to_string()
            }
        }
    }
}

/// Output of one successful `prove_and_verify` call.
///
/// Only constructed after local verification passed, so `is_valid` is always
/// `true` on artifacts produced by the runtime. It stays a field because the
/// settlement layer also accepts artifacts that crossed a transport boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofArtifact {
    pub proof_bytes: Vec<u8>,
    pub verification_key: Vec<u8>,
    /// Field-element strings in circuit order.
    pub public_inputs: Vec<String>,
    /// `public_inputs` flattened to 32-byte big-endian words.
    pub public_inputs_bytes: Vec<u8>,
    pub is_valid: bool,
}

/// Base64 transport encoding of a [`ProofArtifact`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofTransport {
    pub proof_base64: String,
    pub verification_key_base64: String,
    pub public_inputs: Vec<String>,
    pub public_inputs_base64: String,
    pub is_valid: bool,
}

impl ProofArtifact {
    pub fn to_transport(&self) -> ProofTransport {
        ProofTransport {
            proof_base64: STANDARD.encode(&self.proof_bytes),
            verification_key_base64: STANDARD.encode(&self.verification_key),
            public_inputs: self.public_inputs.clone(),
            public_inputs_base64: STANDARD.encode(&self.public_inputs_bytes),
            is_valid: self.is_valid,
        }
    }
}

impl ProofTransport {
    /// Decodes the base64 fields back into raw bytes.
    pub fn decode(&self) -> Result<ProofArtifact, base64::DecodeError> {
        Ok(ProofArtifact {
            proof_bytes: STANDARD.decode(&self.proof_base64)?,
            verification_key: STANDARD.decode(&self.verification_key_base64)?,
            public_inputs: self.public_inputs.clone(),
            public_inputs_bytes: STANDARD.decode(&self.public_inputs_base64)?,
            is_valid: self.is_valid,
        })
    }
}
