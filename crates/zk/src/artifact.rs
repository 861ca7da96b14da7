//! Compiled circuit artifact.
//!
//! The circuit is compiled ahead of time and shipped as a JSON document. Only
//! the fields the runtime consumes are modelled here; everything else in the
//! document is ignored.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::prover::ProofError;

/// Compiler version prefix the on-chain verifier was built against.
pub const SUPPORTED_NOIR_VERSION_PREFIX: &str = "1.0.0-beta.18";

/// Compiled circuit as loaded from `secret_word_puzzle.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledCircuit {
    #[serde(default)]
    pub noir_version: Option<String>,
    /// Base64 ACIR bytecode.
    pub bytecode: String,
    pub abi: Abi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Abi {
    pub parameters: Vec<AbiParameter>,
    #[serde(default)]
    pub return_type: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbiParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: AbiType,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Signed,
    Unsigned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AbiType {
    Field,
    Boolean,
    Integer {
        sign: Sign,
        width: u32,
    },
    Array {
        length: usize,
        #[serde(rename = "type")]
        typ: Box<AbiType>,
    },
}

impl AbiType {
    /// Number of field elements this type occupies in the witness.
    pub fn field_count(&self) -> usize {
        match self {
            AbiType::Field | AbiType::Boolean | AbiType::Integer { .. } => 1,
            AbiType::Array { length, typ } => length * typ.field_count(),
        }
    }
}

impl CompiledCircuit {
    /// Parses the artifact JSON.
    ///
    /// A document that does not parse is treated like a version mismatch: the
    /// usual cause is an artifact produced by a different compiler release.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ProofError> {
        serde_json::from_slice(bytes).map_err(|err| ProofError::InvalidCircuit {
            reason: format!("failed to deserialize circuit: {err}"),
        })
    }

    /// Fails with [`ProofError::RuntimeVersionMismatch`] unless the embedded
    /// compiler version starts with [`SUPPORTED_NOIR_VERSION_PREFIX`].
    pub fn ensure_supported_version(&self) -> Result<(), ProofError> {
        match self.noir_version.as_deref() {
            Some(version) if version.starts_with(SUPPORTED_NOIR_VERSION_PREFIX) => Ok(()),
            other => Err(ProofError::RuntimeVersionMismatch {
                found: other.unwrap_or("<missing>").to_string(),
                supported: SUPPORTED_NOIR_VERSION_PREFIX.to_string(),
            }),
        }
    }

    pub fn decode_bytecode(&self) -> Result<Vec<u8>, ProofError> {
        STANDARD
            .decode(self.bytecode.trim())
            .map_err(|err| ProofError::InvalidCircuit {
                reason: format!("bytecode is not valid base64: {err}"),
            })
    }

    /// Declared number of public field elements.
    pub fn public_input_count(&self) -> usize {
        self.abi
            .parameters
            .iter()
            .filter(|p| p.visibility == Visibility::Public)
            .map(|p| p.typ.field_count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circuit_json(version: &str) -> String {
        format!(
            r#"{{
                "noir_version": "{version}",
                "hash": 42,
                "bytecode": "AAEC",
                "abi": {{
                    "parameters": [
                        {{"name": "secret_word", "type": {{"kind": "array", "length": 16, "type": {{"kind": "integer", "sign": "unsigned", "width": 8}}}}, "visibility": "private"}},
                        {{"name": "expected_hash", "type": {{"kind": "array", "length": 32, "type": {{"kind": "integer", "sign": "unsigned", "width": 8}}}}, "visibility": "public"}}
                    ],
                    "return_type": null
                }}
            }}"#
        )
    }

    #[test]
    fn parses_noir_artifact() {
        let circuit = CompiledCircuit::from_json(circuit_json("1.0.0-beta.18+abc").as_bytes()).unwrap();
        assert_eq!(circuit.abi.parameters.len(), 2);
        assert_eq!(circuit.public_input_count(), 32);
        assert_eq!(circuit.decode_bytecode().unwrap(), vec![0, 1, 2]);
        assert!(circuit.ensure_supported_version().is_ok());
    }

    #[test]
    fn rejects_other_compiler_versions() {
        let circuit = CompiledCircuit::from_json(circuit_json("1.0.0-beta.3").as_bytes()).unwrap();
        let err = circuit.ensure_supported_version().unwrap_err();
        assert!(matches!(err, ProofError::RuntimeVersionMismatch { ref found, .. } if found == "1.0.0-beta.3"));
    }

    #[test]
    fn missing_version_is_a_mismatch() {
        let circuit = CompiledCircuit {
            noir_version: None,
            bytecode: String::new(),
            abi: Abi {
                parameters: vec![],
                return_type: None,
            },
        };
        assert!(matches!(
            circuit.ensure_supported_version(),
            Err(ProofError::RuntimeVersionMismatch { .. })
        ));
    }

    #[test]
    fn garbage_json_is_an_invalid_circuit() {
        let err = CompiledCircuit::from_json(b"{\"bytecode\": 1}").unwrap_err();
        assert!(err.to_string().contains("failed to deserialize circuit"));
        assert!(err.invalidates_runtime());
    }
}
