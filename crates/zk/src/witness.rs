//! Private witness for the secret-word circuit.

use serde::{Deserialize, Serialize};

use crate::commitment::{
    CommitmentError, HASH_BYTE_LENGTH, SECRET_WORD_BYTE_LENGTH, decode_hash, encode_secret_word,
};

/// A witness array with the wrong width for the circuit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} must be a {expected}-byte array, got {actual}")]
pub struct WitnessShapeError {
    pub field: &'static str,
    pub expected: usize,
    pub actual: usize,
}

/// Input map for the secret-word circuit.
///
/// Field names match the circuit ABI. Values are plain bytes (0–255) so the
/// witness can cross a thread or process boundary as ordinary data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretWordWitness {
    pub secret_word: Vec<u8>,
    pub expected_hash: Vec<u8>,
}

impl SecretWordWitness {
    /// Builds the witness from a human secret and a hex commitment.
    ///
    /// Uses the same padding routine as [`crate::commitment::hash_secret_word`].
    pub fn prepare(secret: &str, expected_hash_hex: &str) -> Result<Self, CommitmentError> {
        let secret_word = encode_secret_word(secret)?;
        let expected_hash = decode_hash(expected_hash_hex)?;
        Ok(Self {
            secret_word: secret_word.to_vec(),
            expected_hash: expected_hash.to_vec(),
        })
    }

    /// Checks the fixed array widths expected by the circuit.
    pub fn validate_shape(&self) -> Result<(), WitnessShapeError> {
        check_width("secret_word", &self.secret_word, SECRET_WORD_BYTE_LENGTH)?;
        check_width("expected_hash", &self.expected_hash, HASH_BYTE_LENGTH)
    }

    /// Converts the witness into the generic ABI input map.
    pub fn to_input_map(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("secret_word".into(), bytes_to_json(&self.secret_word));
        map.insert("expected_hash".into(), bytes_to_json(&self.expected_hash));
        map
    }
}

fn check_width(field: &'static str, bytes: &[u8], expected: usize) -> Result<(), WitnessShapeError> {
    if bytes.len() == expected {
        Ok(())
    } else {
        Err(WitnessShapeError {
            field,
            expected,
            actual: bytes.len(),
        })
    }
}

fn bytes_to_json(bytes: &[u8]) -> serde_json::Value {
    serde_json::Value::Array(bytes.iter().map(|&b| serde_json::Value::from(b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::hash_secret_word;

    #[test]
    fn prepare_uses_commitment_padding() {
        let hash = hash_secret_word("correct").unwrap();
        let witness = SecretWordWitness::prepare("correct", &hash).unwrap();
        assert_eq!(witness.secret_word.len(), 16);
        assert_eq!(&witness.secret_word[..7], b"correct");
        assert_eq!(hex::encode(&witness.expected_hash), hash);
        assert!(witness.validate_shape().is_ok());
    }

    #[test]
    fn shape_validation_reports_offending_field() {
        let witness = SecretWordWitness {
            secret_word: vec![0; 15],
            expected_hash: vec![0; 32],
        };
        assert_eq!(
            witness.validate_shape().unwrap_err(),
            WitnessShapeError {
                field: "secret_word",
                expected: 16,
                actual: 15,
            }
        );

        let witness = SecretWordWitness {
            secret_word: vec![0; 16],
            expected_hash: vec![0; 31],
        };
        let err = witness.validate_shape().unwrap_err();
        assert_eq!(err.field, "expected_hash");
        assert_eq!(err.to_string(), "expected_hash must be a 32-byte array, got 31");
    }

    #[test]
    fn input_map_uses_abi_names() {
        let witness = SecretWordWitness {
            secret_word: vec![1; 16],
            expected_hash: vec![2; 32],
        };
        let map = witness.to_input_map();
        assert_eq!(map["secret_word"].as_array().unwrap().len(), 16);
        assert_eq!(map["expected_hash"][0], 2);
    }
}
