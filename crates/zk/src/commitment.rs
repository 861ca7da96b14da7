//! Secret-word commitment codec.
//!
//! A creator commits to a secret by publishing `BLAKE2s-256(pad16(utf8(secret)))`
//! as 64 lowercase hex characters. The same right-zero-padded buffer is used as
//! the private circuit input, so a proof can only bind to the published hash if
//! both sides pad identically. There is no salt: anyone holding the secret can
//! recompute the commitment.

use blake2::{Blake2s256, Digest};

/// Fixed width of the padded secret word (circuit input `secret_word`).
pub const SECRET_WORD_BYTE_LENGTH: usize = 16;

/// Width of the BLAKE2s digest (circuit input `expected_hash`).
pub const HASH_BYTE_LENGTH: usize = 32;

/// Errors raised while encoding secrets or decoding commitment hashes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitmentError {
    #[error(
        "secret word must be between 1 and {SECRET_WORD_BYTE_LENGTH} bytes in UTF-8, got {len}"
    )]
    InvalidSecretLength { len: usize },

    #[error("hash must be a 32-byte lowercase hex string")]
    InvalidHashFormat,
}

/// UTF-8 encodes `secret` and right-pads it with zeros to 16 bytes.
pub fn encode_secret_word(secret: &str) -> Result<[u8; SECRET_WORD_BYTE_LENGTH], CommitmentError> {
    let encoded = secret.as_bytes();
    if encoded.is_empty() || encoded.len() > SECRET_WORD_BYTE_LENGTH {
        return Err(CommitmentError::InvalidSecretLength { len: encoded.len() });
    }

    let mut padded = [0u8; SECRET_WORD_BYTE_LENGTH];
    padded[..encoded.len()].copy_from_slice(encoded);
    Ok(padded)
}

/// Hashes an already padded secret word.
pub fn hash_padded(padded: &[u8; SECRET_WORD_BYTE_LENGTH]) -> [u8; HASH_BYTE_LENGTH] {
    Blake2s256::digest(padded).into()
}

/// Computes the lowercase hex commitment for `secret`.
pub fn hash_secret_word(secret: &str) -> Result<String, CommitmentError> {
    let padded = encode_secret_word(secret)?;
    Ok(hex::encode(hash_padded(&padded)))
}

/// Trims, strips an optional `0x` prefix and lowercases `value`, then checks it
/// against `^[a-f0-9]{64}$`.
pub fn normalize_hash(value: &str) -> Result<String, CommitmentError> {
    let trimmed = value.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let normalized = stripped.to_ascii_lowercase();

    let well_formed = normalized.len() == HASH_BYTE_LENGTH * 2
        && normalized
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));

    if well_formed {
        Ok(normalized)
    } else {
        Err(CommitmentError::InvalidHashFormat)
    }
}

/// Decodes a hex commitment into its 32 raw bytes.
pub fn decode_hash(value: &str) -> Result<[u8; HASH_BYTE_LENGTH], CommitmentError> {
    let normalized = normalize_hash(value)?;
    let mut bytes = [0u8; HASH_BYTE_LENGTH];
    hex::decode_to_slice(&normalized, &mut bytes).map_err(|_| CommitmentError::InvalidHashFormat)?;
    Ok(bytes)
}

/// Local self-check: does `secret` hash to `expected_hash_hex`?
///
/// A mismatch is an ordinary outcome (`Ok(false)`), not an error.
pub fn matches_commitment(secret: &str, expected_hash_hex: &str) -> Result<bool, CommitmentError> {
    let expected = decode_hash(expected_hash_hex)?;
    let padded = encode_secret_word(secret)?;
    Ok(hash_padded(&padded) == expected)
}
