//! Public-input encoding for on-chain submission.
//!
//! The proving backend reports public inputs as field-element strings. The game
//! contract expects them as one blob of 32-byte big-endian words laid out in
//! the circuit's positional order, so reordering the fields breaks on-chain
//! verification even when the value set is unchanged.

use num_bigint::BigUint;

/// Width of one encoded field element.
pub const FIELD_BYTE_LENGTH: usize = 32;

/// Errors raised while encoding public-input field strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("public input field cannot be empty")]
    EmptyField,

    #[error("unsupported public input field format: {0}")]
    UnsupportedFieldFormat(String),

    #[error("public input field is out of 32-byte range: {0}")]
    FieldOutOfRange(String),
}

/// Parses a field string given as `0x`-hex, decimal digits, or bare hex digits.
///
/// Decimal is tried before bare hex, so `"10"` parses as ten.
pub fn parse_field(value: &str) -> Result<BigUint, EncodingError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(EncodingError::EmptyField);
    }

    let unsupported = || EncodingError::UnsupportedFieldFormat(value.to_string());

    if let Some(digits) = normalized
        .strip_prefix("0x")
        .or_else(|| normalized.strip_prefix("0X"))
    {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(unsupported());
        }
        return BigUint::parse_bytes(digits.as_bytes(), 16).ok_or_else(unsupported);
    }

    if normalized.bytes().all(|b| b.is_ascii_digit()) {
        return BigUint::parse_bytes(normalized.as_bytes(), 10).ok_or_else(unsupported);
    }

    if normalized.bytes().all(|b| b.is_ascii_hexdigit()) {
        return BigUint::parse_bytes(normalized.as_bytes(), 16).ok_or_else(unsupported);
    }

    Err(unsupported())
}

/// Encodes one field string as exactly 32 big-endian bytes, zero-padded on the left.
pub fn field_to_bytes32(value: &str) -> Result<[u8; FIELD_BYTE_LENGTH], EncodingError> {
    let field = parse_field(value)?;
    if field.bits() > (FIELD_BYTE_LENGTH as u64) * 8 {
        return Err(EncodingError::FieldOutOfRange(value.to_string()));
    }

    let be = field.to_bytes_be();
    let mut bytes = [0u8; FIELD_BYTE_LENGTH];
    bytes[FIELD_BYTE_LENGTH - be.len()..].copy_from_slice(&be);
    Ok(bytes)
}

/// Concatenates the 32-byte encodings of `fields`, preserving order.
pub fn flatten_public_inputs<S: AsRef<str>>(fields: &[S]) -> Result<Vec<u8>, EncodingError> {
    let mut flattened = Vec::with_capacity(fields.len() * FIELD_BYTE_LENGTH);
    for field in fields {
        flattened.extend_from_slice(&field_to_bytes32(field.as_ref())?);
    }
    Ok(flattened)
}

/// Renders a field element the way the proving backend reports it (`0x` + 64 hex digits).
pub fn format_field(value: &BigUint) -> String {
    let mut bytes = [0u8; FIELD_BYTE_LENGTH];
    let be = value.to_bytes_be();
    let start = FIELD_BYTE_LENGTH.saturating_sub(be.len());
    bytes[start..].copy_from_slice(&be[be.len().saturating_sub(FIELD_BYTE_LENGTH)..]);
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_all_three_representations() {
        let expected = {
            let mut b = [0u8; 32];
            b[31] = 0x1f;
            b
        };
        assert_eq!(field_to_bytes32("0x1f").unwrap(), expected);
        assert_eq!(field_to_bytes32("31").unwrap(), expected);
        assert_eq!(field_to_bytes32("1f").unwrap(), expected);
        assert_eq!(field_to_bytes32(" 0X1F ").unwrap(), expected);
    }

    #[test]
    fn decimal_wins_over_bare_hex() {
        assert_eq!(parse_field("10").unwrap(), BigUint::from(10u32));
        assert_eq!(parse_field("a").unwrap(), BigUint::from(10u32));
    }

    #[test]
    fn rejects_unsupported_formats() {
        assert_eq!(parse_field("   "), Err(EncodingError::EmptyField));
        for bad in ["-1", "0x", "0xzz", "12.5", "hello"] {
            assert!(
                matches!(parse_field(bad), Err(EncodingError::UnsupportedFieldFormat(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn enforces_256_bit_range() {
        let max = format!("0x{}", "ff".repeat(32));
        assert_eq!(field_to_bytes32(&max).unwrap(), [0xff; 32]);

        let overflow = format!("0x1{}", "00".repeat(32));
        assert!(matches!(
            field_to_bytes32(&overflow),
            Err(EncodingError::FieldOutOfRange(_))
        ));
    }

    #[test]
    fn zero_encodes_to_zero_word() {
        assert_eq!(field_to_bytes32("0").unwrap(), [0u8; 32]);
        assert_eq!(field_to_bytes32("0x0").unwrap(), [0u8; 32]);
    }

    #[test]
    fn flattening_preserves_order() {
        let forward = flatten_public_inputs(&["0x01", "2"]).unwrap();
        let reverse = flatten_public_inputs(&["2", "0x01"]).unwrap();
        assert_eq!(forward.len(), 64);
        assert_ne!(forward, reverse);
        assert_eq!(forward[..32], reverse[32..]);
        assert_eq!(forward[32..], reverse[..32]);
    }

    #[test]
    fn equal_values_in_different_notation_flatten_identically() {
        let a = flatten_public_inputs(&["0x01", "1"]).unwrap();
        let b = flatten_public_inputs(&["1", "0x01"]).unwrap();
        assert_eq!(a[..32], b[32..]);
        assert_eq!(a[32..], b[..32]);
    }

    #[test]
    fn format_field_matches_backend_style() {
        let formatted = format_field(&BigUint::from(0xabu32));
        assert_eq!(formatted.len(), 66);
        assert!(formatted.ends_with("ab"));
        assert_eq!(field_to_bytes32(&formatted).unwrap()[31], 0xab);
    }

    proptest! {
        #[test]
        fn representation_does_not_change_encoding(value in any::<u128>()) {
            let hex = format!("0x{value:x}");
            let dec = value.to_string();
            let from_hex = field_to_bytes32(&hex).unwrap();
            prop_assert_eq!(from_hex, field_to_bytes32(&dec).unwrap());
            prop_assert_eq!(&from_hex[16..], &value.to_be_bytes()[..]);
        }
    }
}
