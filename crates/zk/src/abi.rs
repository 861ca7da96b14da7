//! Native ABI codec.
//!
//! Validates a JSON input map against the circuit ABI and flattens it into the
//! positional field vector a circuit engine consumes. Parameters are laid out
//! in ABI order; arrays are flattened element by element.

use num_bigint::BigUint;
use serde_json::{Map, Value};

use crate::artifact::{Abi, AbiType, Sign, Visibility};

/// Errors raised when an input map does not fit the ABI.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("missing input parameter `{0}`")]
    MissingParameter(String),

    #[error("unexpected input parameter `{0}`")]
    UnexpectedParameter(String),

    #[error("parameter `{name}` expects {expected} elements, got {found}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("parameter `{name}` has a value outside its type: {value}")]
    ValueOutOfRange { name: String, value: String },

    #[error("parameter `{name}` has an unsupported value: {value}")]
    InvalidValue { name: String, value: String },
}

/// Flattened witness for one circuit invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedInputs {
    /// All parameter values in ABI order.
    pub fields: Vec<BigUint>,
    /// Indices into `fields` that are public.
    pub public_indices: Vec<usize>,
}

impl EncodedInputs {
    pub fn public_fields(&self) -> impl Iterator<Item = &BigUint> {
        self.public_indices.iter().map(|&i| &self.fields[i])
    }
}

/// Encodes `inputs` according to `abi`.
pub fn encode_inputs(abi: &Abi, inputs: &Map<String, Value>) -> Result<EncodedInputs, AbiError> {
    if let Some(extra) = inputs
        .keys()
        .find(|key| !abi.parameters.iter().any(|p| &p.name == *key))
    {
        return Err(AbiError::UnexpectedParameter(extra.clone()));
    }

    let mut encoded = EncodedInputs {
        fields: Vec::new(),
        public_indices: Vec::new(),
    };

    for param in &abi.parameters {
        let value = inputs
            .get(&param.name)
            .ok_or_else(|| AbiError::MissingParameter(param.name.clone()))?;
        let start = encoded.fields.len();
        encode_value(&param.name, &param.typ, value, &mut encoded.fields)?;
        if param.visibility == Visibility::Public {
            encoded.public_indices.extend(start..encoded.fields.len());
        }
    }

    Ok(encoded)
}

fn encode_value(
    name: &str,
    typ: &AbiType,
    value: &Value,
    out: &mut Vec<BigUint>,
) -> Result<(), AbiError> {
    match typ {
        AbiType::Array { length, typ: inner } => {
            let items = value.as_array().ok_or_else(|| invalid(name, value))?;
            if items.len() != *length {
                return Err(AbiError::LengthMismatch {
                    name: name.to_string(),
                    expected: *length,
                    found: items.len(),
                });
            }
            for item in items {
                encode_value(name, inner, item, out)?;
            }
            Ok(())
        }
        AbiType::Boolean => {
            let bit = match value {
                Value::Bool(b) => *b,
                Value::Number(n) if n.as_u64() == Some(0) => false,
                Value::Number(n) if n.as_u64() == Some(1) => true,
                _ => return Err(invalid(name, value)),
            };
            out.push(BigUint::from(bit as u8));
            Ok(())
        }
        AbiType::Integer { sign, width } => {
            let n = scalar(name, value)?;
            let limit = match sign {
                Sign::Unsigned => *width as u64,
                Sign::Signed => width.saturating_sub(1) as u64,
            };
            if n.bits() > limit {
                return Err(AbiError::ValueOutOfRange {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
            out.push(n);
            Ok(())
        }
        AbiType::Field => {
            out.push(scalar(name, value)?);
            Ok(())
        }
    }
}

fn scalar(name: &str, value: &Value) -> Result<BigUint, AbiError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(BigUint::from)
            .ok_or_else(|| invalid(name, value)),
        Value::String(s) => crate::encoding::parse_field(s).map_err(|_| invalid(name, value)),
        _ => Err(invalid(name, value)),
    }
}

fn invalid(name: &str, value: &Value) -> AbiError {
    AbiError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::AbiParameter;
    use serde_json::json;

    fn u8_array(name: &str, length: usize, visibility: Visibility) -> AbiParameter {
        AbiParameter {
            name: name.into(),
            typ: AbiType::Array {
                length,
                typ: Box::new(AbiType::Integer {
                    sign: Sign::Unsigned,
                    width: 8,
                }),
            },
            visibility,
        }
    }

    fn abi() -> Abi {
        Abi {
            parameters: vec![
                u8_array("secret_word", 2, Visibility::Private),
                u8_array("expected_hash", 3, Visibility::Public),
            ],
            return_type: None,
        }
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn flattens_in_abi_order() {
        let inputs = map(json!({"expected_hash": [7, 8, 9], "secret_word": [1, "0x02"]}));
        let encoded = encode_inputs(&abi(), &inputs).unwrap();
        let fields: Vec<u64> = encoded
            .fields
            .iter()
            .map(|f| f.to_u64_digits().first().copied().unwrap_or(0))
            .collect();
        assert_eq!(fields, vec![1, 2, 7, 8, 9]);
        assert_eq!(encoded.public_indices, vec![2, 3, 4]);
        assert_eq!(encoded.public_fields().count(), 3);
    }

    #[test]
    fn rejects_shape_errors() {
        let missing = map(json!({"secret_word": [1, 2]}));
        assert_eq!(
            encode_inputs(&abi(), &missing),
            Err(AbiError::MissingParameter("expected_hash".into()))
        );

        let extra = map(json!({"secret_word": [1, 2], "expected_hash": [1, 2, 3], "salt": 1}));
        assert_eq!(
            encode_inputs(&abi(), &extra),
            Err(AbiError::UnexpectedParameter("salt".into()))
        );

        let short = map(json!({"secret_word": [1], "expected_hash": [1, 2, 3]}));
        assert!(matches!(
            encode_inputs(&abi(), &short),
            Err(AbiError::LengthMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn enforces_integer_width() {
        let wide = map(json!({"secret_word": [256, 0], "expected_hash": [1, 2, 3]}));
        assert!(matches!(
            encode_inputs(&abi(), &wide),
            Err(AbiError::ValueOutOfRange { .. })
        ));

        let negative = map(json!({"secret_word": [-1, 0], "expected_hash": [1, 2, 3]}));
        assert!(matches!(
            encode_inputs(&abi(), &negative),
            Err(AbiError::InvalidValue { .. })
        ));
    }
}
