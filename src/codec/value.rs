use crate::{
    error::CodecError,
    layout::ScalarType,
    primitives::{
        hex,
        Address,
        Bytes,
        I256,
        U256,
    },
    utils::{
        word::{
            encode_int,
            encode_uint,
            parse_int,
            parse_uint,
        },
        WordError,
    },
};

use enum_as_inner::EnumAsInner;
use serde::{
    Serialize,
    Serializer,
};
use serde_json::Value;
use std::str::FromStr;

/// A value reconstructed from storage.
///
/// Serializes to the JSON shape accepted by the slot writer: integers as decimal strings,
/// byte values as `0x` hex and addresses checksummed.
#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum DecodedValue {
    Address(Address),
    Bool(bool),
    Uint(U256),
    Int(I256),
    FixedBytes(Bytes),
    Bytes(Bytes),
    String(String),
    /// Members in declaration order.
    Struct(Vec<(String, DecodedValue)>),
    Array(Vec<DecodedValue>),
}

impl DecodedValue {
    /// Looks up a struct member by label.
    pub fn member(&self, label: &str) -> Option<&DecodedValue> {
        self.as_struct()?
            .iter()
            .find_map(|(name, member)| (name == label).then_some(member))
    }
}

impl Serialize for DecodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Address(address) => serializer.serialize_str(&address.to_checksum(None)),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Uint(value) => serializer.serialize_str(&value.to_string()),
            Self::Int(value) => serializer.serialize_str(&value.to_string()),
            Self::FixedBytes(bytes) | Self::Bytes(bytes) => {
                serializer.serialize_str(&hex::encode_prefixed(bytes))
            }
            Self::String(value) => serializer.serialize_str(value),
            Self::Struct(members) => {
                serializer.collect_map(members.iter().map(|(label, member)| (label, member)))
            }
            Self::Array(elements) => elements.serialize(serializer),
        }
    }
}

/// Encodes a JSON value as the right-aligned field of a scalar type.
///
/// Signed values are returned in two's complement truncated to the type's width.
pub(crate) fn scalar_field(
    ty: &str,
    scalar: ScalarType,
    value: &Value,
) -> Result<U256, CodecError> {
    let out_of_range = |err: WordError| {
        match err {
            WordError::Overflow(_) => {
                CodecError::ValueOutOfRange {
                    ty: ty.to_string(),
                    value: value.to_string(),
                }
            }
            err => err.into(),
        }
    };

    match scalar {
        ScalarType::Address => {
            let address = value
                .as_str()
                .and_then(|s| Address::from_str(s.trim()).ok())
                .ok_or_else(|| {
                    CodecError::invalid_value(ty, value, "expected a 20 byte hex address")
                })?;
            Ok(U256::from_be_slice(address.as_slice()))
        }
        ScalarType::Bool => {
            let flag = match value {
                Value::Bool(flag) => *flag,
                Value::String(s) if s == "true" => true,
                Value::String(s) if s == "false" => false,
                _ => return Err(CodecError::invalid_value(ty, value, "expected a boolean")),
            };
            Ok(U256::from(flag as u8))
        }
        ScalarType::Uint(_) => {
            let number = json_uint(value).ok_or_else(|| {
                if json_int(value).is_some_and(|n| n.is_negative()) {
                    CodecError::ValueOutOfRange {
                        ty: ty.to_string(),
                        value: value.to_string(),
                    }
                } else {
                    CodecError::invalid_value(ty, value, "expected an unsigned integer")
                }
            })?;
            encode_uint(number, scalar.size()).map_err(out_of_range)
        }
        ScalarType::Int(_) => {
            let number = json_int(value)
                .ok_or_else(|| CodecError::invalid_value(ty, value, "expected a signed integer"))?;
            encode_int(number, scalar.size()).map_err(out_of_range)
        }
        ScalarType::FixedBytes(len) => {
            let bytes = json_hex(value)
                .ok_or_else(|| CodecError::invalid_value(ty, value, "expected 0x prefixed hex"))?;
            if bytes.len() != len {
                return Err(CodecError::invalid_value(
                    ty,
                    value,
                    format!("expected exactly {len} bytes, got {}", bytes.len()),
                ));
            }
            Ok(U256::from_be_slice(&bytes))
        }
    }
}

/// Raw contents of a `string` (UTF-8 text) or `bytes` (hex) value.
pub(crate) fn byte_string(ty: &str, text: bool, value: &Value) -> Result<Vec<u8>, CodecError> {
    if text {
        value
            .as_str()
            .map(|s| s.as_bytes().to_vec())
            .ok_or_else(|| CodecError::invalid_value(ty, value, "expected a string"))
    } else {
        json_hex(value)
            .ok_or_else(|| CodecError::invalid_value(ty, value, "expected 0x prefixed hex"))
    }
}

/// Unsigned integer from a JSON number or a decimal / `0x` hex string.
fn json_uint(value: &Value) -> Option<U256> {
    match value {
        Value::Number(number) => number.as_u64().map(U256::from),
        Value::String(s) => parse_uint(s),
        _ => None,
    }
}

/// Signed integer from a JSON number or an optionally negative decimal / `0x` hex string.
fn json_int(value: &Value) -> Option<I256> {
    match value {
        Value::Number(number) if number.is_i64() || number.is_u64() => {
            parse_int(&number.to_string())
        }
        Value::String(s) => parse_int(s),
        _ => None,
    }
}

fn json_hex(value: &Value) -> Option<Vec<u8>> {
    let s = value.as_str()?.trim();
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    hex::decode(digits).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::address;
    use serde_json::json;

    #[test]
    fn test_uint_accepts_numbers_and_strings() {
        let ty = ScalarType::Uint(16);
        assert_eq!(scalar_field("uint16", ty, &json!(513)).unwrap(), U256::from(513));
        assert_eq!(scalar_field("uint16", ty, &json!("513")).unwrap(), U256::from(513));
        assert_eq!(scalar_field("uint16", ty, &json!("0x201")).unwrap(), U256::from(513));
    }

    #[test]
    fn test_uint_out_of_range() {
        let ty = ScalarType::Uint(8);
        assert!(matches!(
            scalar_field("uint8", ty, &json!(256)),
            Err(CodecError::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            scalar_field("uint8", ty, &json!(-1)),
            Err(CodecError::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            scalar_field("uint8", ty, &json!(1.5)),
            Err(CodecError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_int_two_complement() {
        let ty = ScalarType::Int(8);
        assert_eq!(scalar_field("int8", ty, &json!(-1)).unwrap(), U256::from(0xff));
        assert_eq!(scalar_field("int8", ty, &json!("-128")).unwrap(), U256::from(0x80));
        assert!(matches!(
            scalar_field("int8", ty, &json!(128)),
            Err(CodecError::ValueOutOfRange { .. })
        ));
        assert_eq!(
            scalar_field("int256", ScalarType::Int(256), &json!("-1")).unwrap(),
            U256::MAX
        );
    }

    #[test]
    fn test_bool_forms() {
        let ty = ScalarType::Bool;
        assert_eq!(scalar_field("bool", ty, &json!(true)).unwrap(), U256::from(1));
        assert_eq!(scalar_field("bool", ty, &json!("false")).unwrap(), U256::ZERO);
        assert!(scalar_field("bool", ty, &json!(1)).is_err());
    }

    #[test]
    fn test_fixed_bytes_must_match_width() {
        let ty = ScalarType::FixedBytes(5);
        assert_eq!(
            scalar_field("bytes5", ty, &json!("0x0102030405")).unwrap(),
            U256::from(0x0102030405u64)
        );
        assert!(scalar_field("bytes5", ty, &json!("0x01020304")).is_err());
        assert!(scalar_field("bytes5", ty, &json!("0102030405")).is_err());
    }

    #[test]
    fn test_address() {
        let field = scalar_field(
            "address",
            ScalarType::Address,
            &json!("0x558c0b2a0e8c6a6dfc2ec8f3a0a2a4c6dbd0e3f2"),
        )
        .unwrap();
        assert_eq!(
            field,
            U256::from_be_slice(address!("558c0b2a0e8c6a6dfc2ec8f3a0a2a4c6dbd0e3f2").as_slice())
        );
        assert!(scalar_field("address", ScalarType::Address, &json!("0x1234")).is_err());
    }

    #[test]
    fn test_byte_string() {
        assert_eq!(byte_string("string", true, &json!("hi")).unwrap(), b"hi");
        assert_eq!(byte_string("bytes", false, &json!("0xbeef")).unwrap(), [0xbe, 0xef]);
        assert!(byte_string("bytes", false, &json!("beef")).is_err());
    }

    #[test]
    fn test_serialize_decoded_value() {
        let value = DecodedValue::Struct(vec![
            ("d".to_string(), DecodedValue::Int(parse_int("-5").unwrap())),
            ("b".to_string(), DecodedValue::Uint(U256::from(7))),
            (
                "c".to_string(),
                DecodedValue::Bytes(Bytes::from_static(&[0xde, 0xad])),
            ),
            ("a".to_string(), DecodedValue::Array(vec![DecodedValue::Bool(true)])),
        ]);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({ "d": "-5", "b": "7", "c": "0xdead", "a": [true] })
        );
        // Members serialize in declaration order, not sorted by label.
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"d":"-5","b":"7","c":"0xdead","a":[true]}"#
        );
        assert_eq!(
            value.member("c"),
            Some(&DecodedValue::Bytes(Bytes::from_static(&[0xde, 0xad])))
        );
        assert_eq!(value.member("e"), None);
    }
}
