use super::{
    DecodedValue,
    SlotKind,
    SlotValue,
};
use crate::{
    error::CodecError,
    layout::ScalarType,
    primitives::{
        hex,
        Address,
        Bytes,
        B256,
    },
    utils::word::{
        decode_int,
        extract,
        extract_bytes,
        WORD_BYTES,
    },
};

/// Rebuilds a single value from slot values in the order the reader produced them.
pub fn decode_variable<I>(values: I) -> Result<DecodedValue, CodecError>
where
    I: IntoIterator<Item = SlotValue>,
{
    let mut values = values.into_iter();
    let (_, decoded) = decode_next(&mut values)?;

    let trailing = values.count();
    if trailing > 0 {
        return Err(CodecError::TrailingSlots(trailing));
    }
    Ok(decoded)
}

fn decode_next<I>(values: &mut I) -> Result<(Option<String>, DecodedValue), CodecError>
where
    I: Iterator<Item = SlotValue>,
{
    let SlotValue { value, lookup } = values.next().ok_or(CodecError::TruncatedSlots)?;

    let decoded = match lookup.kind {
        SlotKind::Scalar(scalar) => decode_scalar(&value, lookup.offset, scalar)?,
        SlotKind::Struct { members } => {
            let mut fields = Vec::new();
            for _ in 0..members {
                let (label, member) = decode_next(values)?;
                let label =
                    label.ok_or(CodecError::MalformedSlots("struct member without a label"))?;
                fields.push((label, member));
            }
            DecodedValue::Struct(fields)
        }
        SlotKind::Array { len } => {
            let mut elements = Vec::new();
            for _ in 0..len {
                elements.push(decode_next(values)?.1);
            }
            DecodedValue::Array(elements)
        }
        SlotKind::Bytes { chunks, text } => {
            let mut data = Vec::new();
            for _ in 0..chunks {
                let chunk = values.next().ok_or(CodecError::TruncatedSlots)?;
                if chunk.lookup.kind != SlotKind::Chunk {
                    return Err(CodecError::MalformedSlots("expected a byte string chunk"));
                }
                let used = chunk.lookup.length.unwrap_or(WORD_BYTES);
                if used > WORD_BYTES {
                    return Err(CodecError::MalformedSlots("chunk longer than a slot"));
                }
                data.extend_from_slice(&chunk.value.0[..used]);
            }
            if text {
                let text = String::from_utf8(data).map_err(|err| {
                    CodecError::invalid_value(
                        "string",
                        hex::encode_prefixed(err.as_bytes()),
                        "invalid UTF-8",
                    )
                })?;
                DecodedValue::String(text)
            } else {
                DecodedValue::Bytes(Bytes::from(data))
            }
        }
        SlotKind::Chunk => {
            return Err(CodecError::MalformedSlots(
                "byte string chunk without a header",
            ))
        }
        SlotKind::Mapping => {
            return Err(CodecError::MappingNotDecodable(
                lookup.label.unwrap_or_else(|| "mapping".to_string()),
            ))
        }
    };

    Ok((lookup.label, decoded))
}

fn decode_scalar(
    word: &B256,
    offset: usize,
    scalar: ScalarType,
) -> Result<DecodedValue, CodecError> {
    let size = scalar.size();
    Ok(match scalar {
        ScalarType::Address => {
            DecodedValue::Address(Address::from_slice(extract_bytes(word, offset, size)?))
        }
        ScalarType::Bool => DecodedValue::Bool(!extract(*word, offset, size)?.is_zero()),
        ScalarType::Uint(_) => DecodedValue::Uint(extract(*word, offset, size)?),
        ScalarType::Int(_) => DecodedValue::Int(decode_int(extract(*word, offset, size)?, size)),
        ScalarType::FixedBytes(_) => {
            DecodedValue::FixedBytes(Bytes::copy_from_slice(extract_bytes(word, offset, size)?))
        }
    })
}
