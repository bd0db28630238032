//! Fixed-width word helpers shared by the slot writer, reader and decoder.
//!
//! Offsets follow the compiler's storage convention: offset 0 is the lowest-order
//! (rightmost) byte of a slot, and a value of `n` bytes at offset `o` occupies the
//! big-endian byte range `[32 - o - n, 32 - o)`.

use crate::primitives::{
    B256,
    I256,
    U256,
};

/// Number of bytes in a storage word.
pub const WORD_BYTES: usize = 32;

/// Errors raised when a value cannot be represented in the requested width.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WordError {
    #[error("{len} bytes at offset {offset} would span the slot boundary")]
    SpansSlot { offset: usize, len: usize },
    #[error("value does not fit in {0} bytes")]
    Overflow(usize),
}

/// Returns a value with the low `bytes * 8` bits set.
#[inline]
pub fn mask(bytes: usize) -> U256 {
    if bytes >= WORD_BYTES {
        U256::MAX
    } else {
        (U256::from(1) << (bytes * 8)) - U256::from(1)
    }
}

/// Checks that an unsigned value fits in `bytes` bytes.
pub fn encode_uint(value: U256, bytes: usize) -> Result<U256, WordError> {
    if value > mask(bytes) {
        return Err(WordError::Overflow(bytes));
    }
    Ok(value)
}

/// Encodes a signed value as a `bytes`-wide two's complement field.
///
/// The magnitude check excludes the sign bit, so `int8` accepts `-128..=127`.
pub fn encode_int(value: I256, bytes: usize) -> Result<U256, WordError> {
    debug_assert!(bytes > 0, "zero-width signed field");
    if bytes < WORD_BYTES {
        let bound = U256::from(1) << (bytes * 8 - 1);
        let magnitude = value.unsigned_abs();
        let fits = if value.is_negative() {
            magnitude <= bound
        } else {
            magnitude < bound
        };
        if !fits {
            return Err(WordError::Overflow(bytes));
        }
    }
    Ok(value.into_raw() & mask(bytes))
}

/// Interprets the low `bytes` bytes of `raw` as a two's complement integer.
pub fn decode_int(raw: U256, bytes: usize) -> I256 {
    let field = raw & mask(bytes);
    if bytes < WORD_BYTES && field.bit(bytes * 8 - 1) {
        // Sign-extend into the unused high bytes.
        I256::from_raw(field | !mask(bytes))
    } else {
        I256::from_raw(field)
    }
}

fn check_span(offset: usize, len: usize) -> Result<(), WordError> {
    if len == 0 || offset + len > WORD_BYTES {
        return Err(WordError::SpansSlot { offset, len });
    }
    Ok(())
}

/// Positions a right-aligned `field` of `len` bytes at `offset` in an otherwise zero word.
pub fn place(field: U256, offset: usize, len: usize) -> Result<B256, WordError> {
    check_span(offset, len)?;
    Ok(B256::from((field & mask(len)) << (offset * 8)))
}

/// Extracts the right-aligned field of `len` bytes stored at `offset`.
pub fn extract(word: B256, offset: usize, len: usize) -> Result<U256, WordError> {
    check_span(offset, len)?;
    Ok((U256::from_be_bytes(word.0) >> (offset * 8)) & mask(len))
}

/// Borrows the big-endian bytes of the field of `len` bytes stored at `offset`.
pub fn extract_bytes(word: &B256, offset: usize, len: usize) -> Result<&[u8], WordError> {
    check_span(offset, len)?;
    let end = WORD_BYTES - offset;
    Ok(&word.0[end - len..end])
}

/// Mask covering the bytes owned by a field of `len` bytes at `offset`.
pub fn range_mask(offset: usize, len: usize) -> Result<B256, WordError> {
    place(U256::MAX, offset, len)
}

/// Left-pads `data` to a full word, as value types are padded.
pub fn left_pad(data: &[u8]) -> B256 {
    let mut word = B256::ZERO;
    let len = data.len().min(WORD_BYTES);
    word.0[WORD_BYTES - len..].copy_from_slice(&data[data.len() - len..]);
    word
}

/// Right-pads `data` to a full word, as `bytesN` values and byte-string chunks are padded.
pub fn right_pad(data: &[u8]) -> B256 {
    let mut word = B256::ZERO;
    let len = data.len().min(WORD_BYTES);
    word.0[..len].copy_from_slice(&data[..len]);
    word
}

/// Parses an unsigned integer from a decimal or `0x` hex string.
pub fn parse_uint(input: &str) -> Option<U256> {
    let input = input.trim();
    match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None if input.is_empty() => None,
        None => U256::from_str_radix(input, 10).ok(),
    }
}

/// Parses a signed integer from an optionally `-` prefixed decimal or `0x` hex string.
pub fn parse_int(input: &str) -> Option<I256> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    let magnitude = parse_uint(digits)?;
    let bound = U256::from(1) << 255;
    if negative {
        if magnitude > bound {
            return None;
        }
        Some(I256::from_raw(magnitude.wrapping_neg()))
    } else {
        if magnitude >= bound {
            return None;
        }
        Some(I256::from_raw(magnitude))
    }
}
