//! Hash-derived slot addressing for mappings, dynamic arrays and long byte strings.

use crate::primitives::{
    keccak256,
    B256,
    U256,
};

/// Converts a slot index into its 32-byte storage key.
#[inline]
pub fn slot_key(slot: U256) -> B256 {
    B256::from(slot)
}

/// Slot of `mapping[key]` for a value-type key that is already padded to a word.
#[inline]
pub fn mapping_slot(key: B256, mapping_slot: U256) -> U256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(key.as_slice());
    buf[32..].copy_from_slice(&mapping_slot.to_be_bytes::<32>());
    U256::from_be_bytes(keccak256(buf).0)
}

/// Slot of `mapping[key]` for `string` and `bytes` keys, which are hashed unpadded.
#[inline]
pub fn hashed_key_slot(key: &[u8], mapping_slot: U256) -> U256 {
    let mut buf = Vec::with_capacity(key.len() + 32);
    buf.extend_from_slice(key);
    buf.extend_from_slice(&mapping_slot.to_be_bytes::<32>());
    U256::from_be_bytes(keccak256(buf).0)
}

/// First data slot of a dynamic array or a long byte string stored at `slot`.
#[inline]
pub fn data_slot(slot: U256) -> U256 {
    U256::from_be_bytes(keccak256(slot.to_be_bytes::<32>()).0)
}
