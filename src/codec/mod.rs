//! Translation between typed state variables and raw storage slots.
//!
//! The writer turns JSON values into [`StorageSlot`](crate::primitives::StorageSlot) writes,
//! the reader turns a variable name and key path into the slot lookups needed to rebuild it,
//! and the decoder turns the looked up values back into a [`DecodedValue`].

mod decoder;
pub use decoder::decode_variable;

mod packing;
pub use packing::pack_slots;

mod reader;
pub use reader::{
    get_variable_storage_slots,
    SlotKind,
    SlotLookup,
    SlotValue,
    MAX_DYNAMIC_LENGTH,
};

mod value;
pub use value::DecodedValue;

mod writer;
pub use writer::{
    compute_storage_slots,
    compute_variable_slots,
};

use crate::{
    error::CodecError,
    layout::{
        ScalarType,
        StorageType,
        TypeKind,
    },
    primitives::{
        B256,
        U256,
    },
    utils::{
        slots::{
            hashed_key_slot,
            mapping_slot,
        },
        word::{
            decode_int,
            WORD_BYTES,
        },
    },
};

use serde_json::Value;

/// Slot and offset of element `index` of an array whose data starts at `start`.
///
/// Scalars of up to 16 bytes are packed `32 / size` per slot, anything else takes
/// whole slots.
pub(crate) fn element_location(start: U256, index: usize, element: &StorageType) -> (U256, usize) {
    match element.as_scalar() {
        Some(scalar) if scalar.size() <= 16 => {
            let size = scalar.size();
            let per_slot = WORD_BYTES / size;
            (
                start.wrapping_add(U256::from(index / per_slot)),
                (index % per_slot) * size,
            )
        }
        _ => {
            let slots = element.number_of_bytes.div_ceil(WORD_BYTES).max(1);
            (start.wrapping_add(U256::from(index) * U256::from(slots)), 0)
        }
    }
}

/// Slot holding `mapping[key]` for a mapping stored at `base`.
pub(crate) fn mapping_entry_slot(
    key_ty: &StorageType,
    key: &Value,
    base: U256,
) -> Result<U256, CodecError> {
    match key_ty.kind {
        TypeKind::Scalar(scalar) => {
            let field = value::scalar_field(&key_ty.label, scalar, key)?;
            let word = match scalar {
                ScalarType::Int(_) => B256::from(decode_int(field, scalar.size()).into_raw()),
                ScalarType::FixedBytes(len) => B256::from(field << ((WORD_BYTES - len) * 8)),
                ScalarType::Address | ScalarType::Bool | ScalarType::Uint(_) => B256::from(field),
            };
            Ok(mapping_slot(word, base))
        }
        TypeKind::String | TypeKind::Bytes => {
            let text = matches!(key_ty.kind, TypeKind::String);
            let data = value::byte_string(&key_ty.label, text, key)?;
            Ok(hashed_key_slot(&data, base))
        }
        _ => Err(CodecError::UnsupportedType(key_ty.label.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        primitives::keccak256,
        test_utils::storage_getter_layout,
        utils::word::left_pad,
    };
    use serde_json::json;

    fn key_type(mapping: &str) -> StorageType {
        let layout = storage_getter_layout();
        let entry = layout.variable(mapping).unwrap();
        let TypeKind::Mapping { key, .. } = &layout.resolve(&entry.ty).unwrap().kind else {
            panic!("expected a mapping");
        };
        layout.resolve(key).unwrap().clone()
    }

    #[test]
    fn test_mapping_slot_for_uint_key() {
        let mut preimage = [0u8; 64];
        preimage[30] = 0x04;
        preimage[31] = 0xd2;
        preimage[63] = 0x05;

        let slot =
            mapping_entry_slot(&key_type("_uint256Map"), &json!("1234"), U256::from(5)).unwrap();
        assert_eq!(slot, U256::from_be_bytes(keccak256(preimage).0));
    }

    #[test]
    fn test_fixed_bytes_keys_are_right_padded() {
        let slot = mapping_entry_slot(
            &key_type("_bytes5ToBoolMap"),
            &json!("0x0102030405"),
            U256::from(13),
        )
        .unwrap();
        let mut key = B256::ZERO;
        key.0[..5].copy_from_slice(&[1, 2, 3, 4, 5]);
        assert_eq!(slot, mapping_slot(key, U256::from(13)));
    }

    #[test]
    fn test_int_keys_are_sign_extended() {
        let slot =
            mapping_entry_slot(&key_type("_int256ToBoolMap"), &json!(-1), U256::from(26))
                .unwrap();
        assert_eq!(slot, mapping_slot(B256::repeat_byte(0xff), U256::from(26)));
    }

    #[test]
    fn test_string_keys_are_hashed_unpadded() {
        let slot =
            mapping_entry_slot(&key_type("_stringToUintMap"), &json!("abc"), U256::from(21))
                .unwrap();
        assert_eq!(slot, hashed_key_slot(b"abc", U256::from(21)));
        assert_ne!(slot, mapping_slot(left_pad(b"abc"), U256::from(21)));
    }

    #[test]
    fn test_element_location() {
        let layout = storage_getter_layout();
        let uint16 = layout.resolve("t_uint16").unwrap();
        let uint256 = layout.resolve("t_uint256").unwrap();
        let simple = layout.resolve("t_struct(SimpleStruct)10_storage").unwrap();
        let start = U256::from(100);

        assert_eq!(element_location(start, 0, uint16), (start, 0));
        assert_eq!(element_location(start, 15, uint16), (start, 30));
        assert_eq!(element_location(start, 16, uint16), (start + U256::from(1), 0));
        assert_eq!(element_location(start, 2, uint256), (start + U256::from(2), 0));
        assert_eq!(element_location(start, 2, simple), (start + U256::from(4), 0));
    }
}
