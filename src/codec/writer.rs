use super::{
    element_location,
    mapping_entry_slot,
    pack_slots,
    value::{
        byte_string,
        scalar_field,
    },
};
use crate::{
    error::CodecError,
    layout::{
        StorageLayout,
        TypeKind,
    },
    primitives::{
        StorageSlot,
        B256,
        U256,
    },
    utils::{
        slots::{
            data_slot,
            slot_key,
        },
        word::{
            place,
            range_mask,
            right_pad,
            WORD_BYTES,
        },
    },
};

use serde_json::Value;
use tracing::{
    debug,
    instrument,
    trace,
};

/// Computes the packed slot writes that store every `(name, value)` pair.
///
/// All variables are encoded before packing, so variables sharing a slot end up in a
/// single write. `null` values (and `null` struct members or elements) are skipped.
#[instrument(skip_all)]
pub fn compute_storage_slots<'v, I>(
    layout: &StorageLayout,
    variables: I,
) -> Result<Vec<StorageSlot>, CodecError>
where
    I: IntoIterator<Item = (&'v str, &'v Value)>,
{
    let mut writer = SlotWriter {
        layout,
        slots: Vec::new(),
    };

    for (name, value) in variables {
        let entry = layout.variable(name)?;
        debug!(variable = name, slot = %entry.slot, "Encoding variable");
        writer.encode(&entry.ty, value, entry.slot, entry.offset)?;
    }

    let unpacked = writer.slots.len();
    let slots = pack_slots(writer.slots)?;
    debug!(unpacked, packed = slots.len(), "Computed storage slots");
    Ok(slots)
}

/// Computes the packed slot writes for a single variable.
pub fn compute_variable_slots(
    layout: &StorageLayout,
    name: &str,
    value: &Value,
) -> Result<Vec<StorageSlot>, CodecError> {
    compute_storage_slots(layout, [(name, value)])
}

struct SlotWriter<'a> {
    layout: &'a StorageLayout,
    slots: Vec<StorageSlot>,
}

impl SlotWriter<'_> {
    fn encode(
        &mut self,
        ty_id: &str,
        value: &Value,
        slot: U256,
        offset: usize,
    ) -> Result<(), CodecError> {
        if value.is_null() {
            return Ok(());
        }
        let layout = self.layout;
        let ty = layout.resolve(ty_id)?;

        match &ty.kind {
            TypeKind::Scalar(scalar) => {
                let field = scalar_field(&ty.label, *scalar, value)?;
                let size = scalar.size();
                self.slots.push(StorageSlot::new(
                    slot_key(slot),
                    place(field, offset, size)?,
                    range_mask(offset, size)?,
                ));
            }
            TypeKind::Struct { members } => {
                let object = value
                    .as_object()
                    .ok_or_else(|| {
                        CodecError::invalid_value(&ty.label, value, "expected an object")
                    })?;
                if let Some(unknown) = object
                    .keys()
                    .find(|name| !members.iter().any(|member| &member.label == *name))
                {
                    return Err(CodecError::invalid_value(
                        &ty.label,
                        unknown,
                        "no such struct member",
                    ));
                }
                for member in members {
                    if let Some(member_value) = object.get(&member.label) {
                        self.encode(
                            &member.ty,
                            member_value,
                            slot.wrapping_add(member.slot),
                            member.offset,
                        )?;
                    }
                }
            }
            TypeKind::StaticArray { base, len } => {
                let elements = value
                    .as_array()
                    .ok_or_else(|| {
                        CodecError::invalid_value(&ty.label, value, "expected an array")
                    })?;
                if elements.len() > *len {
                    return Err(CodecError::invalid_value(
                        &ty.label,
                        value,
                        format!("expected at most {len} elements, got {}", elements.len()),
                    ));
                }
                self.encode_elements(base, elements, slot)?;
            }
            TypeKind::Bytes | TypeKind::String => {
                if offset != 0 {
                    return Err(CodecError::MisalignedDynamicValue {
                        ty: ty.label.clone(),
                        offset,
                    });
                }
                let text = matches!(ty.kind, TypeKind::String);
                let data = byte_string(&ty.label, text, value)?;
                self.encode_byte_string(slot, &data);
            }
            TypeKind::Mapping { key, value: value_ty } => {
                let object = value
                    .as_object()
                    .ok_or_else(|| {
                        CodecError::invalid_value(&ty.label, value, "expected an object")
                    })?;
                let key_ty = layout.resolve(key)?;
                for (entry_key, entry) in object {
                    let entry_slot =
                        mapping_entry_slot(key_ty, &Value::String(entry_key.clone()), slot)?;
                    trace!(key = %entry_key, slot = %entry_slot, "Derived mapping slot");
                    self.encode(value_ty, entry, entry_slot, 0)?;
                }
            }
            TypeKind::DynamicArray { base } => {
                let elements = value
                    .as_array()
                    .ok_or_else(|| {
                        CodecError::invalid_value(&ty.label, value, "expected an array")
                    })?;
                self.slots.push(StorageSlot::full(
                    slot_key(slot),
                    B256::from(U256::from(elements.len())),
                ));
                self.encode_elements(base, elements, data_slot(slot))?;
            }
            TypeKind::Unsupported => return Err(CodecError::UnsupportedType(ty.label.clone())),
        }
        Ok(())
    }

    fn encode_elements(
        &mut self,
        base: &str,
        elements: &[Value],
        start: U256,
    ) -> Result<(), CodecError> {
        let layout = self.layout;
        let element = layout.resolve(base)?;
        for (index, value) in elements.iter().enumerate() {
            let (slot, offset) = element_location(start, index, element);
            self.encode(base, value, slot, offset)?;
        }
        Ok(())
    }

    fn encode_byte_string(&mut self, slot: U256, data: &[u8]) {
        if data.len() < WORD_BYTES {
            let mut word = right_pad(data);
            word.0[WORD_BYTES - 1] = (data.len() * 2) as u8;
            self.slots.push(StorageSlot::full(slot_key(slot), word));
            return;
        }

        self.slots.push(StorageSlot::full(
            slot_key(slot),
            B256::from(U256::from(data.len() * 2 + 1)),
        ));
        let start = data_slot(slot);
        for (index, chunk) in data.chunks(WORD_BYTES).enumerate() {
            self.slots.push(StorageSlot::full(
                slot_key(start.wrapping_add(U256::from(index))),
                right_pad(chunk),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        primitives::{
            address,
            keccak256,
        },
        test_utils::storage_getter_layout,
        utils::{
            slots::mapping_slot,
            word::left_pad,
        },
    };
    use serde_json::json;

    fn slots(name: &str, value: Value) -> Vec<StorageSlot> {
        compute_variable_slots(&storage_getter_layout(), name, &value).unwrap()
    }

    fn word(value: u64) -> B256 {
        B256::from(U256::from(value))
    }

    #[test]
    fn test_uint256() {
        let slots = slots("_uint256", json!("1234"));
        assert_eq!(slots, vec![StorageSlot::full(word(6), word(1234))]);
    }

    #[test]
    fn test_int56_negative() {
        let slots = slots("_int56", json!(-1));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].key, word(3));
        assert_eq!(U256::from_be_bytes(slots[0].value.0), U256::from(0xff_ffff_ffff_ffffu64));
        assert!(!slots[0].is_full());
    }

    #[test]
    fn test_bool_and_address_share_a_slot() {
        let layout = storage_getter_layout();
        let address = address!("558c0b2a0e8c6a6dfc2ec8f3a0a2a4c6dbd0e3f2");
        let bool_value = json!(true);
        let address_value = json!(address.to_string());

        let slots = compute_storage_slots(
            &layout,
            [("_bool", &bool_value), ("_address", &address_value)],
        )
        .unwrap();

        assert_eq!(slots.len(), 1);
        let value = slots[0].value;
        assert_eq!(value.0[31], 1);
        assert_eq!(&value.0[11..31], address.as_slice());
        assert_eq!(&value.0[..11], &[0u8; 11]);
        assert_eq!(&slots[0].mask.0[11..], &[0xffu8; 21]);
    }

    #[test]
    fn test_packed_uints() {
        let layout = storage_getter_layout();
        let a = json!(1);
        let b = json!(2);
        let slots =
            compute_storage_slots(&layout, [("_packedUintA", &a), ("_packedUintB", &b)]).unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(U256::from_be_bytes(slots[0].value.0), U256::from(0x0002_0001u64));
    }

    #[test]
    fn test_short_string() {
        let text = "a".repeat(31);
        let slots = slots("_string", json!(text));
        assert_eq!(slots.len(), 1);
        assert_eq!(&slots[0].value.0[..31], text.as_bytes());
        assert_eq!(slots[0].value.0[31], 62);
    }

    #[test]
    fn test_long_string() {
        let text = "b".repeat(32);
        let slots = slots("_string", json!(text));
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0], StorageSlot::full(word(5), word(65)));
        assert_eq!(slots[1].key, B256::from(data_slot(U256::from(5))));
        assert_eq!(slots[1].value.0, [b'b'; 32]);
    }

    #[test]
    fn test_long_bytes_last_chunk_is_right_padded() {
        let data = vec![0xabu8; 40];
        let slots = slots("_bytes", json!(format!("0x{}", "ab".repeat(40))));
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].value, word(81));
        let start = data_slot(U256::from(1));
        assert_eq!(slots[2].key, B256::from(start + U256::from(1)));
        assert_eq!(&slots[2].value.0[..8], &data[32..]);
        assert_eq!(&slots[2].value.0[8..], &[0u8; 24]);
    }

    #[test]
    fn test_struct_members() {
        let slots = slots(
            "_simpleStruct",
            json!({ "valueA": "7", "valueB": true }),
        );
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].key, word(8));
        assert_eq!(slots[0].value, word(7));
        assert_eq!(slots[1].key, word(9));
        assert_eq!(slots[1].value, word(1));
    }

    #[test]
    fn test_struct_member_offset() {
        let address = address!("00000000000000000000000000000000000000aa");
        let slots = slots(
            "_packedStruct",
            json!({ "packedC": 5, "packedE": address.to_string() }),
        );
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].key, word(10));
        // packedC at offset 4, packedE at offset 8
        assert_eq!(slots[0].value.0[26..28], [0, 5]);
        assert_eq!(slots[0].value.0[23], 0xaa);
    }

    #[test]
    fn test_unknown_struct_member() {
        let err = compute_variable_slots(
            &storage_getter_layout(),
            "_simpleStruct",
            &json!({ "valueC": 1 }),
        )
        .unwrap_err();
        assert!(matches!(err, CodecError::InvalidValue { value, .. } if value == "valueC"));
    }

    #[test]
    fn test_mapping() {
        let slots = slots("_uint256Map", json!({ "1234": "5678" }));
        let expected = mapping_slot(left_pad(&[0x04, 0xd2]), U256::from(11));
        assert_eq!(slots, vec![StorageSlot::full(B256::from(expected), word(5678))]);
    }

    #[test]
    fn test_nested_mapping() {
        let slots = slots("_uint256NestedMap", json!({ "1": { "2": "3" } }));
        let outer = mapping_slot(word(1), U256::from(12));
        let inner = mapping_slot(word(2), outer);
        assert_eq!(slots, vec![StorageSlot::full(B256::from(inner), word(3))]);
    }

    #[test]
    fn test_mapping_to_struct() {
        let key = format!("0x{}", "11".repeat(32));
        let slots = slots(
            "_bytes32ToSimpleStructMap",
            json!({ key: { "valueA": 1, "valueB": true } }),
        );
        let base = mapping_slot(B256::repeat_byte(0x11), U256::from(16));
        assert_eq!(slots[0].key, B256::from(base));
        assert_eq!(slots[1].key, B256::from(base + U256::from(1)));
    }

    #[test]
    fn test_dynamic_uint256_array() {
        let slots = slots("_uint256Array", json!(["1", "2", "3"]));
        let start = U256::from_be_bytes(keccak256(word(18)).0);
        assert_eq!(
            slots,
            vec![
                StorageSlot::full(word(18), word(3)),
                StorageSlot::full(B256::from(start), word(1)),
                StorageSlot::full(B256::from(start + U256::from(1)), word(2)),
                StorageSlot::full(B256::from(start + U256::from(2)), word(3)),
            ]
        );
    }

    #[test]
    fn test_dynamic_uint16_array_is_packed() {
        let slots = slots("_uint16Array", json!([1, 2, 3]));
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].key, B256::from(data_slot(U256::from(19))));
        assert_eq!(
            U256::from_be_bytes(slots[1].value.0),
            U256::from(0x0003_0002_0001u64)
        );
    }

    #[test]
    fn test_static_array() {
        let slots = slots("_uint8StaticArray", json!([1, 2, 3]));
        assert_eq!(slots.len(), 1);
        assert_eq!(U256::from_be_bytes(slots[0].value.0), U256::from(0x03_02_01u64));

        let err = compute_variable_slots(
            &storage_getter_layout(),
            "_uint8StaticArray",
            &json!([1, 2, 3, 4]),
        )
        .unwrap_err();
        assert!(matches!(err, CodecError::InvalidValue { .. }));
    }

    #[test]
    fn test_null_is_skipped() {
        assert!(slots("_uint256", Value::Null).is_empty());
        let slots = slots("_simpleStruct", json!({ "valueA": null, "valueB": false }));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].key, word(9));
    }

    #[test]
    fn test_unknown_variable() {
        let err =
            compute_variable_slots(&storage_getter_layout(), "_missing", &json!(1)).unwrap_err();
        assert!(matches!(err, CodecError::VariableNotFound(ref name) if name == "_missing"));
        assert_eq!(err.kind(), crate::ErrorKind::Schema);
    }

    #[test]
    fn test_misaligned_string() {
        let layout = StorageLayout::from_json_str(
            r#"{
                "storage": [{"label": "s", "slot": "0", "offset": 4, "type": "t_string_storage"}],
                "types": {"t_string_storage": {"encoding": "bytes", "label": "string", "numberOfBytes": "32"}}
            }"#,
        )
        .unwrap();
        assert!(matches!(
            compute_variable_slots(&layout, "s", &json!("x")),
            Err(CodecError::MisalignedDynamicValue { offset: 4, .. })
        ));
    }

    #[test]
    fn test_unsupported_type() {
        let layout = StorageLayout::from_json_str(
            r#"{
                "storage": [{"label": "f", "slot": "0", "offset": 0, "type": "t_function_internal"}],
                "types": {"t_function_internal": {"encoding": "inplace", "label": "function ()", "numberOfBytes": "8"}}
            }"#,
        )
        .unwrap();
        assert!(matches!(
            compute_variable_slots(&layout, "f", &json!(1)),
            Err(CodecError::UnsupportedType(label)) if label == "function ()"
        ));
    }
}
