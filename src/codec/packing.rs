use crate::{
    error::CodecError,
    primitives::{
        StorageSlot,
        B256,
    },
    utils::word::WORD_BYTES,
};

use std::collections::HashMap;

/// Merges writes that target the same slot, keeping the order in which keys first appear.
///
/// Fails with [`CodecError::SlotOverlap`] if two writes set the same byte to non-zero values.
pub fn pack_slots(slots: Vec<StorageSlot>) -> Result<Vec<StorageSlot>, CodecError> {
    let mut packed: Vec<StorageSlot> = Vec::with_capacity(slots.len());
    let mut index: HashMap<B256, usize> = HashMap::with_capacity(slots.len());

    for slot in slots {
        let Some(&position) = index.get(&slot.key) else {
            index.insert(slot.key, packed.len());
            packed.push(slot);
            continue;
        };

        let existing = &mut packed[position];
        for i in 0..WORD_BYTES {
            let (current, incoming) = (existing.value.0[i], slot.value.0[i]);
            if current != 0 && incoming != 0 {
                return Err(CodecError::SlotOverlap {
                    key: slot.key,
                    offset: WORD_BYTES - 1 - i,
                });
            }
            existing.value.0[i] = current | incoming;
        }
        existing.mask |= slot.mask;
    }

    Ok(packed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        primitives::U256,
        utils::word::{
            place,
            range_mask,
        },
    };

    fn write(key: u64, field: u64, offset: usize, len: usize) -> StorageSlot {
        StorageSlot::new(
            B256::from(U256::from(key)),
            place(U256::from(field), offset, len).unwrap(),
            range_mask(offset, len).unwrap(),
        )
    }

    #[test]
    fn test_merges_disjoint_bytes() {
        let packed = pack_slots(vec![write(0, 0x01, 0, 1), write(0, 0xaabb, 1, 2)]).unwrap();
        assert_eq!(packed.len(), 1);
        assert_eq!(
            U256::from_be_bytes(packed[0].value.0),
            U256::from(0xaabb01u64)
        );
        assert_eq!(packed[0].mask, range_mask(0, 3).unwrap());
    }

    #[test]
    fn test_keeps_first_appearance_order() {
        let packed = pack_slots(vec![
            write(2, 1, 0, 1),
            write(1, 1, 0, 1),
            write(2, 1, 1, 1),
        ])
        .unwrap();
        let keys: Vec<_> = packed.iter().map(|s| U256::from_be_bytes(s.key.0)).collect();
        assert_eq!(keys, [U256::from(2), U256::from(1)]);
    }

    #[test]
    fn test_zero_bytes_do_not_collide() {
        // A zero value written over a packed neighbour is indistinguishable from unset bytes.
        let packed = pack_slots(vec![write(0, 0, 0, 2), write(0, 0x1234, 0, 2)]).unwrap();
        assert_eq!(U256::from_be_bytes(packed[0].value.0), U256::from(0x1234));
    }

    #[test]
    fn test_overlap_is_reported() {
        let err = pack_slots(vec![write(7, 0xff, 0, 1), write(7, 0x0101, 0, 2)]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::SlotOverlap { key, offset: 0 } if key == B256::from(U256::from(7))
        ));
        assert_eq!(err.kind(), crate::ErrorKind::Corruption);
    }
}
