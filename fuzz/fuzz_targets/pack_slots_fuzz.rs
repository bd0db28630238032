#![no_main]
use libfuzzer_sys::fuzz_target;
use storage_codec::{
    codec::pack_slots,
    primitives::{
        StorageSlot,
        B256,
        U256,
    },
    utils::word::{
        place,
        range_mask,
    },
    CodecError,
};

/// Builds a write of `len` bytes at `offset` into one of a handful of slots from 4 bytes of
/// fuzzer input plus up to 32 bytes of field data.
fn create_write(data: &[u8]) -> Option<(StorageSlot, usize)> {
    if data.len() < 3 {
        return None;
    }
    let key = B256::from(U256::from(data[0] % 4));
    let offset = usize::from(data[1] % 32);
    let len = usize::from(data[2] % 32) + 1;
    if offset + len > 32 {
        return None;
    }
    let field_bytes = &data[3..data.len().min(3 + len)];
    let field = U256::from_be_slice(field_bytes);

    let slot = StorageSlot::new(
        key,
        place(field, offset, len).ok()?,
        range_mask(offset, len).ok()?,
    );
    Some((slot, 3 + field_bytes.len()))
}

fuzz_target!(|data: &[u8]| {
    let mut writes = Vec::new();
    let mut rest = data;
    while let Some((write, used)) = create_write(rest) {
        writes.push(write);
        rest = &rest[used..];
    }

    match pack_slots(writes.clone()) {
        Ok(packed) => {
            // Every key appears once and every written byte survives the merge.
            for (i, slot) in packed.iter().enumerate() {
                assert!(packed[i + 1..].iter().all(|other| other.key != slot.key));
            }
            for write in &writes {
                let merged = packed.iter().find(|slot| slot.key == write.key).unwrap();
                assert_eq!(merged.value & write.value, write.value);
                assert_eq!(merged.mask & write.mask, write.mask);
            }
        }
        Err(CodecError::SlotOverlap { key, offset }) => {
            assert!(offset < 32);
            assert!(writes.iter().filter(|write| write.key == key).count() >= 2);
        }
        Err(err) => panic!("unexpected error: {err}"),
    }
});
