pub use alloy_primitives::I256;
pub use revm::primitives::{
    address,
    hex,
    keccak256,
    Address,
    Bytes,
    FixedBytes,
    B256,
    U256,
};

use serde::Serialize;

/// A storage write produced by the slot writer.
///
/// `mask` marks the bytes of the slot owned by the written value; bytes outside the
/// mask belong to neighbouring packed variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StorageSlot {
    pub key: B256,
    pub value: B256,
    pub mask: B256,
}

impl StorageSlot {
    pub fn new(key: B256, value: B256, mask: B256) -> Self {
        Self { key, value, mask }
    }

    /// A write that owns the entire slot.
    pub fn full(key: B256, value: B256) -> Self {
        Self {
            key,
            value,
            mask: B256::repeat_byte(0xff),
        }
    }

    /// Returns true if the write replaces the whole slot.
    pub fn is_full(&self) -> bool {
        self.mask == B256::repeat_byte(0xff)
    }

    /// Splices the owned bytes into the previous slot value.
    pub fn apply(&self, previous: B256) -> B256 {
        (previous & !self.mask) | (self.value & self.mask)
    }
}
