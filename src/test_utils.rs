#![cfg(any(test, feature = "test"))]

use crate::{
    db::MemoryStorage,
    layout::StorageLayout,
    primitives::{
        address,
        Address,
        FixedBytes,
    },
    store::ContractStorage,
};

use std::sync::Arc;

/// Storage layout of a contract declaring one variable of every supported shape.
pub const STORAGE_GETTER_LAYOUT: &str = include_str!("../testdata/storage_getter.layout.json");

pub const CONTRACT_ADDRESS: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");

pub fn storage_getter_layout() -> Arc<StorageLayout> {
    Arc::new(
        StorageLayout::from_json_str(STORAGE_GETTER_LAYOUT)
            .expect("storage getter layout should parse"),
    )
}

/// Empty in-memory storage for the storage getter contract.
pub fn storage_getter() -> ContractStorage<MemoryStorage> {
    ContractStorage::new(
        storage_getter_layout(),
        MemoryStorage::new(),
        CONTRACT_ADDRESS,
    )
}

/// Returns a random FixedBytes of length N
pub fn random_bytes<const N: usize>() -> FixedBytes<N> {
    let mut value = [0u8; N];
    for byte in value.iter_mut() {
        *byte = rand::random();
    }
    FixedBytes::new(value)
}
