use crate::{
    db::StorageIo,
    primitives::{
        Address,
        B256,
    },
};

use async_trait::async_trait;
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    convert::Infallible,
};

/// In-memory contract storage.
///
/// Zero values are not stored, so writing zero to a slot is the same as clearing it.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    storage: RwLock<HashMap<Address, HashMap<B256, B256>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, address: Address, slot: B256, value: B256) {
        let mut storage = self.storage.write();
        if value.is_zero() {
            if let Some(account) = storage.get_mut(&address) {
                account.remove(&slot);
            }
        } else {
            storage.entry(address).or_default().insert(slot, value);
        }
    }

    pub fn get(&self, address: Address, slot: B256) -> B256 {
        self.storage
            .read()
            .get(&address)
            .and_then(|account| account.get(&slot))
            .copied()
            .unwrap_or_default()
    }

    /// Non-zero slots of `address`.
    pub fn slots(&self, address: Address) -> HashMap<B256, B256> {
        self.storage
            .read()
            .get(&address)
            .cloned()
            .unwrap_or_default()
    }
}

impl FromIterator<(Address, B256, B256)> for MemoryStorage {
    fn from_iter<T: IntoIterator<Item = (Address, B256, B256)>>(iter: T) -> Self {
        let storage = Self::new();
        for (address, slot, value) in iter {
            storage.insert(address, slot, value);
        }
        storage
    }
}

#[async_trait]
impl StorageIo for MemoryStorage {
    type Error = Infallible;

    async fn get_slot(&self, address: Address, slot: B256) -> Result<B256, Self::Error> {
        Ok(self.get(address, slot))
    }

    async fn put_slot(&self, address: Address, slot: B256, value: B256) -> Result<(), Self::Error> {
        self.insert(address, slot, value);
        Ok(())
    }
}
