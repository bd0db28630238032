mod memory_db;
pub use memory_db::MemoryStorage;

mod shared_db;
pub use shared_db::SharedRevmStorage;

use crate::primitives::{
    Address,
    B256,
};

use async_trait::async_trait;
use std::sync::Arc;

/// Raw key/value access to contract storage.
///
/// Backends are expected to synchronize internally; the codec issues one call per slot and
/// never caches values.
#[async_trait]
pub trait StorageIo: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the value of `slot` for `address`, zero if it was never written.
    async fn get_slot(&self, address: Address, slot: B256) -> Result<B256, Self::Error>;

    async fn put_slot(&self, address: Address, slot: B256, value: B256) -> Result<(), Self::Error>;
}

#[async_trait]
impl<T> StorageIo for Arc<T>
where
    T: StorageIo + ?Sized,
{
    type Error = T::Error;

    async fn get_slot(&self, address: Address, slot: B256) -> Result<B256, Self::Error> {
        (**self).get_slot(address, slot).await
    }

    async fn put_slot(&self, address: Address, slot: B256, value: B256) -> Result<(), Self::Error> {
        (**self).put_slot(address, slot, value).await
    }
}
