use crate::{
    db::StorageIo,
    primitives::{
        Address,
        B256,
        U256,
    },
};

use async_trait::async_trait;
use parking_lot::RwLock;
use revm::{
    db::CacheDB,
    DatabaseRef,
};
use std::sync::Arc;

/// Storage backed by a shared revm [`CacheDB`].
///
/// Reads fall through to the wrapped database, writes land in the cache layer.
#[derive(Debug)]
pub struct SharedRevmStorage<ExtDb> {
    db: Arc<RwLock<CacheDB<ExtDb>>>,
}

impl<ExtDb> Clone for SharedRevmStorage<ExtDb> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<ExtDb> SharedRevmStorage<ExtDb> {
    pub fn new(db: CacheDB<ExtDb>) -> Self {
        Self {
            db: Arc::new(RwLock::new(db)),
        }
    }

    /// Shares an existing database handle.
    pub fn from_shared(db: Arc<RwLock<CacheDB<ExtDb>>>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Arc<RwLock<CacheDB<ExtDb>>> {
        &self.db
    }
}

#[async_trait]
impl<ExtDb> StorageIo for SharedRevmStorage<ExtDb>
where
    ExtDb: DatabaseRef + Send + Sync,
    ExtDb::Error: std::error::Error + Send + Sync + 'static,
{
    type Error = ExtDb::Error;

    async fn get_slot(&self, address: Address, slot: B256) -> Result<B256, Self::Error> {
        let value = self.db.read().storage_ref(address, U256::from_be_bytes(slot.0))?;
        Ok(B256::from(value))
    }

    async fn put_slot(&self, address: Address, slot: B256, value: B256) -> Result<(), Self::Error> {
        self.db.write().insert_account_storage(
            address,
            U256::from_be_bytes(slot.0),
            U256::from_be_bytes(value.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revm::db::EmptyDB;

    #[tokio::test]
    async fn test_reads_and_writes_through_cache_db() {
        let storage = SharedRevmStorage::new(CacheDB::new(EmptyDB::default()));
        let address = Address::repeat_byte(0xaa);
        let slot = B256::from(U256::from(3));

        assert_eq!(storage.get_slot(address, slot).await.unwrap(), B256::ZERO);

        storage
            .put_slot(address, slot, B256::repeat_byte(0x11))
            .await
            .unwrap();
        assert_eq!(
            storage.get_slot(address, slot).await.unwrap(),
            B256::repeat_byte(0x11)
        );

        let shared = storage.clone();
        let raw = shared
            .db()
            .read()
            .storage_ref(address, U256::from(3))
            .unwrap();
        assert_eq!(raw, U256::from_be_bytes([0x11; 32]));
    }
}
