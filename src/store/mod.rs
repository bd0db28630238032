//! Typed access to a single contract's storage.
//!
//! [`ContractStorage`] ties a resolved layout to a storage backend and a contract address.
//! Writes go through [`ContractStorage::set_variable`], reads through
//! [`ContractStorage::get_variable`].
//
// # Example
//
//```
// #[tokio::main]
// async fn main() {
//     use serde_json::json;
//     use storage_codec::{
//         db::MemoryStorage,
//         layout::StorageLayout,
//         primitives::Address,
//         store::ContractStorage,
//     };
//
//     let layout = StorageLayout::from_json_str(LAYOUT).unwrap();
//     let storage = ContractStorage::new(layout.into(), MemoryStorage::new(), Address::ZERO);
//
//     storage.set_variable("_uint256", &json!("1234")).await.unwrap();
//     let value = storage.get_variable("_uint256", &[]).await.unwrap();
//     assert_eq!(serde_json::to_value(&value).unwrap(), json!("1234"));
// }
// ```

mod reader;
mod writer;

use crate::{
    db::StorageIo,
    layout::StorageLayout,
    primitives::Address,
};

use std::sync::Arc;

/// A contract's storage, viewed through its storage layout.
#[derive(Debug, Clone)]
pub struct ContractStorage<S> {
    layout: Arc<StorageLayout>,
    storage: S,
    address: Address,
}

impl<S: StorageIo> ContractStorage<S> {
    pub fn new(layout: Arc<StorageLayout>, storage: S, address: Address) -> Self {
        Self {
            layout,
            storage,
            address,
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn address(&self) -> Address {
        self.address
    }
}
