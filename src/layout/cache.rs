use super::{
    LayoutError,
    StorageLayout,
};

use moka::sync::Cache;
use std::sync::Arc;
use tracing::debug;

/// Caller-owned cache of resolved layouts, keyed by contract identity.
///
/// Cloning the cache shares the underlying entries.
#[derive(Debug, Clone)]
pub struct LayoutCache {
    layouts: Cache<String, Arc<StorageLayout>>,
}

impl LayoutCache {
    /// Creates a cache holding at most `max_capacity` layouts.
    pub fn new(max_capacity: u64) -> Self {
        Self {
            layouts: Cache::new(max_capacity),
        }
    }

    pub fn get(&self, contract: &str) -> Option<Arc<StorageLayout>> {
        self.layouts.get(contract)
    }

    /// Inserts a layout, replacing any previous layout for the contract.
    pub fn insert(&self, contract: &str, layout: StorageLayout) -> Arc<StorageLayout> {
        let layout = Arc::new(layout);
        self.layouts.insert(contract.to_string(), layout.clone());
        layout
    }

    /// Returns the cached layout for `contract`, running `loader` on a miss.
    ///
    /// Loader failures are not cached.
    pub fn get_or_load<F>(
        &self,
        contract: &str,
        loader: F,
    ) -> Result<Arc<StorageLayout>, LayoutError>
    where
        F: FnOnce() -> Result<StorageLayout, LayoutError>,
    {
        if let Some(layout) = self.get(contract) {
            return Ok(layout);
        }
        debug!(contract, "Loading storage layout");
        Ok(self.insert(contract, loader()?))
    }

    pub fn invalidate(&self, contract: &str) {
        self.layouts.invalidate(contract);
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::STORAGE_GETTER_LAYOUT;
    use std::cell::Cell;

    #[test]
    fn test_get_or_load_caches() {
        let cache = LayoutCache::default();
        let loads = Cell::new(0);
        let loader = || {
            loads.set(loads.get() + 1);
            StorageLayout::from_json_str(STORAGE_GETTER_LAYOUT)
        };

        let first = cache.get_or_load("StorageGetter", loader).unwrap();
        let second = cache.get_or_load("StorageGetter", loader).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn test_failed_loads_are_not_cached() {
        let cache = LayoutCache::default();
        let err = cache
            .get_or_load("Missing", || {
                Err(LayoutError::ContractNotFound("Missing".to_string()))
            })
            .unwrap_err();
        assert!(matches!(err, LayoutError::ContractNotFound(_)));
        assert!(cache.get("Missing").is_none());
    }

    #[test]
    fn test_invalidate() {
        let cache = LayoutCache::default();
        cache.insert(
            "StorageGetter",
            StorageLayout::from_json_str(STORAGE_GETTER_LAYOUT).unwrap(),
        );
        assert!(cache.get("StorageGetter").is_some());

        cache.invalidate("StorageGetter");
        assert!(cache.get("StorageGetter").is_none());
    }
}
