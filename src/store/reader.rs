use crate::{
    codec::{
        decode_variable,
        get_variable_storage_slots,
        DecodedValue,
    },
    db::StorageIo,
    error::CodecError,
    store::ContractStorage,
};

use serde_json::Value;
use tracing::instrument;

impl<S: StorageIo> ContractStorage<S> {
    /// Reads variable `name`, following `key_path` through any mappings on the way.
    #[instrument(skip(self, key_path), fields(address = %self.address))]
    pub async fn get_variable(
        &self,
        name: &str,
        key_path: &[Value],
    ) -> Result<DecodedValue, CodecError> {
        let lookups = get_variable_storage_slots(
            &self.layout,
            name,
            &self.storage,
            self.address,
            key_path,
        )
        .await?;

        let mut values = Vec::with_capacity(lookups.len());
        for lookup in lookups {
            let value = self
                .storage
                .get_slot(self.address, lookup.key)
                .await
                .map_err(CodecError::storage)?;
            values.push(lookup.with_value(value));
        }

        decode_variable(values)
    }
}
