use crate::{
    codec::compute_storage_slots,
    db::StorageIo,
    error::CodecError,
    primitives::StorageSlot,
    store::ContractStorage,
};

use serde_json::Value;
use tracing::{
    debug,
    instrument,
    trace,
};

impl<S: StorageIo> ContractStorage<S> {
    /// Writes `value` to variable `name`.
    ///
    /// `null` leaves storage untouched. All slots are computed before the first write, so an
    /// invalid value never leaves a partial write behind. Bytes of a packed slot that belong
    /// to other variables are preserved.
    #[instrument(skip(self, value), fields(address = %self.address))]
    pub async fn set_variable(&self, name: &str, value: &Value) -> Result<(), CodecError> {
        if value.is_null() {
            return Ok(());
        }
        let slots = compute_storage_slots(&self.layout, [(name, value)])?;
        self.write_slots(slots).await
    }

    /// Writes several variables at once. Variables packed into the same slot are merged
    /// into a single write.
    #[instrument(skip_all, fields(address = %self.address))]
    pub async fn set_variables<'v, I>(&self, variables: I) -> Result<(), CodecError>
    where
        I: IntoIterator<Item = (&'v str, &'v Value)>,
    {
        let slots = compute_storage_slots(&self.layout, variables)?;
        self.write_slots(slots).await
    }

    async fn write_slots(&self, slots: Vec<StorageSlot>) -> Result<(), CodecError> {
        debug!(slots = slots.len(), "Writing storage slots");
        for slot in slots {
            let value = if slot.is_full() {
                slot.value
            } else {
                let previous = self
                    .storage
                    .get_slot(self.address, slot.key)
                    .await
                    .map_err(CodecError::storage)?;
                slot.apply(previous)
            };
            trace!(key = %slot.key, %value, "Writing slot");
            self.storage
                .put_slot(self.address, slot.key, value)
                .await
                .map_err(CodecError::storage)?;
        }
        Ok(())
    }
}
