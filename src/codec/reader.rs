use super::{
    element_location,
    mapping_entry_slot,
};
use crate::{
    db::StorageIo,
    error::CodecError,
    layout::{
        Encoding,
        ScalarType,
        StorageLayout,
        TypeKind,
    },
    primitives::{
        Address,
        B256,
        U256,
    },
    utils::{
        slots::{
            data_slot,
            slot_key,
        },
        word::WORD_BYTES,
    },
};

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{
    debug,
    instrument,
    trace,
};

/// Largest array length or byte string chunk count read from storage.
pub const MAX_DYNAMIC_LENGTH: usize = 1 << 20;

/// Converts a length read from storage, rejecting anything above `limit`.
fn checked_length(ty: &str, length: U256, limit: usize) -> Result<usize, CodecError> {
    usize::try_from(length)
        .ok()
        .filter(|length| *length <= limit)
        .ok_or_else(|| {
            CodecError::LengthTooLarge {
                ty: ty.to_string(),
                length,
            }
        })
}

/// What a looked up slot holds, as far as the decoder is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// A value type at the lookup's offset.
    Scalar(ScalarType),
    /// Header of a struct, followed by the lookups of its `members`.
    Struct { members: usize },
    /// Header of an array, followed by the lookups of its `len` elements.
    Array { len: usize },
    /// Header of a `bytes` or `string` value, followed by `chunks` chunk lookups.
    Bytes { chunks: usize, text: bool },
    /// Raw data of a byte string. The lookup's `length` gives the number of used bytes.
    Chunk,
    /// A mapping reached without a key. Never decodable.
    Mapping,
}

/// A slot the decoder needs, in the order the decoder consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotLookup {
    pub key: B256,
    pub kind: SlotKind,
    pub offset: usize,
    pub length: Option<usize>,
    /// Member name, set for struct members and top-level variables.
    pub label: Option<String>,
}

impl SlotLookup {
    fn new(key: B256, kind: SlotKind, label: Option<String>) -> Self {
        Self {
            key,
            kind,
            offset: 0,
            length: None,
            label,
        }
    }

    /// Pairs the lookup with the value read from storage.
    pub fn with_value(self, value: B256) -> SlotValue {
        SlotValue {
            value,
            lookup: self,
        }
    }
}

/// A [`SlotLookup`] paired with the value read from its slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotValue {
    pub value: B256,
    pub lookup: SlotLookup,
}

/// Computes the slot lookups needed to rebuild variable `name` of `address`.
///
/// `key_path` supplies one key per mapping level. Lengths of byte strings and dynamic
/// arrays are read from `storage`, one slot at a time.
#[instrument(skip(layout, storage, key_path), fields(keys = key_path.len()))]
pub async fn get_variable_storage_slots<S>(
    layout: &StorageLayout,
    name: &str,
    storage: &S,
    address: Address,
    key_path: &[Value],
) -> Result<Vec<SlotLookup>, CodecError>
where
    S: StorageIo + ?Sized,
{
    let entry = layout.variable(name)?;
    let reader = SlotReader {
        layout,
        storage,
        address,
    };
    let lookups = reader
        .collect(
            &entry.ty,
            entry.slot,
            entry.offset,
            Some(entry.label.clone()),
            key_path,
        )
        .await?;
    debug!(lookups = lookups.len(), "Computed slot lookups");
    Ok(lookups)
}

struct SlotReader<'a, S: ?Sized> {
    layout: &'a StorageLayout,
    storage: &'a S,
    address: Address,
}

impl<'a, S> SlotReader<'a, S>
where
    S: StorageIo + ?Sized,
{
    async fn read(&self, slot: U256) -> Result<B256, CodecError> {
        let value = self
            .storage
            .get_slot(self.address, slot_key(slot))
            .await
            .map_err(CodecError::storage)?;
        trace!(%slot, %value, "Read slot");
        Ok(value)
    }

    fn collect<'r>(
        &'r self,
        ty_id: &'r str,
        slot: U256,
        offset: usize,
        label: Option<String>,
        keys: &'r [Value],
    ) -> BoxFuture<'r, Result<Vec<SlotLookup>, CodecError>>
    where
        'a: 'r,
    {
        Box::pin(async move {
            let layout = self.layout;
            let ty = layout.resolve(ty_id)?;

            match (&ty.kind, keys.split_first()) {
                (TypeKind::Mapping { key, value }, Some((first, rest))) => {
                    let entry_slot = mapping_entry_slot(layout.resolve(key)?, first, slot)?;
                    trace!(key = %first, slot = %entry_slot, "Derived mapping slot");
                    self.collect(value, entry_slot, 0, label, rest).await
                }
                (TypeKind::Mapping { .. }, None) => {
                    Err(CodecError::MissingMappingKey(
                        label.unwrap_or_else(|| ty.label.clone()),
                    ))
                }
                (_, Some(_)) => Err(CodecError::UnexpectedMappingKey(ty.label.clone())),
                (TypeKind::Scalar(scalar), None) => {
                    Ok(vec![SlotLookup {
                        offset,
                        ..SlotLookup::new(slot_key(slot), SlotKind::Scalar(*scalar), label)
                    }])
                }
                (TypeKind::Struct { members }, None) => {
                    let mut readable = Vec::with_capacity(members.len());
                    for member in members {
                        if layout.resolve(&member.ty)?.encoding() == Encoding::Mapping {
                            trace!(member = %member.label, "Skipping mapping member");
                            continue;
                        }
                        readable.push(member);
                    }

                    let mut lookups = vec![SlotLookup::new(
                        slot_key(slot),
                        SlotKind::Struct {
                            members: readable.len(),
                        },
                        label,
                    )];
                    for member in readable {
                        lookups.extend(
                            self.collect(
                                &member.ty,
                                slot.wrapping_add(member.slot),
                                member.offset,
                                Some(member.label.clone()),
                                &[],
                            )
                            .await?,
                        );
                    }
                    Ok(lookups)
                }
                (TypeKind::StaticArray { base, len }, None) => {
                    self.collect_elements(base, *len, slot, slot, label).await
                }
                (TypeKind::DynamicArray { base }, None) => {
                    let raw = U256::from_be_bytes(self.read(slot).await?.0);
                    let len = checked_length(&ty.label, raw, MAX_DYNAMIC_LENGTH)?;
                    self.collect_elements(base, len, slot, data_slot(slot), label)
                        .await
                }
                (TypeKind::Bytes | TypeKind::String, None) => {
                    if offset != 0 {
                        return Err(CodecError::MisalignedDynamicValue {
                            ty: ty.label.clone(),
                            offset,
                        });
                    }
                    let text = matches!(ty.kind, TypeKind::String);
                    let header = self.read(slot).await?;
                    byte_string_lookups(&ty.label, slot, header, text, label)
                }
                (TypeKind::Unsupported, None) => Err(CodecError::UnsupportedType(ty.label.clone())),
            }
        })
    }

    /// Array header at `slot` followed by `len` elements starting at `start`.
    async fn collect_elements(
        &self,
        base: &str,
        len: usize,
        slot: U256,
        start: U256,
        label: Option<String>,
    ) -> Result<Vec<SlotLookup>, CodecError> {
        let element = self.layout.resolve(base)?;
        let mut lookups = vec![SlotLookup::new(
            slot_key(slot),
            SlotKind::Array { len },
            label,
        )];
        for index in 0..len {
            let (element_slot, offset) = element_location(start, index, element);
            lookups.extend(
                self.collect(base, element_slot, offset, None, &[])
                    .await?,
            );
        }
        Ok(lookups)
    }
}

/// Lookups for a byte string whose base slot at `slot` holds `header`.
fn byte_string_lookups(
    ty: &str,
    slot: U256,
    header: B256,
    text: bool,
    label: Option<String>,
) -> Result<Vec<SlotLookup>, CodecError> {
    let field = U256::from_be_bytes(header.0);

    // Short values keep the data and `len * 2` in the base slot.
    if !field.bit(0) {
        let length = usize::from(header.0[WORD_BYTES - 1] / 2);
        if length >= WORD_BYTES {
            return Err(CodecError::MalformedSlots("short byte string longer than 31 bytes"));
        }
        let key = slot_key(slot);
        return Ok(vec![
            SlotLookup::new(key, SlotKind::Bytes { chunks: 1, text }, label),
            SlotLookup {
                length: Some(length),
                ..SlotLookup::new(key, SlotKind::Chunk, None)
            },
        ]);
    }

    let length = checked_length(
        ty,
        (field - U256::from(1)) / U256::from(2),
        MAX_DYNAMIC_LENGTH * WORD_BYTES,
    )?;
    let chunks = length.div_ceil(WORD_BYTES);
    let start = data_slot(slot);

    let mut lookups = vec![SlotLookup::new(
        slot_key(slot),
        SlotKind::Bytes { chunks, text },
        label,
    )];
    for index in 0..chunks {
        let used = (length - index * WORD_BYTES).min(WORD_BYTES);
        lookups.push(SlotLookup {
            length: Some(used),
            ..SlotLookup::new(
                slot_key(start.wrapping_add(U256::from(index))),
                SlotKind::Chunk,
                None,
            )
        });
    }
    Ok(lookups)
}
