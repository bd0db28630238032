//! Storage layouts as produced by the compiler's `storageLayout` output.
//!
//! The serde model (`Raw*`) mirrors the compiler JSON. [`StorageLayout`] is the resolved
//! form used by the codec: slots are parsed into [`U256`] and every type label is parsed
//! once into a [`TypeKind`]. Type references stay lazy, so a dangling type id only fails
//! when it is dereferenced.

mod cache;
pub use cache::LayoutCache;

mod error;
pub use error::LayoutError;

pub mod provider;

mod types;
pub use types::{
    Encoding,
    ScalarType,
    StorageType,
    TypeKind,
};

use crate::{
    error::CodecError,
    primitives::U256,
};

use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashMap;

/// The `storageLayout` section of the compiler output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawStorageLayout {
    pub storage: Vec<RawStorageVariable>,
    /// `null` in the compiler output for contracts without state.
    #[serde(default)]
    pub types: Option<HashMap<String, RawTypeDefinition>>,
}

/// A state variable or struct member as emitted by the compiler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawStorageVariable {
    pub label: String,
    /// Base-10 slot index.
    pub slot: String,
    /// Byte offset within the slot, counted from the low-order end.
    pub offset: usize,
    #[serde(rename = "type")]
    pub ty: String,
}

/// An entry of the compiler's type registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawTypeDefinition {
    pub encoding: Encoding,
    pub label: String,
    #[serde(rename = "numberOfBytes")]
    pub number_of_bytes: String,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub members: Option<Vec<RawStorageVariable>>,
}

/// A resolved variable or struct member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    pub label: String,
    pub slot: U256,
    pub offset: usize,
    /// Type id into the layout's type registry.
    pub ty: String,
}

impl TryFrom<RawStorageVariable> for StorageEntry {
    type Error = LayoutError;

    fn try_from(raw: RawStorageVariable) -> Result<Self, Self::Error> {
        let slot = U256::from_str_radix(&raw.slot, 10).map_err(|_| {
            LayoutError::InvalidSlot {
                label: raw.label.clone(),
                slot: raw.slot.clone(),
            }
        })?;
        if raw.offset >= 32 {
            return Err(LayoutError::InvalidOffset {
                label: raw.label,
                offset: raw.offset,
            });
        }
        Ok(Self {
            label: raw.label,
            slot,
            offset: raw.offset,
            ty: raw.ty,
        })
    }
}

/// Resolved storage layout of a single contract. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawStorageLayout")]
pub struct StorageLayout {
    storage: Vec<StorageEntry>,
    types: HashMap<String, StorageType>,
}

impl StorageLayout {
    pub fn from_raw(raw: RawStorageLayout) -> Result<Self, LayoutError> {
        let storage = raw
            .storage
            .into_iter()
            .map(StorageEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let types = raw
            .types
            .unwrap_or_default()
            .into_iter()
            .map(|(id, def)| {
                let ty = StorageType::resolve(&id, def)?;
                Ok((id, ty))
            })
            .collect::<Result<HashMap<_, _>, LayoutError>>()?;

        Ok(Self { storage, types })
    }

    /// Parses a bare `storageLayout` JSON object.
    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Top-level state variables in declaration order.
    pub fn variables(&self) -> &[StorageEntry] {
        &self.storage
    }

    /// Looks up a top-level state variable by name.
    pub fn variable(&self, label: &str) -> Result<&StorageEntry, CodecError> {
        self.storage
            .iter()
            .find(|entry| entry.label == label)
            .ok_or_else(|| CodecError::VariableNotFound(label.to_string()))
    }

    /// Dereferences a type id.
    pub fn resolve(&self, id: &str) -> Result<&StorageType, CodecError> {
        self.types
            .get(id)
            .ok_or_else(|| CodecError::UnknownType(id.to_string()))
    }
}

impl TryFrom<RawStorageLayout> for StorageLayout {
    type Error = LayoutError;

    fn try_from(raw: RawStorageLayout) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
    }
}
