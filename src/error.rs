use crate::{
    primitives::{
        B256,
        U256,
    },
    utils::WordError,
};

use std::error::Error as StdError;
use thiserror::Error;

/// Broad classes of codec failures. Every class is fatal for the current operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The layout does not describe what was asked for.
    Schema,
    /// The supplied or stored value does not match its declared type.
    Value,
    /// Encoded slots collided while packing.
    Corruption,
    /// A mapping was reached without a key to resolve it.
    MissingContext,
    /// The storage backend failed.
    Storage,
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Could not find a matching variable definition for {0}")]
    VariableNotFound(String),
    #[error("Type {0} is not present in the storage layout")]
    UnknownType(String),
    #[error("Type {0} is not supported by the storage codec")]
    UnsupportedType(String),
    #[error("Dynamically sized {ty} must start at offset 0, found offset {offset}")]
    MisalignedDynamicValue { ty: String, offset: usize },
    #[error("Invalid slot placement: {0}")]
    Placement(#[from] WordError),
    #[error("Invalid value {value} for type {ty}: {reason}")]
    InvalidValue {
        ty: String,
        value: String,
        reason: String,
    },
    #[error("Value {value} does not fit in type {ty}")]
    ValueOutOfRange { ty: String, value: String },
    #[error("Unexpected mapping key for non-mapping type {0}")]
    UnexpectedMappingKey(String),
    #[error("Stored length {length} of {ty} exceeds the readable maximum")]
    LengthTooLarge { ty: String, length: U256 },
    #[error("Ran out of storage slots while decoding")]
    TruncatedSlots,
    #[error("{0} storage slots were left over after decoding")]
    TrailingSlots(usize),
    #[error("Mapping {0} cannot be decoded as a whole, read it through a key path")]
    MappingNotDecodable(String),
    #[error("Malformed storage slot sequence: {0}")]
    MalformedSlots(&'static str),
    #[error("Storage slot {key} has overlapping non-zero bytes at offset {offset}")]
    SlotOverlap { key: B256, offset: usize },
    #[error("Mapping {0} requires a key")]
    MissingMappingKey(String),
    #[error("Storage backend error: {0}")]
    Storage(#[source] Box<dyn StdError + Send + Sync>),
}

impl CodecError {
    /// Wraps a storage backend error.
    pub fn storage<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Storage(Box::new(err))
    }

    pub(crate) fn invalid_value(
        ty: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            ty: ty.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::VariableNotFound(_)
            | Self::UnknownType(_)
            | Self::UnsupportedType(_)
            | Self::MisalignedDynamicValue { .. }
            | Self::Placement(_) => ErrorKind::Schema,
            Self::InvalidValue { .. }
            | Self::ValueOutOfRange { .. }
            | Self::UnexpectedMappingKey(_)
            | Self::MappingNotDecodable(_)
            | Self::LengthTooLarge { .. }
            | Self::TruncatedSlots
            | Self::TrailingSlots(_)
            | Self::MalformedSlots(_) => ErrorKind::Value,
            Self::SlotOverlap { .. } => ErrorKind::Corruption,
            Self::MissingMappingKey(_) => ErrorKind::MissingContext,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}
