use super::{
    LayoutError,
    RawTypeDefinition,
    StorageEntry,
};

use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;

/// How the compiler stores a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Fixed size, stored directly and possibly packed with its neighbours.
    Inplace,
    /// `bytes` and `string`.
    Bytes,
    Mapping,
    DynamicArray,
}

/// Value types that fit in a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Address,
    Bool,
    /// Unsigned integer of the given bit width. Enums resolve to this as well.
    Uint(u16),
    /// Signed integer of the given bit width.
    Int(u16),
    /// `bytesN`.
    FixedBytes(usize),
}

impl ScalarType {
    /// Number of bytes the value occupies in its slot.
    pub fn size(&self) -> usize {
        match self {
            Self::Address => 20,
            Self::Bool => 1,
            Self::Uint(bits) | Self::Int(bits) => usize::from(*bits) / 8,
            Self::FixedBytes(len) => *len,
        }
    }

    /// Parses an inplace type label such as `uint256`, `address payable` or `enum Foo.Bar`.
    fn parse(label: &str, number_of_bytes: usize) -> Option<Self> {
        match label {
            "bool" => return Some(Self::Bool),
            "address" | "address payable" => return Some(Self::Address),
            _ => {}
        }
        if label.starts_with("contract ") {
            return Some(Self::Address);
        }
        if label.starts_with("enum ") {
            let bits = u16::try_from(number_of_bytes * 8).ok()?;
            return Some(Self::Uint(bits));
        }
        if let Some(bits) = label.strip_prefix("uint") {
            return parse_bits(bits).map(Self::Uint);
        }
        if let Some(bits) = label.strip_prefix("int") {
            return parse_bits(bits).map(Self::Int);
        }
        if let Some(len) = label.strip_prefix("bytes") {
            let len: usize = len.parse().ok()?;
            return (1..=32).contains(&len).then_some(Self::FixedBytes(len));
        }
        None
    }
}

fn parse_bits(bits: &str) -> Option<u16> {
    if bits.is_empty() {
        return Some(256);
    }
    let bits: u16 = bits.parse().ok()?;
    (bits % 8 == 0 && (8..=256).contains(&bits)).then_some(bits)
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => write!(f, "address"),
            Self::Bool => write!(f, "bool"),
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Int(bits) => write!(f, "int{bits}"),
            Self::FixedBytes(len) => write!(f, "bytes{len}"),
        }
    }
}

/// Structured form of a type, parsed once from the compiler's label and encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Scalar(ScalarType),
    Struct { members: Vec<StorageEntry> },
    /// Fixed-length array stored inplace, e.g. `uint8[3]`.
    StaticArray { base: String, len: usize },
    Bytes,
    String,
    Mapping { key: String, value: String },
    DynamicArray { base: String },
    /// A type the codec cannot encode, such as a function pointer. Fails when used.
    Unsupported,
}

/// A resolved entry of the layout's type registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageType {
    pub label: String,
    pub number_of_bytes: usize,
    pub kind: TypeKind,
}

impl StorageType {
    pub fn encoding(&self) -> Encoding {
        match self.kind {
            TypeKind::Scalar(_)
            | TypeKind::Struct { .. }
            | TypeKind::StaticArray { .. }
            | TypeKind::Unsupported => Encoding::Inplace,
            TypeKind::Bytes | TypeKind::String => Encoding::Bytes,
            TypeKind::Mapping { .. } => Encoding::Mapping,
            TypeKind::DynamicArray { .. } => Encoding::DynamicArray,
        }
    }

    /// Returns the scalar type if values of this type fit in one slot.
    pub fn as_scalar(&self) -> Option<ScalarType> {
        match self.kind {
            TypeKind::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub(super) fn resolve(id: &str, raw: RawTypeDefinition) -> Result<Self, LayoutError> {
        let malformed = |reason: &str| {
            LayoutError::MalformedType {
                id: id.to_string(),
                reason: reason.to_string(),
            }
        };

        let number_of_bytes = raw
            .number_of_bytes
            .parse::<usize>()
            .map_err(|_| malformed("numberOfBytes is not a number"))?;

        let kind = match raw.encoding {
            Encoding::Inplace => {
                if let Some(members) = raw.members {
                    TypeKind::Struct {
                        members: members
                            .into_iter()
                            .map(StorageEntry::try_from)
                            .collect::<Result<_, _>>()?,
                    }
                } else if let Some(base) = raw.base {
                    match static_array_len(&raw.label) {
                        Some(len) => TypeKind::StaticArray { base, len },
                        None => TypeKind::Unsupported,
                    }
                } else {
                    ScalarType::parse(&raw.label, number_of_bytes)
                        .map_or(TypeKind::Unsupported, TypeKind::Scalar)
                }
            }
            Encoding::Bytes if raw.label == "string" => TypeKind::String,
            Encoding::Bytes => TypeKind::Bytes,
            Encoding::Mapping => {
                TypeKind::Mapping {
                    key: raw.key.ok_or_else(|| malformed("mapping without key type"))?,
                    value: raw
                        .value
                        .ok_or_else(|| malformed("mapping without value type"))?,
                }
            }
            Encoding::DynamicArray => {
                TypeKind::DynamicArray {
                    base: raw
                        .base
                        .ok_or_else(|| malformed("dynamic array without base type"))?,
                }
            }
        };

        Ok(Self {
            label: raw.label,
            number_of_bytes,
            kind,
        })
    }
}

/// Length of a static array from its label, e.g. `3` for `uint8[3]`.
fn static_array_len(label: &str) -> Option<usize> {
    let (_, suffix) = label.rsplit_once('[')?;
    suffix.strip_suffix(']')?.parse().ok()
}
