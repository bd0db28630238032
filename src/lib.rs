//! Storage layout codec for EVM contract storage.
//!
//! Translates between named, typed state variables described by a compiler `storageLayout`
//! and the raw 32-byte slots of contract storage:
//!
//! - [`codec::compute_storage_slots`] turns JSON values into packed slot writes.
//! - [`codec::get_variable_storage_slots`] and [`codec::decode_variable`] read a variable back.
//! - [`store::ContractStorage`] combines both with a [`db::StorageIo`] backend.

mod error;
pub use error::{
    CodecError,
    ErrorKind,
};

pub mod codec;

pub mod db;

pub mod layout;

pub mod primitives;

pub mod store;

pub mod utils;

#[cfg(any(test, feature = "test"))]
pub mod test_utils;
