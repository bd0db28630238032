pub mod slots;

pub mod word;
pub use word::WordError;
