//! Runtime value representation.

pub mod value;

pub use value::Value;
