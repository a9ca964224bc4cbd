//! A cache-friendly hash table keyed by byte strings, packing its records
//! into one contiguous buffer per bucket.

/// Table errors
pub mod error;
/// The array hash table
pub mod table;

pub use error::{AhtableError, Result};
pub use table::{ArrayHash, DefaultHashBuilder, Iter, Value, ValueHandle, MAX_KEY_LEN};
