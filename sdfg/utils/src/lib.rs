//! Shared utilities for the SDFG engine.
mod errors;
mod idx;

pub use errors::{Error, SdfgResult};
pub use idx::{IndexRef, IndexedStore};
