//! Internal Implementation Details
//!
//! Not part of the public API. Types in here may change between minor
//! versions.
//!
//! - [`constants`]: Frame sizes, descriptor sizes and defaults
//! - [`dma`]: Descriptor records, shared-memory pools and ring bookkeeping

#[macro_use]
mod fmt;

pub(crate) mod constants;
pub(crate) mod dma;
