//! Input helpers.
//!
//! - CSV ingest of raw x/y columns (`ingest`)

pub mod ingest;

pub use ingest::*;
