//! Input/output helpers.
//!
//! - CSV ingest + schema validation (`ingest`)
//! - result exports (CSV tables + run-summary JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
