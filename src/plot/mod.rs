//! Chart artifacts for fitted groups.

pub mod chart;

pub use chart::*;
