//! Turning a fitted curve into reportable numbers.
//!
//! - `band`: the dense prediction grid with 95% bounds, clamp/back-transform,
//!   and extrapolation flags
//! - `buckets`: decade age-bucket summaries with a median-closest
//!   representative row per bucket

pub mod band;
pub mod buckets;

pub use band::*;
pub use buckets::*;
