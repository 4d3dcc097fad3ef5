//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - normalized effect-size observations (`Observation`)
//! - the response-scale policy (`EffectScale`, `CeilingPolicy`)
//! - prediction and summary outputs (`PredictionPoint`, `BucketSummary`)
//! - run configuration and exported row/summary types

pub mod types;

pub use types::*;
