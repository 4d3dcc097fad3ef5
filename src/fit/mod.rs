//! Curve fitting for one condition group.
//!
//! Responsibilities:
//!
//! - convert reported standard errors into regression weights (`weights`)
//! - fit one weighted spline curve per (group, complexity) pair (`fitter`)
//! - orchestrate eligibility, per-group pipelines, and parallel evaluation
//!   across groups (`groups`)

pub mod fitter;
pub mod groups;
pub mod weights;

pub use fitter::*;
pub use groups::*;
pub use weights::*;
