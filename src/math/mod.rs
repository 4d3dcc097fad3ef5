//! Mathematical utilities: order statistics, spline basis, weighted least squares.

pub mod basis;
pub mod stats;
pub mod wls;

pub use basis::*;
pub use stats::*;
pub use wls::*;
