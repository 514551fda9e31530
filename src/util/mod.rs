//! Utility types for voxfile.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam

mod error;
mod math;

pub use error::*;
pub use math::*;
