//! Math type re-exports.
//!
//! Scene-graph translations are integer vectors and rotations are signed
//! permutation matrices; both convert to glam types for consumers.

pub use glam::{IVec3, Mat3, UVec3, Vec3};
