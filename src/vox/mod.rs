//! Document codec: walks MAIN's children into a [`VoxelDocument`] and back.
//!
//! [`VoxelDocument`]: crate::model::VoxelDocument

mod decode;
mod encode;
mod options;
mod report;

pub use decode::{decode, decode_with};
pub use encode::{encode, encode_with};
pub use options::{MaterialPolicy, PackPolicy, ReadOptions, WriteOptions};
pub use report::{DecodeReport, DecodeWarning};
