//! Core layer - field, dictionary and rotation codecs.
//!
//! This module provides:
//! - [`ByteReader`] / [`ByteWriter`] - Bounds-checked little-endian cursors
//! - [`Dict`] - Ordered string dictionary shared by most chunk kinds
//! - [`Rotation`] - Packed rotation byte and its signed permutation matrix

mod cursor;
mod dict;
mod rotation;

pub use cursor::{ByteReader, ByteWriter};
pub use dict::{decode_dict, encode_dict, Dict};
pub use rotation::{decode_rotation, encode_rotation, Rotation};
