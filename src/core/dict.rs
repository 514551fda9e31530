//! String-keyed attribute dictionaries.
//!
//! Node attributes, frame data, layer/camera attributes and modern materials
//! all share one wire form:
//!
//! ```text
//! u32 entry count
//! { u32 key length, key bytes, u32 value length, value bytes } x count
//! ```
//!
//! Keys and values are raw byte strings. They are kept as bytes so files with
//! non-UTF-8 attributes still round-trip; accessors expose a `&str` view.

use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use super::cursor::{ByteReader, ByteWriter};
use crate::util::{Error, Result};

/// Ordered attribute dictionary.
///
/// Uses SmallVec optimization for the common case of few entries.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Dict {
    entries: SmallVec<[(Vec<u8>, Vec<u8>); 4]>,
}

impl Dict {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        let value = value.into();

        for (k, v) in &mut self.entries {
            if *k == key {
                *v = value;
                return;
            }
        }
        self.entries.push((key, value));
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a value as text. Returns `None` for missing keys and non-UTF-8 values.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_bytes(key.as_bytes())
            .and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Get a raw value.
    pub fn get_bytes(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_slice() == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Parse a value with [`FromStr`].
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Read a `"0"` / `"1"` flag.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)?.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        }
    }

    /// Store a flag as `"1"` / `"0"`.
    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.insert(key, if value { "1" } else { "0" });
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.get_bytes(key.as_bytes()).is_some()
    }

    /// Remove a key and return its value.
    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        let pos = self.entries.iter().position(|(k, _)| k.as_slice() == key.as_bytes())?;
        Some(self.entries.remove(pos).1)
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over raw key-value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Iterate over entries with lossy text conversion.
    pub fn iter_lossy(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.entries.iter().map(|(k, v)| {
            (
                String::from_utf8_lossy(k).into_owned(),
                String::from_utf8_lossy(v).into_owned(),
            )
        })
    }

    /// Size of the encoded dictionary in bytes.
    pub fn encoded_len(&self) -> usize {
        4 + self
            .entries
            .iter()
            .map(|(k, v)| 8 + k.len() + v.len())
            .sum::<usize>()
    }

    // === Well-known keys ===

    /// Display name of a node or layer.
    pub const NAME: &'static str = "_name";

    /// Visibility flag of a node or layer.
    pub const HIDDEN: &'static str = "_hidden";

    /// Packed rotation byte of a transform frame.
    pub const ROTATION: &'static str = "_r";

    /// `"x y z"` translation of a transform frame.
    pub const TRANSLATION: &'static str = "_t";

    /// Keyframe index of a transform frame or shape model.
    pub const FRAME_INDEX: &'static str = "_f";

    /// Material type of a modern material.
    pub const TYPE: &'static str = "_type";

    /// `"r g b"` layer colour.
    pub const COLOR: &'static str = "_color";

    /// Get the `_name` attribute.
    pub fn name(&self) -> Option<&str> {
        self.get(Self::NAME)
    }

    /// Get the `_hidden` attribute (absent means visible).
    pub fn is_hidden(&self) -> bool {
        self.get_bool(Self::HIDDEN).unwrap_or(false)
    }
}

impl fmt::Debug for Dict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| {
                (String::from_utf8_lossy(k), String::from_utf8_lossy(v))
            }))
            .finish()
    }
}

impl<K: Into<Vec<u8>>, V: Into<Vec<u8>>> FromIterator<(K, V)> for Dict {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut dict = Self::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Dict {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter_lossy() {
            map.serialize_entry(&k, &v)?;
        }
        map.end()
    }
}

/// Read one length-prefixed byte string.
fn decode_string<'a>(reader: &mut ByteReader<'a>) -> Result<&'a [u8]> {
    let offset = reader.offset();
    let len = reader
        .read_u32()
        .map_err(|_| Error::dict(offset, "string length prefix truncated"))? as usize;
    if len > reader.remaining() {
        return Err(Error::dict(
            offset,
            format!("string length {} exceeds remaining {} bytes", len, reader.remaining()),
        ));
    }
    reader.read_bytes(len)
}

/// Decode a dictionary from the reader's current position.
pub fn decode_dict(reader: &mut ByteReader<'_>) -> Result<Dict> {
    let offset = reader.offset();
    let count = reader
        .read_u32()
        .map_err(|_| Error::dict(offset, "entry count truncated"))? as usize;

    // Every entry needs at least two length prefixes.
    if count.saturating_mul(8) > reader.remaining() {
        return Err(Error::dict(
            offset,
            format!("{} entries cannot fit in {} bytes", count, reader.remaining()),
        ));
    }

    let mut dict = Dict::new();
    for _ in 0..count {
        let key = decode_string(reader)?;
        let value = decode_string(reader)?;
        dict.insert(key, value);
    }
    Ok(dict)
}

/// Append a dictionary to the writer.
pub fn encode_dict(dict: &Dict, writer: &mut ByteWriter) {
    writer.write_len(dict.len());
    for (k, v) in dict.iter() {
        writer.write_len(k.len());
        writer.write_bytes(k);
        writer.write_len(v.len());
        writer.write_bytes(v);
    }
}
