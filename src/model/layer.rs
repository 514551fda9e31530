//! Layers, cameras and the other dictionary-backed records.

use crate::core::Dict;

/// Layer (LAYR).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Layer {
    pub id: u32,
    pub attributes: Dict,
}

impl Layer {
    pub fn new(id: u32) -> Self {
        Self { id, attributes: Dict::new() }
    }

    /// Layer name.
    pub fn name(&self) -> Option<&str> {
        self.attributes.name()
    }

    /// Check the `_hidden` flag.
    pub fn is_hidden(&self) -> bool {
        self.attributes.is_hidden()
    }

    /// `_color` as RGB.
    pub fn color(&self) -> Option<[u8; 3]> {
        let mut parts = self.attributes.get(Dict::COLOR)?.split_whitespace();
        let mut rgb = [0u8; 3];
        for c in &mut rgb {
            *c = parts.next()?.parse().ok()?;
        }
        match parts.next() {
            None => Some(rgb),
            Some(_) => None,
        }
    }
}

/// Render camera (rCAM).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Camera {
    pub id: u32,
    pub attributes: Dict,
}

impl Camera {
    pub fn new(id: u32) -> Self {
        Self { id, attributes: Dict::new() }
    }

    /// Projection mode (`pers`, `orth`, ...).
    pub fn mode(&self) -> Option<&str> {
        self.attributes.get("_mode")
    }

    /// Field of view in degrees.
    pub fn fov(&self) -> Option<f32> {
        self.attributes.get_parsed("_fov")
    }
}

/// Render settings object (rOBJ).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RenderObject {
    pub attributes: Dict,
}

impl RenderObject {
    /// Setting type (`_bg`, `_ground`, `_lens`, ...).
    pub fn kind(&self) -> Option<&str> {
        self.attributes.get(Dict::TYPE)
    }
}

/// Note (NOTE).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Note {
    pub attributes: Dict,
}

/// Palette display-order map (IMAP): position -> palette index.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IndexMap(pub Vec<u8>);

impl IndexMap {
    /// Number of bytes in an IMAP chunk.
    pub const LEN: usize = 256;

    /// The identity ordering.
    pub fn identity() -> Self {
        Self((0..=255u8).collect())
    }
}
