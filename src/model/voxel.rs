//! Sparse voxel models (SIZE + XYZI).

use crate::util::{Error, Result, UVec3};

/// The size of a model in voxels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Size {
    /// Width (x extent).
    pub x: u32,
    /// Depth (y extent).
    pub y: u32,
    /// Height (z extent).
    pub z: u32,
}

impl Size {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Check if a coordinate lies inside `[0, size)` on every axis.
    #[inline]
    pub fn contains(&self, x: u8, y: u8, z: u8) -> bool {
        (x as u32) < self.x && (y as u32) < self.y && (z as u32) < self.z
    }

    /// Number of cells in the bounding box.
    pub fn volume(&self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }
}

impl From<Size> for UVec3 {
    fn from(s: Size) -> Self {
        UVec3::new(s.x, s.y, s.z)
    }
}

/// A sparse volumetric pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Voxel {
    pub x: u8,
    pub y: u8,
    pub z: u8,
    /// Palette index in `1..=255`; 0 means empty and is never stored.
    pub i: u8,
}

impl Voxel {
    pub const fn new(x: u8, y: u8, z: u8, i: u8) -> Self {
        Self { x, y, z, i }
    }
}

/// A sparse voxel model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Model {
    /// The size of the model in voxels.
    pub size: Size,
    /// The list of voxels in the model.
    pub voxels: Vec<Voxel>,
}

impl Model {
    /// Create an empty model.
    pub fn new(size: Size) -> Self {
        Self { size, voxels: Vec::new() }
    }

    /// Create a model with the given voxels.
    pub fn with_voxels(size: Size, voxels: Vec<Voxel>) -> Self {
        Self { size, voxels }
    }

    /// Number of stored voxels.
    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }

    /// Check if a voxel sits inside the model bounds.
    #[inline]
    pub fn contains(&self, voxel: &Voxel) -> bool {
        self.size.contains(voxel.x, voxel.y, voxel.z)
    }

    /// Check the voxel invariants. `index` identifies the model in errors.
    pub fn validate(&self, index: usize) -> Result<()> {
        for (i, v) in self.voxels.iter().enumerate() {
            if v.i == 0 {
                return Err(Error::InvalidVoxel {
                    model: index,
                    index: i,
                    reason: "colour index 0 is reserved for empty space".to_string(),
                });
            }
            if !self.contains(v) {
                return Err(Error::InvalidVoxel {
                    model: index,
                    index: i,
                    reason: format!(
                        "({}, {}, {}) outside size {}x{}x{}",
                        v.x, v.y, v.z, self.size.x, self.size.y, self.size.z
                    ),
                });
            }
        }
        Ok(())
    }
}
