//! Document model: voxel models, palette, materials and auxiliary records.

mod document;
mod layer;
mod material;
mod palette;
mod voxel;

pub use document::VoxelDocument;
pub use layer::{Camera, IndexMap, Layer, Note, RenderObject};
pub use material::{
    LegacyMaterial, LegacyProperty, Material, MaterialKind, TOTAL_POWER_BIT,
};
pub use palette::{Palette, Rgba, DEFAULT_PALETTE, PALETTE_SIZE};
pub use voxel::{Model, Size, Voxel};
