//! # voxfile
//!
//! Rust reader and writer for the MagicaVoxel `.vox` chunked container.
//!
//! A `.vox` file is a magic/version header followed by one MAIN chunk whose
//! children carry models, the palette, materials, the scene graph, layers and
//! render settings. This crate decodes that byte stream into a
//! [`VoxelDocument`] and encodes it back.
//!
//! ## Modules
//!
//! - [`util`] - Errors and math re-exports
//! - [`core`] - Field cursors, dictionaries, packed rotations
//! - [`chunk`] - Generic chunk framing (read, iterate, build)
//! - [`model`] - Models, palette, materials, layers, cameras
//! - [`scene`] - Transform/group/shape nodes and graph resolution
//! - [`vox`] - Document decoder and encoder
//! - [`io`] - File helpers
//!
//! ## Example
//!
//! ```ignore
//! use voxfile::prelude::*;
//!
//! let doc = voxfile::io::open("castle.vox")?;
//! for inst in doc.visible_instances()? {
//!     let model = &doc.models[inst.model_id as usize];
//!     println!("{} voxels at {}", model.voxel_count(), inst.transform.translation);
//! }
//! ```

pub mod util;
pub mod core;
pub mod chunk;
pub mod model;
pub mod scene;
pub mod vox;
pub mod io;

// Re-export commonly used types
pub use util::{Error, Result};
pub use model::VoxelDocument;
pub use vox::{decode, decode_with, encode, encode_with};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::core::{Dict, Rotation};
    pub use crate::model::{
        Layer, LegacyMaterial, Material, MaterialKind, Model, Palette, Rgba, Size, Voxel,
        VoxelDocument,
    };
    pub use crate::scene::{Frame, SceneGraph, SceneNode, ShapeInstance, WorldTransform};
    pub use crate::vox::{DecodeReport, DecodeWarning, ReadOptions, WriteOptions};
}
