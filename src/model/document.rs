//! The in-memory document.

use std::collections::BTreeMap;

use super::layer::{Camera, IndexMap, Layer, Note, RenderObject};
use super::material::Material;
use super::palette::Palette;
use super::voxel::Model;
use crate::chunk::CURRENT_VERSION;
use crate::scene::{SceneGraph, ShapeInstance};
use crate::util::{Error, Result};

/// Everything a .vox file describes.
///
/// Built once by the decoder, or by hand before encoding. Collections keep
/// file order; materials are keyed by id.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VoxelDocument {
    /// Version word from the file header.
    pub version: u32,
    /// Models in SIZE/XYZI order; shape nodes refer to them by index.
    pub models: Vec<Model>,
    pub palette: Palette,
    pub materials: BTreeMap<u8, Material>,
    /// Absent when the file has no scene graph chunks.
    pub scene: Option<SceneGraph>,
    pub layers: Vec<Layer>,
    pub cameras: Vec<Camera>,
    pub notes: Vec<Note>,
    pub render_objects: Vec<RenderObject>,
    pub index_map: Option<IndexMap>,
}

impl Default for VoxelDocument {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            models: Vec::new(),
            palette: Palette::default(),
            materials: BTreeMap::new(),
            scene: None,
            layers: Vec::new(),
            cameras: Vec::new(),
            notes: Vec::new(),
            render_objects: Vec::new(),
            index_map: None,
        }
    }
}

impl VoxelDocument {
    /// Empty document at the current version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Document holding `models` under the canonical scene layout.
    pub fn with_models(models: Vec<Model>) -> Self {
        let scene = SceneGraph::for_models(models.len());
        Self {
            models,
            scene: Some(scene),
            ..Self::default()
        }
    }

    /// Number of models.
    #[inline]
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Layer by id.
    pub fn layer(&self, id: u32) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Material by id.
    pub fn material(&self, id: u8) -> Option<&Material> {
        self.materials.get(&id)
    }

    /// Check every document invariant.
    pub fn validate(&self) -> Result<()> {
        for (i, model) in self.models.iter().enumerate() {
            model.validate(i)?;
        }
        self.palette.validate()?;
        if let Some(map) = &self.index_map {
            if map.0.len() != IndexMap::LEN {
                return Err(Error::InvalidIndexMap { len: map.0.len() });
            }
        }
        if let Some(scene) = &self.scene {
            scene.validate(self.models.len())?;
        }
        Ok(())
    }

    /// Shape instances from the scene root.
    ///
    /// Without a scene graph every model is placed once, untransformed.
    pub fn instances(&self) -> Result<Vec<ShapeInstance>> {
        match &self.scene {
            Some(scene) => scene.instances(),
            None => SceneGraph::for_models(self.models.len()).instances(),
        }
    }

    /// Instances not hidden by a node or by their layer.
    pub fn visible_instances(&self) -> Result<Vec<ShapeInstance>> {
        Ok(self
            .instances()?
            .into_iter()
            .filter(|inst| !inst.hidden)
            .filter(|inst| {
                inst.layer_id
                    .and_then(|id| self.layer(id))
                    .map_or(true, |layer| !layer.is_hidden())
            })
            .collect())
    }

    /// Total number of stored voxels.
    pub fn voxel_count(&self) -> usize {
        self.models.iter().map(Model::voxel_count).sum()
    }
}
