//! Scene-graph node records.
//!
//! ```text
//! nTRN : node id, DICT attributes, child id, reserved (-1), layer id,
//!        frame count, DICT per frame (_r rotation byte, _t "x y z")
//! nGRP : node id, DICT attributes, child count, child ids
//! nSHP : node id, DICT attributes, model count (1), { model id, DICT }
//! ```

use crate::core::{Dict, Rotation};
use crate::util::{Error, IVec3, Result};

/// Layer id used by transforms that belong to no layer.
pub const NO_LAYER: u32 = u32::MAX;

/// One keyframe of a transform node.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Frame {
    /// `_r`
    pub rotation: Option<Rotation>,
    /// `_t`
    pub translation: Option<IVec3>,
    /// Remaining frame keys (`_f`, ...).
    pub attributes: Dict,
}

impl Frame {
    /// Frame that only translates.
    pub fn translated(t: IVec3) -> Self {
        Self {
            translation: Some(t),
            ..Self::default()
        }
    }

    /// Split a frame dictionary into typed rotation/translation plus the rest.
    pub fn from_dict(node_id: u32, mut dict: Dict) -> Result<Self> {
        let rotation = match dict.remove(Dict::ROTATION) {
            Some(raw) => Some(parse_rotation(node_id, &raw)?),
            None => None,
        };
        let translation = match dict.remove(Dict::TRANSLATION) {
            Some(raw) => Some(parse_translation(node_id, &raw)?),
            None => None,
        };
        Ok(Self { rotation, translation, attributes: dict })
    }

    /// Rebuild the frame dictionary.
    ///
    /// `_r` and `_t` always come from the typed fields; copies of those keys
    /// in `attributes` are dropped.
    pub fn to_dict(&self) -> Dict {
        let mut dict = Dict::new();
        if let Some(r) = self.rotation {
            dict.insert(Dict::ROTATION, r.to_byte().to_string());
        }
        if let Some(t) = self.translation {
            dict.insert(Dict::TRANSLATION, format!("{} {} {}", t.x, t.y, t.z));
        }
        for (k, v) in self.attributes.iter() {
            if k == Dict::ROTATION.as_bytes() || k == Dict::TRANSLATION.as_bytes() {
                continue;
            }
            dict.insert(k, v);
        }
        dict
    }

    /// Rotation, identity when absent.
    pub fn rotation_or_identity(&self) -> Rotation {
        self.rotation.unwrap_or(Rotation::IDENTITY)
    }

    /// Translation, zero when absent.
    pub fn translation_or_zero(&self) -> IVec3 {
        self.translation.unwrap_or(IVec3::ZERO)
    }
}

fn parse_rotation(node_id: u32, raw: &[u8]) -> Result<Rotation> {
    let byte = std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse::<u8>().ok())
        .ok_or_else(|| Error::InvalidFrameAttribute {
            node_id,
            key: Dict::ROTATION,
            value: String::from_utf8_lossy(raw).into_owned(),
        })?;
    Rotation::from_byte(byte).map_err(|_| Error::InvalidRotationByte {
        byte,
        node_id: Some(node_id),
    })
}

fn parse_translation(node_id: u32, raw: &[u8]) -> Result<IVec3> {
    let invalid = || Error::InvalidFrameAttribute {
        node_id,
        key: Dict::TRANSLATION,
        value: String::from_utf8_lossy(raw).into_owned(),
    };
    let text = std::str::from_utf8(raw).map_err(|_| invalid())?;
    let values = text
        .split_whitespace()
        .map(str::parse::<i32>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;
    match values.as_slice() {
        [x, y, z] => Ok(IVec3::new(*x, *y, *z)),
        _ => Err(invalid()),
    }
}

/// Transform node (nTRN).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TransformNode {
    pub id: u32,
    pub attributes: Dict,
    pub child_id: u32,
    pub layer_id: u32,
    pub frames: Vec<Frame>,
}

impl TransformNode {
    /// The frame used for static scenes.
    pub fn first_frame(&self) -> Option<&Frame> {
        self.frames.first()
    }
}

/// Group node (nGRP).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GroupNode {
    pub id: u32,
    pub attributes: Dict,
    pub children: Vec<u32>,
}

/// Validated shape node (nSHP) with its single model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShapeNode {
    pub id: u32,
    pub attributes: Dict,
    pub model_id: u32,
    pub model_attributes: Dict,
}

/// Model entry of a raw shape record.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeModel {
    pub model_id: u32,
    pub attributes: Dict,
}

/// Shape record as decoded, before the single-model check.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeRecord {
    pub id: u32,
    pub attributes: Dict,
    pub models: Vec<ShapeModel>,
}

/// Raw node record in file order.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeRecord {
    Transform(TransformNode),
    Group(GroupNode),
    Shape(ShapeRecord),
}

impl NodeRecord {
    /// Node id.
    pub fn id(&self) -> u32 {
        match self {
            Self::Transform(t) => t.id,
            Self::Group(g) => g.id,
            Self::Shape(s) => s.id,
        }
    }
}

/// Validated scene-graph node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SceneNode {
    Transform(TransformNode),
    Group(GroupNode),
    Shape(ShapeNode),
}

impl SceneNode {
    /// Node id.
    pub fn id(&self) -> u32 {
        match self {
            Self::Transform(t) => t.id,
            Self::Group(g) => g.id,
            Self::Shape(s) => s.id,
        }
    }

    /// Node attributes.
    pub fn attributes(&self) -> &Dict {
        match self {
            Self::Transform(t) => &t.attributes,
            Self::Group(g) => &g.attributes,
            Self::Shape(s) => &s.attributes,
        }
    }

    /// Node name (`_name`).
    pub fn name(&self) -> Option<&str> {
        self.attributes().name()
    }

    /// Ids of the nodes this node points at.
    pub fn child_ids(&self) -> &[u32] {
        match self {
            Self::Transform(t) => std::slice::from_ref(&t.child_id),
            Self::Group(g) => &g.children,
            Self::Shape(_) => &[],
        }
    }

    /// Short kind label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transform(_) => "transform",
            Self::Group(_) => "group",
            Self::Shape(_) => "shape",
        }
    }
}

impl From<SceneNode> for NodeRecord {
    fn from(node: SceneNode) -> Self {
        match node {
            SceneNode::Transform(t) => Self::Transform(t),
            SceneNode::Group(g) => Self::Group(g),
            SceneNode::Shape(s) => Self::Shape(ShapeRecord {
                id: s.id,
                attributes: s.attributes,
                models: vec![ShapeModel {
                    model_id: s.model_id,
                    attributes: s.model_attributes,
                }],
            }),
        }
    }
}
