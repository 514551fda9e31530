//! Scene graph: transform/group/shape nodes and their resolution.

mod builder;
mod graph;
mod node;

pub use builder::{build_scene_graph, SceneGraphBuilder};
pub use graph::{SceneGraph, ShapeInstance, WorldTransform};
pub use node::{
    Frame, GroupNode, NodeRecord, SceneNode, ShapeModel, ShapeNode, ShapeRecord, TransformNode,
    NO_LAYER,
};
