//! Two-phase scene graph construction.
//!
//! Node records are collected in file order while MAIN is walked. Groups and
//! transforms may point at nodes that appear later, so nothing is resolved
//! until the full record set is known.

use super::graph::SceneGraph;
use super::node::{NodeRecord, SceneNode, ShapeNode};
use crate::util::{Error, Result};

/// Collects raw node records and resolves them into a [`SceneGraph`].
#[derive(Debug, Default)]
pub struct SceneGraphBuilder {
    records: Vec<NodeRecord>,
}

impl SceneGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a record.
    pub fn push(&mut self, record: NodeRecord) {
        self.records.push(record);
    }

    /// Number of queued records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no records were queued.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve into a graph. Returns `None` when no records were queued.
    pub fn build(self, model_count: usize) -> Result<Option<SceneGraph>> {
        if self.records.is_empty() {
            return Ok(None);
        }
        build_scene_graph(self.records, model_count).map(Some)
    }
}

/// Resolve node records against `model_count` models.
///
/// Phase 1 fills the arena (duplicate ids, single-model shapes). Phase 2
/// checks references and cycles. The root is the first transform record,
/// or the first record when there is none.
pub fn build_scene_graph(records: Vec<NodeRecord>, model_count: usize) -> Result<SceneGraph> {
    let root = records
        .iter()
        .find(|r| matches!(r, NodeRecord::Transform(_)))
        .or_else(|| records.first())
        .map(NodeRecord::id)
        .unwrap_or(0);

    let mut nodes = Vec::with_capacity(records.len());
    for record in records {
        nodes.push(resolve_record(record)?);
    }

    let graph = SceneGraph::from_arena(nodes, root)?;
    graph.validate(model_count)?;

    tracing::debug!(nodes = graph.len(), root, "scene graph resolved");
    Ok(graph)
}

fn resolve_record(record: NodeRecord) -> Result<SceneNode> {
    Ok(match record {
        NodeRecord::Transform(t) => SceneNode::Transform(t),
        NodeRecord::Group(g) => SceneNode::Group(g),
        NodeRecord::Shape(mut s) => {
            if s.models.len() != 1 {
                return Err(Error::InvalidShapeModelCount {
                    node_id: s.id,
                    count: s.models.len(),
                });
            }
            let model = s.models.remove(0);
            SceneNode::Shape(ShapeNode {
                id: s.id,
                attributes: s.attributes,
                model_id: model.model_id,
                model_attributes: model.attributes,
            })
        }
    })
}
