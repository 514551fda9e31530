//! Resolved scene graph.

use std::collections::HashMap;

use super::node::{Frame, GroupNode, SceneNode, ShapeNode, TransformNode, NO_LAYER};
use crate::core::{Dict, Rotation};
use crate::util::{Error, IVec3, Result};

/// Accumulated rotation and translation of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WorldTransform {
    pub rotation: Rotation,
    pub translation: IVec3,
}

impl WorldTransform {
    pub const IDENTITY: Self = Self {
        rotation: Rotation::IDENTITY,
        translation: IVec3::ZERO,
    };

    /// Local transform of a frame.
    pub fn from_frame(frame: &Frame) -> Self {
        Self {
            rotation: frame.rotation_or_identity(),
            translation: frame.translation_or_zero(),
        }
    }

    /// Apply `child` inside this transform's space. `None` on i32 overflow.
    pub fn then(&self, child: &WorldTransform) -> Option<WorldTransform> {
        Some(WorldTransform {
            rotation: self.rotation * child.rotation,
            translation: self.apply(child.translation)?,
        })
    }

    /// Transform a point. `None` on i32 overflow.
    pub fn apply(&self, p: IVec3) -> Option<IVec3> {
        let r = self.rotation.checked_transform(p)?;
        let t = self.translation;
        Some(IVec3::new(
            r.x.checked_add(t.x)?,
            r.y.checked_add(t.y)?,
            r.z.checked_add(t.z)?,
        ))
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A shape reached from the root, with everything above it folded in.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShapeInstance {
    pub node_id: u32,
    pub model_id: u32,
    /// Layer of the nearest enclosing transform, if any.
    pub layer_id: Option<u32>,
    /// Set when the shape or any ancestor has `_hidden = 1`.
    pub hidden: bool,
    pub transform: WorldTransform,
}

/// Node arena keyed by id plus the designated root.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    index: HashMap<u32, usize>,
    root: u32,
}

impl SceneGraph {
    /// Assemble an arena. Fails on duplicate ids; references are not checked.
    pub(crate) fn from_arena(nodes: Vec<SceneNode>, root: u32) -> Result<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id(), i).is_some() {
                return Err(Error::DuplicateNodeId { node_id: node.id() });
            }
        }
        Ok(Self { nodes, index, root })
    }

    /// Canonical layout for `model_count` models: root transform 0 -> group 1
    /// -> one transform/shape pair per model on layer 0.
    pub fn for_models(model_count: usize) -> Self {
        let mut nodes = Vec::with_capacity(2 + model_count * 2);
        let children = (0..model_count as u32).map(|i| 2 + i * 2).collect();
        nodes.push(SceneNode::Transform(TransformNode {
            id: 0,
            attributes: Dict::new(),
            child_id: 1,
            layer_id: NO_LAYER,
            frames: vec![Frame::default()],
        }));
        nodes.push(SceneNode::Group(GroupNode {
            id: 1,
            attributes: Dict::new(),
            children,
        }));
        for i in 0..model_count as u32 {
            nodes.push(SceneNode::Transform(TransformNode {
                id: 2 + i * 2,
                attributes: Dict::new(),
                child_id: 3 + i * 2,
                layer_id: 0,
                frames: vec![Frame::default()],
            }));
            nodes.push(SceneNode::Shape(ShapeNode {
                id: 3 + i * 2,
                attributes: Dict::new(),
                model_id: i,
                model_attributes: Dict::new(),
            }));
        }

        let index = nodes.iter().enumerate().map(|(i, n)| (n.id(), i)).collect();
        Self { nodes, index, root: 0 }
    }

    /// Root node id.
    #[inline]
    pub fn root(&self) -> u32 {
        self.root
    }

    /// Root node.
    pub fn root_node(&self) -> Option<&SceneNode> {
        self.get(self.root)
    }

    /// Look up a node by id.
    pub fn get(&self, id: u32) -> Option<&SceneNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Check if a node id exists.
    pub fn contains(&self, id: u32) -> bool {
        self.index.contains_key(&id)
    }

    /// All nodes in file order.
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check references against `model_count` models, then require a forest:
    /// every node has at most one parent and there are no cycles.
    pub fn validate(&self, model_count: usize) -> Result<()> {
        let mut parents: HashMap<u32, u32> = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if let SceneNode::Shape(shape) = node {
                if shape.model_id as usize >= model_count {
                    return Err(Error::InvalidModelReference {
                        node_id: shape.id,
                        model_id: shape.model_id,
                        model_count,
                    });
                }
            }
            for &child_id in node.child_ids() {
                if !self.contains(child_id) {
                    return Err(Error::DanglingNodeReference {
                        node_id: node.id(),
                        child_id,
                    });
                }
                if let Some(&first_parent) = parents.get(&child_id) {
                    return Err(Error::SharedSceneNode {
                        node_id: child_id,
                        first_parent,
                        second_parent: node.id(),
                    });
                }
                parents.insert(child_id, node.id());
            }
        }
        self.check_acyclic()
    }

    /// Depth-first colouring, root first, then any node not yet reached.
    fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            OnStack,
            Done,
        }

        let mut marks = vec![Mark::New; self.nodes.len()];
        let starts = self
            .index
            .get(&self.root)
            .copied()
            .into_iter()
            .chain(0..self.nodes.len());

        for start in starts {
            if marks[start] != Mark::New {
                continue;
            }
            marks[start] = Mark::OnStack;
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

            while let Some(&(idx, next)) = stack.last() {
                let children = self.nodes[idx].child_ids();
                let Some(&child_id) = children.get(next) else {
                    marks[idx] = Mark::Done;
                    stack.pop();
                    continue;
                };
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }

                let child = *self.index.get(&child_id).ok_or(Error::DanglingNodeReference {
                    node_id: self.nodes[idx].id(),
                    child_id,
                })?;
                match marks[child] {
                    Mark::OnStack => return Err(Error::CyclicSceneGraph { node_id: child_id }),
                    Mark::New => {
                        marks[child] = Mark::OnStack;
                        stack.push((child, 0));
                    }
                    Mark::Done => {}
                }
            }
        }
        Ok(())
    }

    /// Pre-order walk from the root with depths.
    pub fn walk(&self) -> Vec<(usize, &SceneNode)> {
        let mut out = Vec::new();
        let mut stack: Vec<(usize, u32)> = vec![(0, self.root)];
        while let Some((depth, id)) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            out.push((depth, node));
            for &child in node.child_ids().iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    /// Flatten the graph from the root into positioned shape instances,
    /// composing each transform's first frame.
    ///
    /// Fails with [`Error::TransformOverflow`] when an accumulated
    /// translation leaves the i32 range.
    pub fn instances(&self) -> Result<Vec<ShapeInstance>> {
        struct Visit {
            id: u32,
            transform: WorldTransform,
            layer_id: Option<u32>,
            hidden: bool,
        }

        let mut out = Vec::new();
        let mut stack = vec![Visit {
            id: self.root,
            transform: WorldTransform::IDENTITY,
            layer_id: None,
            hidden: false,
        }];

        while let Some(visit) = stack.pop() {
            let Some(node) = self.get(visit.id) else { continue };
            let hidden = visit.hidden || node.attributes().is_hidden();
            match node {
                SceneNode::Transform(t) => {
                    let local = t
                        .first_frame()
                        .map(WorldTransform::from_frame)
                        .unwrap_or_default();
                    let layer_id = if t.layer_id == NO_LAYER {
                        visit.layer_id
                    } else {
                        Some(t.layer_id)
                    };
                    let transform = visit
                        .transform
                        .then(&local)
                        .ok_or(Error::TransformOverflow { node_id: t.id })?;
                    stack.push(Visit {
                        id: t.child_id,
                        transform,
                        layer_id,
                        hidden,
                    });
                }
                SceneNode::Group(g) => {
                    for &child in g.children.iter().rev() {
                        stack.push(Visit {
                            id: child,
                            transform: visit.transform,
                            layer_id: visit.layer_id,
                            hidden,
                        });
                    }
                }
                SceneNode::Shape(s) => out.push(ShapeInstance {
                    node_id: s.id,
                    model_id: s.model_id,
                    layer_id: visit.layer_id,
                    hidden,
                    transform: visit.transform,
                }),
            }
        }
        Ok(out)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for SceneGraph {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("SceneGraph", 2)?;
        s.serialize_field("root", &self.root)?;
        s.serialize_field("nodes", &self.nodes)?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decode_rotation;

    fn transform(id: u32, child_id: u32, frame: Frame) -> SceneNode {
        SceneNode::Transform(TransformNode {
            id,
            attributes: Dict::new(),
            child_id,
            layer_id: NO_LAYER,
            frames: vec![frame],
        })
    }

    fn shape(id: u32, model_id: u32) -> SceneNode {
        SceneNode::Shape(ShapeNode {
            id,
            attributes: Dict::new(),
            model_id,
            model_attributes: Dict::new(),
        })
    }

    #[test]
    fn test_for_models_layout() {
        let graph = SceneGraph::for_models(3);
        assert_eq!(graph.len(), 8);
        graph.validate(3).unwrap();
        assert!(matches!(
            graph.validate(2),
            Err(Error::InvalidModelReference { model_id: 2, .. })
        ));
        let instances = graph.instances().unwrap();
        let models: Vec<u32> = instances.iter().map(|i| i.model_id).collect();
        assert_eq!(models, vec![0, 1, 2]);
        assert!(instances.iter().all(|i| i.layer_id == Some(0)));
    }

    #[test]
    fn test_instances_compose_transforms() {
        let outer = Frame {
            rotation: Some(decode_rotation(0x69).unwrap()),
            translation: Some(IVec3::new(10, 0, 0)),
            attributes: Dict::new(),
        };
        let inner = Frame::translated(IVec3::new(1, 2, 3));
        let nodes = vec![
            transform(0, 1, outer),
            SceneNode::Group(GroupNode { id: 1, attributes: Dict::new(), children: vec![2] }),
            transform(2, 3, inner),
            shape(3, 0),
        ];
        let graph = SceneGraph::from_arena(nodes, 0).unwrap();
        graph.validate(1).unwrap();

        let instances = graph.instances().unwrap();
        assert_eq!(instances.len(), 1);
        let t = instances[0].transform;
        // Outer rotation maps (1, 2, 3) to (2, -3, -1), then shifts by (10, 0, 0).
        assert_eq!(t.translation, IVec3::new(12, -3, -1));
        assert_eq!(t.rotation.to_byte(), 0x69);
        assert_eq!(t.apply(IVec3::ZERO), Some(t.translation));
    }

    #[test]
    fn test_hidden_propagates() {
        let mut hidden_group = GroupNode { id: 1, attributes: Dict::new(), children: vec![2] };
        hidden_group.attributes.set_bool(Dict::HIDDEN, true);
        let nodes = vec![
            transform(0, 1, Frame::default()),
            SceneNode::Group(hidden_group),
            transform(2, 3, Frame::default()),
            shape(3, 0),
        ];
        let graph = SceneGraph::from_arena(nodes, 0).unwrap();
        assert!(graph.instances().unwrap()[0].hidden);
    }

    #[test]
    fn test_cycle_outside_root_detected() {
        let nodes = vec![
            transform(0, 1, Frame::default()),
            shape(1, 0),
            SceneNode::Group(GroupNode { id: 5, attributes: Dict::new(), children: vec![6] }),
            transform(6, 5, Frame::default()),
        ];
        let graph = SceneGraph::from_arena(nodes, 0).unwrap();
        assert!(matches!(graph.validate(1), Err(Error::CyclicSceneGraph { .. })));
    }

    #[test]
    fn test_walk_depths() {
        let nodes = vec![
            transform(0, 1, Frame::default()),
            SceneNode::Group(GroupNode { id: 1, attributes: Dict::new(), children: vec![2, 4] }),
            transform(2, 3, Frame::default()),
            shape(3, 0),
            transform(4, 5, Frame::default()),
            shape(5, 0),
        ];
        let graph = SceneGraph::from_arena(nodes, 0).unwrap();
        graph.validate(1).unwrap();
        let walked: Vec<(usize, u32)> = graph.walk().iter().map(|(d, n)| (*d, n.id())).collect();
        assert_eq!(walked, vec![(0, 0), (1, 1), (2, 2), (3, 3), (2, 4), (3, 5)]);
    }

    #[test]
    fn test_child_listed_twice_rejected() {
        let nodes = vec![
            transform(0, 1, Frame::default()),
            SceneNode::Group(GroupNode { id: 1, attributes: Dict::new(), children: vec![2, 2] }),
            transform(2, 3, Frame::default()),
            shape(3, 0),
        ];
        let graph = SceneGraph::from_arena(nodes, 0).unwrap();
        assert!(matches!(
            graph.validate(1),
            Err(Error::SharedSceneNode { node_id: 2, first_parent: 1, second_parent: 1 })
        ));
    }

    #[test]
    fn test_doubling_group_chain_rejected() {
        // Each group lists the next one twice; expanding every path would
        // produce 2^22 instances.
        let depth = 22u32;
        let mut nodes = vec![transform(0, 1, Frame::default())];
        for id in 1..=depth {
            nodes.push(SceneNode::Group(GroupNode {
                id,
                attributes: Dict::new(),
                children: vec![id + 1, id + 1],
            }));
        }
        nodes.push(shape(depth + 1, 0));
        let graph = SceneGraph::from_arena(nodes, 0).unwrap();
        assert!(matches!(
            graph.validate(1),
            Err(Error::SharedSceneNode { node_id: 2, .. })
        ));
    }

    #[test]
    fn test_node_with_two_parents_rejected() {
        let nodes = vec![
            transform(0, 1, Frame::default()),
            SceneNode::Group(GroupNode { id: 1, attributes: Dict::new(), children: vec![2, 4] }),
            transform(2, 3, Frame::default()),
            transform(4, 3, Frame::default()),
            shape(3, 0),
        ];
        let graph = SceneGraph::from_arena(nodes, 0).unwrap();
        assert!(matches!(
            graph.validate(1),
            Err(Error::SharedSceneNode { node_id: 3, first_parent: 2, second_parent: 4 })
        ));
    }

    #[test]
    fn test_translation_overflow_is_an_error() {
        let nodes = vec![
            transform(0, 1, Frame::translated(IVec3::new(1, 0, 0))),
            transform(1, 2, Frame::translated(IVec3::new(i32::MAX, 0, 0))),
            shape(2, 0),
        ];
        let graph = SceneGraph::from_arena(nodes, 0).unwrap();
        graph.validate(1).unwrap();
        assert!(matches!(
            graph.instances(),
            Err(Error::TransformOverflow { node_id: 1 })
        ));

        let big = WorldTransform {
            rotation: Rotation::IDENTITY,
            translation: IVec3::new(0, i32::MIN, 0),
        };
        assert_eq!(big.apply(IVec3::new(0, -1, 0)), None);
        let flip = WorldTransform {
            rotation: decode_rotation(0x24).unwrap(),
            translation: IVec3::ZERO,
        };
        assert_eq!(flip.then(&big), None);
    }

    #[test]
    fn test_duplicate_ids() {
        let nodes = vec![shape(4, 0), shape(4, 0)];
        assert!(matches!(
            SceneGraph::from_arena(nodes, 4),
            Err(Error::DuplicateNodeId { node_id: 4 })
        ));
    }
}
