//! # Association Graph
//!
//! The read-only store the traversals walk.
//!
//! This module implements the `GraphView` accessor trait and the owning
//! `AssociationGraph` store. All data structures use `BTreeMap` for
//! deterministic ordering.
//!
//! ## Construction Contract
//!
//! Nodes are inserted bottom-up: every child must already be present when its
//! parent is inserted. This rules out cycles by construction, so the walker
//! needs no cycle detection. Each node's `Shape` is computed once, on
//! insertion, and cached; nodes violating the nesting contract are recorded as
//! `Malformation`s (or rejected when the graph is strict).

use crate::classify::{Malformation, classify, validate};
use crate::{GenprovError, Node, NodeId, Shape};
use std::collections::BTreeMap;

// =============================================================================
// GRAPHVIEW TRAIT
// =============================================================================

/// Read-only accessor over association-graph nodes.
///
/// Implementors own the nodes; callers only borrow them for the duration of
/// one traversal.
pub trait GraphView {
    /// Resolve a node by id.
    fn node(&self, id: NodeId) -> Option<&Node>;

    /// Shape of a node resolved through this view.
    ///
    /// Stores that classify on construction should return the cached shape.
    fn shape_of(&self, node: &Node) -> Shape {
        classify(node, self)
    }
}

// =============================================================================
// ASSOCIATION GRAPH
// =============================================================================

/// The owning store for association-graph nodes.
#[derive(Debug, Clone, Default)]
pub struct AssociationGraph {
    /// Node storage: NodeId -> Node
    nodes: BTreeMap<NodeId, Node>,

    /// Shape assigned at insertion: NodeId -> Shape
    shapes: BTreeMap<NodeId, Shape>,

    /// Insertion order (always bottom-up)
    order: Vec<NodeId>,

    /// Contract violations found at insertion
    malformations: BTreeMap<NodeId, Malformation>,

    /// Reject malformed nodes instead of recording them
    strict: bool,
}

impl AssociationGraph {
    /// Create a new empty graph that records malformed nodes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty graph that rejects malformed nodes.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Insert a node whose children are already present.
    ///
    /// Returns the shape assigned to the node.
    pub fn insert(&mut self, node: Node) -> Result<Shape, GenprovError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GenprovError::DuplicateNode(node.id));
        }
        if let Some(&child) = node.children.iter().find(|c| !self.nodes.contains_key(c)) {
            return Err(GenprovError::UnknownChild {
                parent: node.id,
                child,
            });
        }

        let shape = match validate(&node, self) {
            Ok(shape) => shape,
            Err(malformation) if self.strict => {
                return Err(GenprovError::MalformedHierarchy(malformation));
            }
            Err(malformation) => {
                let shape = malformation.shape;
                self.malformations.insert(node.id, malformation);
                shape
            }
        };

        self.shapes.insert(node.id, shape);
        self.order.push(node.id);
        self.nodes.insert(node.id, node);
        Ok(shape)
    }

    /// Get all nodes in insertion (bottom-up) order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Shape assigned to a node at insertion.
    #[must_use]
    pub fn shape(&self, id: NodeId) -> Option<Shape> {
        self.shapes.get(&id).copied()
    }

    /// Violation recorded for a node, if any.
    #[must_use]
    pub fn malformation(&self, id: NodeId) -> Option<&Malformation> {
        self.malformations.get(&id)
    }

    /// All recorded violations in NodeId order.
    pub fn malformations(&self) -> impl Iterator<Item = &Malformation> {
        self.malformations.values()
    }
}

impl GraphView for AssociationGraph {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn shape_of(&self, node: &Node) -> Shape {
        self.shape(node.id)
            .unwrap_or_else(|| classify(node, self))
    }
}

// =============================================================================
// TESTS
// =============================================================================
