//! # Hierarchy Classifier
//!
//! Assigns each association-graph node one of three shapes from its child
//! structure:
//!
//! ```text
//!   Leaf        TrackLike       TowerLike
//!    (p)          (t)             (w)
//!                  |            /  |  \
//!                 (p)         (t) (t) (t)
//!                              |   |   |
//!                             (p) (p) (p)
//! ```
//!
//! `classify` looks only at the node's child count and its first child's
//! child count, so it is O(1) and never fails. `validate` performs the full
//! nesting check; the graph runs it once per node at insertion time.

use crate::graph::GraphView;
use crate::{Node, NodeId, Shape};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classify a node by the most specific pattern it satisfies.
///
/// - no children: `Leaf`
/// - first child has no children: `TrackLike`
/// - otherwise: `TowerLike`
///
/// A first child that cannot be resolved is treated as a leaf.
pub fn classify<G: GraphView + ?Sized>(node: &Node, graph: &G) -> Shape {
    let Some(first) = node.first_child() else {
        return Shape::Leaf;
    };
    match graph.node(first) {
        Some(child) if !child.is_terminal() => Shape::TowerLike,
        _ => Shape::TrackLike,
    }
}

/// Classify a node and check that it honours the nesting contract.
///
/// On violation the returned `Malformation` still carries the shape
/// `classify` assigned, which is the shape traversals will use.
pub fn validate<G: GraphView + ?Sized>(node: &Node, graph: &G) -> Result<Shape, Malformation> {
    let shape = classify(node, graph);
    let violation = match shape {
        Shape::Leaf => None,
        Shape::TrackLike => check_track(node, graph),
        Shape::TowerLike => node.children.iter().find_map(|&child| match graph.node(child) {
            None => Some(Violation::DanglingChild { child }),
            Some(track) if track.is_terminal() => Some(Violation::LeafInTower { child }),
            Some(track) => check_track(track, graph).map(|inner| Violation::TowerChild {
                child,
                inner: Box::new(inner),
            }),
        }),
    };
    match violation {
        None => Ok(shape),
        Some(violation) => Err(Malformation {
            node: node.id,
            shape,
            violation,
        }),
    }
}

/// Check a node that must be TrackLike: exactly one resolvable, childless child.
fn check_track<G: GraphView + ?Sized>(track: &Node, graph: &G) -> Option<Violation> {
    if track.children.len() != 1 {
        return Some(Violation::TrackFanOut {
            children: track.children.len(),
        });
    }
    let child = track.children[0];
    match graph.node(child) {
        None => Some(Violation::DanglingChild { child }),
        Some(leaf) if !leaf.is_terminal() => Some(Violation::NestedTooDeep { child }),
        Some(_) => None,
    }
}

// =============================================================================
// MALFORMATIONS
// =============================================================================

/// Why a node does not match its assigned shape.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Violation {
    /// A track-like node with zero or several children.
    #[error("track-like node has {children} children, expected 1")]
    TrackFanOut { children: usize },

    /// The terminal of a track-like node has children of its own.
    #[error("terminal {child} has children of its own")]
    NestedTooDeep { child: NodeId },

    /// A tower child that is a bare leaf instead of a track-like node.
    #[error("tower child {child} is a leaf, not track-like")]
    LeafInTower { child: NodeId },

    /// A tower child that is not a well-formed track-like node.
    #[error("tower child {child}: {inner}")]
    TowerChild { child: NodeId, inner: Box<Violation> },

    /// A child reference that the graph cannot resolve.
    #[error("child {child} is not in the graph")]
    DanglingChild { child: NodeId },
}

/// A node outside the Leaf/TrackLike/TowerLike contract.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("node {node} classified {shape}, but {violation}")]
pub struct Malformation {
    pub node: NodeId,
    pub shape: Shape,
    pub violation: Violation,
}

// =============================================================================
// TESTS
// =============================================================================
