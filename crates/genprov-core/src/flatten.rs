//! # Flattening
//!
//! Reduces an object's constituents to the ordered list of generator-level
//! particles they resolve to.

use crate::graph::GraphView;
use crate::walker::{Constituent, Skipped, Visitor, walk};
use crate::{NodeId, OutputObject};
use serde::{Deserialize, Serialize};

/// Ordered leaves reachable from one object.
///
/// Order follows constituent order and, inside a tower, the tower's own child
/// order. Leaves reachable through several constituents appear once per path.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlattenResult {
    /// Leaf references in traversal order.
    pub leaves: Vec<NodeId>,
    /// References the walk could not follow.
    pub skipped: Vec<Skipped>,
}

impl FlattenResult {
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.leaves.iter().copied()
    }
}

impl<'g> Visitor<'g> for FlattenResult {
    fn visit(&mut self, constituent: Constituent<'g>) {
        self.leaves.push(constituent.leaf().id);
    }

    fn skip(&mut self, skipped: Skipped) {
        self.skipped.push(skipped);
    }
}

/// Flatten an object's constituents down to leaf references.
pub fn flatten<G: GraphView + ?Sized>(graph: &G, object: &OutputObject) -> FlattenResult {
    let mut result = FlattenResult::default();
    walk(graph, object, &mut result);
    result
}

// =============================================================================
// TESTS
// =============================================================================
