//! # Flattening Walker
//!
//! The single traversal shared by flattening, attribution and
//! leading-particle selection.
//!
//! `walk` visits an object's constituents in stored order and hands every
//! terminal particle to a `Visitor`, together with the path that led to it:
//!
//! - Leaf constituent: the leaf itself
//! - TrackLike constituent: the track and its single leaf
//! - TowerLike constituent: for each track-like child (in stored order), the
//!   tower, the track and the track's leaf, bracketed by
//!   `enter_tower`/`leave_tower`
//!
//! The walk is read-only and keeps no state between calls. References that
//! cannot be followed are reported through `Visitor::skip` and the walk moves
//! on, so a malformed hierarchy never aborts the traversal.

use crate::graph::GraphView;
use crate::{Node, NodeId, OutputObject, Shape};
use serde::{Deserialize, Serialize};

// =============================================================================
// VISITS
// =============================================================================

/// One emitted leaf and the constituent path that produced it.
#[derive(Debug, Clone, Copy)]
pub enum Constituent<'g> {
    /// The constituent is itself a leaf.
    Leaf { leaf: &'g Node },
    /// The constituent is track-like; `leaf` is its single child.
    Track { track: &'g Node, leaf: &'g Node },
    /// The constituent is tower-like; `track` is one of its children.
    Tower {
        tower: &'g Node,
        track: &'g Node,
        leaf: &'g Node,
    },
}

impl<'g> Constituent<'g> {
    /// The emitted terminal particle.
    #[must_use]
    pub fn leaf(&self) -> &'g Node {
        match *self {
            Self::Leaf { leaf } | Self::Track { leaf, .. } | Self::Tower { leaf, .. } => leaf,
        }
    }

    /// Shape of the direct constituent this visit belongs to.
    #[must_use]
    pub fn shape(&self) -> Shape {
        match self {
            Self::Leaf { .. } => Shape::Leaf,
            Self::Track { .. } => Shape::TrackLike,
            Self::Tower { .. } => Shape::TowerLike,
        }
    }
}

/// A reference the walker could not follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Skipped {
    /// A direct constituent id missing from the graph.
    MissingConstituent(NodeId),
    /// A child id missing from the graph.
    MissingChild { parent: NodeId, child: NodeId },
    /// A tower child with no child of its own to emit.
    EmptyTrack { tower: NodeId, track: NodeId },
}

// =============================================================================
// VISITOR TRAIT
// =============================================================================

/// Per-leaf action plugged into `walk`.
pub trait Visitor<'g> {
    /// Called once per emitted leaf, in traversal order.
    fn visit(&mut self, constituent: Constituent<'g>);

    /// Called before the first child of a tower-like constituent.
    fn enter_tower(&mut self, _tower: &'g Node) {}

    /// Called after the last child of a tower-like constituent.
    fn leave_tower(&mut self, _tower: &'g Node) {}

    /// Called for every reference the walk had to skip.
    fn skip(&mut self, _skipped: Skipped) {}
}

// =============================================================================
// WALK
// =============================================================================

/// Walk an object's constituents, emitting every reachable leaf to `visitor`.
pub fn walk<'g, G, V>(graph: &'g G, object: &OutputObject, visitor: &mut V)
where
    G: GraphView + ?Sized,
    V: Visitor<'g>,
{
    for &id in &object.constituents {
        let Some(node) = graph.node(id) else {
            visitor.skip(Skipped::MissingConstituent(id));
            continue;
        };

        match graph.shape_of(node) {
            Shape::Leaf => visitor.visit(Constituent::Leaf { leaf: node }),
            Shape::TrackLike => match first_child(graph, node) {
                Some(Ok(leaf)) => visitor.visit(Constituent::Track { track: node, leaf }),
                Some(Err(skipped)) => visitor.skip(skipped),
                None => {}
            },
            Shape::TowerLike => walk_tower(graph, node, visitor),
        }
    }
}

fn walk_tower<'g, G, V>(graph: &'g G, tower: &'g Node, visitor: &mut V)
where
    G: GraphView + ?Sized,
    V: Visitor<'g>,
{
    visitor.enter_tower(tower);
    for &child in &tower.children {
        let Some(track) = graph.node(child) else {
            visitor.skip(Skipped::MissingChild {
                parent: tower.id,
                child,
            });
            continue;
        };
        match first_child(graph, track) {
            Some(Ok(leaf)) => visitor.visit(Constituent::Tower { tower, track, leaf }),
            Some(Err(skipped)) => visitor.skip(skipped),
            None => visitor.skip(Skipped::EmptyTrack {
                tower: tower.id,
                track: track.id,
            }),
        }
    }
    visitor.leave_tower(tower);
}

/// Resolve the first child of `parent`; `None` when it has no children.
fn first_child<'g, G>(graph: &'g G, parent: &Node) -> Option<Result<&'g Node, Skipped>>
where
    G: GraphView + ?Sized,
{
    let child = parent.first_child()?;
    Some(graph.node(child).ok_or(Skipped::MissingChild {
        parent: parent.id,
        child,
    }))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssociationGraph, FourMomentum, ObjectId, ObjectKind};

    /// Records the traversal as a flat event log.
    #[derive(Default)]
    struct Trace {
        events: Vec<String>,
    }

    impl<'g> Visitor<'g> for Trace {
        fn visit(&mut self, constituent: Constituent<'g>) {
            self.events
                .push(format!("{}:{}", constituent.shape(), constituent.leaf().id));
        }

        fn enter_tower(&mut self, tower: &'g Node) {
            self.events.push(format!("enter:{}", tower.id));
        }

        fn leave_tower(&mut self, tower: &'g Node) {
            self.events.push(format!("leave:{}", tower.id));
        }

        fn skip(&mut self, skipped: Skipped) {
            self.events.push(format!("skip:{:?}", skipped));
        }
    }

    fn node(id: u64, children: &[u64]) -> Node {
        Node::new(NodeId(id), FourMomentum::new(1.0, 1.0, 0.0, 2.0))
            .with_children(children.iter().map(|&c| NodeId(c)))
    }

    fn object(constituents: &[u64]) -> OutputObject {
        OutputObject::new(ObjectId(1), ObjectKind::Jet, FourMomentum::ZERO)
            .with_constituents(constituents.iter().map(|&c| NodeId(c)))
    }

    fn trace(graph: &AssociationGraph, object: &OutputObject) -> Vec<String> {
        let mut trace = Trace::default();
        walk(graph, object, &mut trace);
        trace.events
    }

    #[test]
    fn visits_each_shape_with_brackets_around_towers() {
        let mut graph = AssociationGraph::new();
        for n in [
            node(1, &[]),
            node(2, &[]),
            node(3, &[2]),
            node(4, &[]),
            node(5, &[4]),
            node(6, &[]),
            node(7, &[6]),
            node(8, &[5, 7]),
        ] {
            graph.insert(n).expect("insert");
        }

        let events = trace(&graph, &object(&[1, 3, 8]));
        assert_eq!(
            events,
            vec![
                "leaf:1",
                "track-like:2",
                "enter:8",
                "tower-like:4",
                "tower-like:6",
                "leave:8",
            ]
        );
    }

    #[test]
    fn missing_constituent_is_skipped() {
        let mut graph = AssociationGraph::new();
        graph.insert(node(1, &[])).expect("insert");

        let events = trace(&graph, &object(&[99, 1]));
        assert_eq!(events, vec!["skip:MissingConstituent(NodeId(99))", "leaf:1"]);
    }

    #[test]
    fn bare_leaf_inside_tower_is_skipped() {
        let mut graph = AssociationGraph::new();
        for n in [node(1, &[]), node(2, &[1]), node(3, &[]), node(4, &[2, 3])] {
            graph.insert(n).expect("lenient insert");
        }

        let events = trace(&graph, &object(&[4]));
        assert_eq!(
            events,
            vec![
                "enter:4",
                "tower-like:1",
                "skip:EmptyTrack { tower: NodeId(4), track: NodeId(3) }",
                "leave:4",
            ]
        );
    }

    #[test]
    fn empty_object_visits_nothing() {
        let graph = AssociationGraph::new();
        assert!(trace(&graph, &object(&[])).is_empty());
    }
}
