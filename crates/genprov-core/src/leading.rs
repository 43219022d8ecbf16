//! # Leading-Particle Selector
//!
//! Picks the highest-`pt` generator particle contributing to an object.
//!
//! The running best starts at `SENTINEL_SCORE`. Leaf and track-like
//! constituents compete against it with the particle's cached `pt`. A
//! tower-like constituent opens its own scope: the score drops to
//! `TOWER_SCOPE_SCORE` while the current candidate is kept, and the tower's
//! leaves compete with their momentum-derived `pt`. A tower therefore
//! overrides any higher score seen before it whenever one of its leaves has
//! positive `pt`, and constituents after the tower compete against the
//! tower's winner only.

use crate::graph::GraphView;
use crate::primitives::{SENTINEL_SCORE, TOWER_SCOPE_SCORE};
use crate::walker::{Constituent, Visitor, walk};
use crate::{FourMomentum, Node, NodeId, OutputObject};
use serde::{Deserialize, Serialize};

/// The selected particle and the score it won with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadingParticle {
    pub node: NodeId,
    pub momentum: FourMomentum,
    /// Cached or momentum-derived `pt`, depending on the winning path.
    pub score: f64,
}

impl LeadingParticle {
    #[must_use]
    pub fn pt(&self) -> f64 {
        self.momentum.pt()
    }

    #[must_use]
    pub fn eta(&self) -> f64 {
        self.momentum.eta()
    }

    #[must_use]
    pub fn phi(&self) -> f64 {
        self.momentum.phi()
    }

    #[must_use]
    pub fn energy(&self) -> f64 {
        self.momentum.e
    }
}

struct Selector<'g> {
    best: Option<&'g Node>,
    score: f64,
}

impl<'g> Selector<'g> {
    fn offer(&mut self, leaf: &'g Node, score: f64) {
        if score > self.score {
            self.best = Some(leaf);
            self.score = score;
        }
    }
}

impl<'g> Visitor<'g> for Selector<'g> {
    fn visit(&mut self, constituent: Constituent<'g>) {
        match constituent {
            Constituent::Leaf { leaf } | Constituent::Track { leaf, .. } => self.offer(leaf, leaf.pt),
            Constituent::Tower { leaf, .. } => self.offer(leaf, leaf.momentum.pt()),
        }
    }

    fn enter_tower(&mut self, _tower: &'g Node) {
        self.score = TOWER_SCOPE_SCORE;
    }
}

/// Select the leading contributing particle, or `None` when nothing won.
pub fn select_leading<G: GraphView + ?Sized>(
    graph: &G,
    object: &OutputObject,
) -> Option<LeadingParticle> {
    let mut selector = Selector {
        best: None,
        score: SENTINEL_SCORE,
    };
    walk(graph, object, &mut selector);
    let score = selector.score;
    selector.best.map(|leaf| LeadingParticle {
        node: leaf.id,
        momentum: leaf.momentum,
        score,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssociationGraph, ObjectId, ObjectKind};

    fn particle(id: u64, pt: f64) -> Node {
        Node::new(NodeId(id), FourMomentum::new(pt, 0.0, 0.0, pt))
    }

    fn object(constituents: &[u64]) -> OutputObject {
        OutputObject::new(ObjectId(3), ObjectKind::ParticleFlowCandidate, FourMomentum::ZERO)
            .with_constituents(constituents.iter().map(|&c| NodeId(c)))
    }

    fn graph_with(nodes: Vec<Node>) -> AssociationGraph {
        let mut graph = AssociationGraph::new();
        for node in nodes {
            graph.insert(node).expect("insert");
        }
        graph
    }

    #[test]
    fn highest_leaf_wins() {
        let graph = graph_with(vec![particle(1, 3.0), particle(2, 7.0), particle(3, 1.0)]);

        let leading = select_leading(&graph, &object(&[1, 2, 3])).expect("leading");
        assert_eq!(leading.node, NodeId(2));
        assert_eq!(leading.pt(), 7.0);
        assert_eq!(leading.energy(), 7.0);
    }

    #[test]
    fn ties_keep_the_first_candidate() {
        let graph = graph_with(vec![particle(1, 5.0), particle(2, 5.0)]);

        let leading = select_leading(&graph, &object(&[1, 2])).expect("leading");
        assert_eq!(leading.node, NodeId(1));
    }

    #[test]
    fn track_competes_with_cached_pt() {
        let graph = graph_with(vec![
            particle(1, 4.0),
            particle(2, 6.0).with_cached_pt(3.0),
            particle(3, 1.0).with_children([NodeId(2)]),
        ]);

        // leaf 2 has the larger momentum but the smaller cached pt
        let leading = select_leading(&graph, &object(&[1, 3])).expect("leading");
        assert_eq!(leading.node, NodeId(1));
        assert_eq!(leading.score, 4.0);
    }

    #[test]
    fn tower_scope_overrides_earlier_winner() {
        let graph = graph_with(vec![
            particle(1, 9.0),
            particle(2, 2.0),
            particle(3, 2.0).with_children([NodeId(2)]),
            particle(4, 2.0).with_children([NodeId(3)]),
        ]);

        let leading = select_leading(&graph, &object(&[1, 4])).expect("leading");
        assert_eq!(leading.node, NodeId(2));
        assert_eq!(leading.pt(), 2.0);
    }

    #[test]
    fn tower_leaves_compete_with_momentum_pt() {
        let graph = graph_with(vec![
            particle(1, 5.0).with_cached_pt(50.0),
            particle(2, 6.0).with_cached_pt(1.0),
            particle(11, 0.0).with_children([NodeId(1)]),
            particle(12, 0.0).with_children([NodeId(2)]),
            particle(20, 0.0).with_children([NodeId(11), NodeId(12)]),
        ]);

        let leading = select_leading(&graph, &object(&[20])).expect("leading");
        assert_eq!(leading.node, NodeId(2));
        assert_eq!(leading.score, 6.0);
    }

    #[test]
    fn zero_pt_tower_keeps_candidate_but_lowers_the_bar() {
        let graph = graph_with(vec![
            particle(1, 9.0),
            particle(2, 0.0),
            particle(3, 0.0).with_children([NodeId(2)]),
            particle(4, 0.0).with_children([NodeId(3)]),
            particle(5, 1.0),
        ]);

        let after_tower = select_leading(&graph, &object(&[1, 4])).expect("leading");
        assert_eq!(after_tower.node, NodeId(1));
        assert_eq!(after_tower.score, 0.0);

        let later_leaf = select_leading(&graph, &object(&[1, 4, 5])).expect("leading");
        assert_eq!(later_leaf.node, NodeId(5));
    }

    #[test]
    fn no_constituents_means_no_leading_particle() {
        let graph = AssociationGraph::new();
        assert_eq!(select_leading(&graph, &object(&[])), None);
    }

    #[test]
    fn unresolved_constituents_are_not_candidates() {
        let graph = graph_with(vec![particle(1, 2.0)]);

        let leading = select_leading(&graph, &object(&[8, 1, 9])).expect("leading");
        assert_eq!(leading.node, NodeId(1));
    }
}
