//! # Core Type Definitions
//!
//! This module contains the data model of the genprov engine:
//! - Identifiers (`NodeId`, `ObjectId`)
//! - Kinematics (`FourMomentum`, `FourPosition`)
//! - Association graph elements (`Node`, `Shape`)
//! - Reconstructed objects (`OutputObject`, `ObjectKind`)
//! - Error types (`GenprovError`)
//!
//! ## Ownership
//!
//! A `Node` refers to its children by `NodeId` only. The store that owns the
//! nodes (`AssociationGraph`) resolves the ids; traversals borrow the store
//! and never hold references past the call.

mod kinematics;

pub use kinematics::{FourMomentum, FourPosition};

use crate::classify::Malformation;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a node in the association graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a reconstructed output object within an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// SHAPE
// =============================================================================

/// Structural role of a node in the association hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Shape {
    /// No children: a generator-level particle.
    Leaf,
    /// Exactly one child, itself a Leaf.
    TrackLike,
    /// One or more children, each TrackLike.
    TowerLike,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Leaf => "leaf",
            Self::TrackLike => "track-like",
            Self::TowerLike => "tower-like",
        };
        f.write_str(name)
    }
}

// =============================================================================
// NODE
// =============================================================================

/// An element of the association graph.
///
/// `pt` is the transverse momentum cached by the upstream simulation. It is
/// carried as-is and may differ numerically from `momentum.pt()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub momentum: FourMomentum,
    #[serde(default)]
    pub position: FourPosition,
    /// Particle-type code (PDG numbering).
    #[serde(default)]
    pub pid: i32,
    /// Originates from a secondary (pileup) interaction.
    #[serde(default)]
    pub is_pileup: bool,
    pub pt: f64,
    /// Ordered child references, resolved through the owning graph.
    #[serde(default)]
    pub children: Vec<NodeId>,
}

impl Node {
    /// Create a childless node whose cached `pt` matches its momentum.
    #[must_use]
    pub fn new(id: NodeId, momentum: FourMomentum) -> Self {
        Self {
            id,
            momentum,
            position: FourPosition::ORIGIN,
            pid: 0,
            is_pileup: false,
            pt: momentum.pt(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_pid(mut self, pid: i32) -> Self {
        self.pid = pid;
        self
    }

    #[must_use]
    pub fn with_pileup(mut self, is_pileup: bool) -> Self {
        self.is_pileup = is_pileup;
        self
    }

    /// Override the cached transverse momentum.
    #[must_use]
    pub fn with_cached_pt(mut self, pt: f64) -> Self {
        self.pt = pt;
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: FourPosition) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeId>) -> Self {
        self.children = children.into_iter().collect();
        self
    }

    /// True when the node has no children.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }

    #[must_use]
    pub fn first_child(&self) -> Option<NodeId> {
        self.children.first().copied()
    }
}

// =============================================================================
// OUTPUT OBJECTS
// =============================================================================

/// Kind of reconstructed object. Decides which record fields get filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    ParticleFlowCandidate,
    Track,
    Tower,
    Photon,
    Electron,
    Muon,
    Jet,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ParticleFlowCandidate => "particle_flow_candidate",
            Self::Track => "track",
            Self::Tower => "tower",
            Self::Photon => "photon",
            Self::Electron => "electron",
            Self::Muon => "muon",
            Self::Jet => "jet",
        };
        f.write_str(name)
    }
}

/// A reconstructed physics object and its direct constituents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub momentum: FourMomentum,
    /// Position at the outer edge of the tracking volume.
    #[serde(default)]
    pub position: FourPosition,
    #[serde(default)]
    pub pid: i32,
    #[serde(default)]
    pub charge: i32,
    /// Ordered direct constituents (Leaf, TrackLike or TowerLike nodes).
    #[serde(default)]
    pub constituents: Vec<NodeId>,
}

impl OutputObject {
    /// Create an object with no constituents.
    #[must_use]
    pub fn new(id: ObjectId, kind: ObjectKind, momentum: FourMomentum) -> Self {
        Self {
            id,
            kind,
            momentum,
            position: FourPosition::ORIGIN,
            pid: 0,
            charge: 0,
            constituents: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_constituents(mut self, constituents: impl IntoIterator<Item = NodeId>) -> Self {
        self.constituents = constituents.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: FourPosition) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_pid(mut self, pid: i32) -> Self {
        self.pid = pid;
        self
    }

    #[must_use]
    pub fn with_charge(mut self, charge: i32) -> Self {
        self.charge = charge;
        self
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in genprov.
///
/// The three traversal operations never return these: malformed hierarchies,
/// undefined fractions and empty selections are reported as data. Errors are
/// raised only while building graphs, decoding events and persisting records.
#[derive(Debug, Error)]
pub enum GenprovError {
    /// A node id was inserted twice.
    #[error("Duplicate node: {0}")]
    DuplicateNode(NodeId),

    /// A node references a child that has not been inserted yet.
    #[error("Node {parent} references unknown child {child}")]
    UnknownChild { parent: NodeId, child: NodeId },

    /// An object id was added twice to the same event.
    #[error("Duplicate object: {0}")]
    DuplicateObject(ObjectId),

    /// An object id that the event does not contain.
    #[error("Unknown object: {0}")]
    UnknownObject(ObjectId),

    /// An object references a constituent that is not in the graph.
    #[error("Object {object} references unknown constituent {constituent}")]
    UnknownConstituent { object: ObjectId, constituent: NodeId },

    /// A node violates the hierarchy contract (strict graphs only).
    #[error("Malformed hierarchy: {0}")]
    MalformedHierarchy(Malformation),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O or storage error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
