//! # genprov-core
//!
//! The provenance flattening & attribution engine for genprov - THE LOGIC.
//!
//! Reconstructed physics objects reference the generator-level particles that
//! produced them through a layered association graph. This crate resolves
//! those references and answers three questions per object:
//!
//! - which generator particles it is built from (`flatten`)
//! - how its energy splits between the primary interaction and pileup
//!   (`attribute`)
//! - which single particle contributed the most transverse momentum
//!   (`select_leading`)
//!
//! All three share one traversal (`walker::walk`) and differ only in the
//! `Visitor` they plug into it.
//!
//! ## Architectural Constraints
//!
//! The core:
//! - Never mutates the association graph during traversal
//! - Keeps every accumulator local to one call
//! - Reports malformed input as data, never by panicking
//! - Has NO async, NO network dependencies and does no logging

// =============================================================================
// MODULES
// =============================================================================

pub mod attribution;
pub mod classify;
pub mod event;
pub mod flatten;
pub mod formats;
pub mod graph;
pub mod leading;
pub mod primitives;
pub mod storage;
pub mod types;
pub mod walker;
pub mod writer;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    FourMomentum, FourPosition, GenprovError, Node, NodeId, ObjectId, ObjectKind, OutputObject,
    Shape,
};

// =============================================================================
// RE-EXPORTS: Graph & Traversal
// =============================================================================

pub use attribution::{AttributionResult, EnergyFraction, attribute};
pub use classify::{Malformation, Violation, classify, validate};
pub use event::{Event, EventBuilder, SerializableEvent};
pub use flatten::{FlattenResult, flatten};
pub use graph::{AssociationGraph, GraphView};
pub use leading::{LeadingParticle, select_leading};
pub use walker::{Constituent, Skipped, Visitor, walk};

// =============================================================================
// RE-EXPORTS: Output
// =============================================================================

pub use formats::{EventHeader, event_from_bytes, event_from_bytes_strict, event_to_bytes};
pub use storage::RedbRecordStore;
pub use writer::{
    AnalysisRecord, EventReport, IssueKind, KinematicRecord, LeadingRecord, MemorySink,
    ObjectIssue, ObjectRecord, OuterRecord, RecordSink, RecordWriter, VertexRecord,
    WriterOptions,
};
