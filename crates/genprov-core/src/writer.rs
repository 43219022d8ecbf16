//! # Record Writer
//!
//! Drives flattening, attribution and leading-particle selection over every
//! object of an event and emits one `ObjectRecord` per object to a
//! `RecordSink`.
//!
//! Every object gets its kinematics, outer-position fields, the production
//! vertex of its first constituent and the flattened particle list. Objects
//! whose kind is listed in `WriterOptions::analyzed_kinds` additionally get
//! the leading particle and the hard/pileup energy fractions.
//!
//! Problems with one object never stop the others. They are collected in the
//! returned `EventReport`; the writer itself does not log.

use crate::attribution::{EnergyFraction, attribute};
use crate::classify::Malformation;
use crate::event::Event;
use crate::flatten::flatten;
use crate::graph::{AssociationGraph, GraphView};
use crate::leading::{LeadingParticle, select_leading};
use crate::primitives::{BEAM_AXIS_ETA, C_LIGHT, CTG_THETA_LIMIT};
use crate::walker::Skipped;
use crate::{FourMomentum, FourPosition, GenprovError, NodeId, ObjectId, ObjectKind, OutputObject};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// RECORDS
// =============================================================================

/// Momentum-derived fields of an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicRecord {
    pub e: f64,
    pub p: f64,
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub mass: f64,
    /// `cot(theta)`, `CTG_THETA_LIMIT` when `tan(theta)` is zero.
    pub ctg_theta: f64,
}

impl From<&FourMomentum> for KinematicRecord {
    fn from(m: &FourMomentum) -> Self {
        let tan_theta = m.theta().tan();
        Self {
            e: m.e,
            p: m.p(),
            pt: m.pt(),
            eta: m.eta(),
            phi: m.phi(),
            mass: m.mass(),
            ctg_theta: if tan_theta == 0.0 {
                CTG_THETA_LIMIT
            } else {
                tan_theta.recip()
            },
        }
    }
}

/// Position of an object at the outer edge of the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OuterRecord {
    /// `±BEAM_AXIS_ETA` for positions on the beam axis.
    pub eta: f64,
    pub phi: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Seconds.
    pub t: f64,
}

impl From<&FourPosition> for OuterRecord {
    fn from(pos: &FourPosition) -> Self {
        let eta = if pos.cos_theta().abs() == 1.0 {
            if pos.z >= 0.0 { BEAM_AXIS_ETA } else { -BEAM_AXIS_ETA }
        } else {
            pos.eta()
        };
        Self {
            eta,
            phi: pos.phi(),
            x: pos.x,
            y: pos.y,
            z: pos.z,
            t: pos.t * 1.0e-3 / C_LIGHT,
        }
    }
}

/// Production vertex of an object's first constituent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Seconds.
    pub t: f64,
}

impl From<&FourPosition> for VertexRecord {
    fn from(pos: &FourPosition) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            t: pos.t * 1.0e-3 / C_LIGHT,
        }
    }
}

/// Kinematics of the leading contributing particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadingRecord {
    pub node: NodeId,
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub energy: f64,
}

impl From<&LeadingParticle> for LeadingRecord {
    fn from(leading: &LeadingParticle) -> Self {
        Self {
            node: leading.node,
            pt: leading.pt(),
            eta: leading.eta(),
            phi: leading.phi(),
            energy: leading.energy(),
        }
    }
}

/// Truth-matching results, filled for analysed kinds only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub leading: Option<LeadingRecord>,
    pub hard_fraction: EnergyFraction,
    pub pileup_fraction: EnergyFraction,
}

/// Everything written for one output object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub event_id: u64,
    pub object_id: ObjectId,
    pub kind: ObjectKind,
    pub pid: i32,
    pub charge: i32,
    pub kinematics: KinematicRecord,
    pub outer: OuterRecord,
    /// Absent when the object has no constituents or the first one is unknown.
    pub vertex: Option<VertexRecord>,
    /// Flattened generator particles, in traversal order.
    pub particles: Vec<NodeId>,
    pub analysis: Option<AnalysisRecord>,
}

// =============================================================================
// SINKS
// =============================================================================

/// Destination for object records.
pub trait RecordSink {
    fn write(&mut self, record: ObjectRecord) -> Result<(), GenprovError>;

    /// Make everything written so far durable. Called once per event.
    fn flush(&mut self) -> Result<(), GenprovError> {
        Ok(())
    }
}

/// Keeps records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Vec<ObjectRecord>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> &[ObjectRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<ObjectRecord> {
        self.records
    }
}

impl RecordSink for MemorySink {
    fn write(&mut self, record: ObjectRecord) -> Result<(), GenprovError> {
        self.records.push(record);
        Ok(())
    }
}

// =============================================================================
// REPORTING
// =============================================================================

/// Something worth reporting about one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IssueKind {
    /// A reference the walk could not follow.
    Skipped(Skipped),
    /// A direct constituent violates the hierarchy contract.
    Malformed(Malformation),
    /// The object resolved to zero total energy.
    UndefinedFraction,
    /// No particle qualified as leading.
    NoLeadingParticle,
    /// The sink refused the record.
    SinkFailed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectIssue {
    pub object: ObjectId,
    pub kind: IssueKind,
}

/// Outcome of writing one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventReport {
    pub event_id: u64,
    pub records_written: usize,
    pub issues: Vec<ObjectIssue>,
}

impl EventReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues_for(&self, object: ObjectId) -> impl Iterator<Item = &IssueKind> {
        self.issues
            .iter()
            .filter(move |i| i.object == object)
            .map(|i| &i.kind)
    }
}

// =============================================================================
// WRITER
// =============================================================================

/// Writer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Kinds that get leading-particle and fraction fields.
    pub analyzed_kinds: BTreeSet<ObjectKind>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            analyzed_kinds: BTreeSet::from([ObjectKind::ParticleFlowCandidate]),
        }
    }
}

impl WriterOptions {
    #[must_use]
    pub fn with_analyzed_kinds(mut self, kinds: impl IntoIterator<Item = ObjectKind>) -> Self {
        self.analyzed_kinds = kinds.into_iter().collect();
        self
    }

    #[must_use]
    pub fn is_analyzed(&self, kind: ObjectKind) -> bool {
        self.analyzed_kinds.contains(&kind)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordWriter {
    options: WriterOptions,
}

impl RecordWriter {
    #[must_use]
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Build the record for one object, with any issues found on the way.
    #[must_use]
    pub fn record_object(
        &self,
        event_id: u64,
        graph: &AssociationGraph,
        object: &OutputObject,
    ) -> (ObjectRecord, Vec<IssueKind>) {
        let mut issues: Vec<IssueKind> = object
            .constituents
            .iter()
            .filter_map(|&id| graph.malformation(id))
            .map(|m| IssueKind::Malformed(m.clone()))
            .collect();

        let flattened = flatten(graph, object);
        issues.extend(flattened.skipped.iter().copied().map(IssueKind::Skipped));

        let analysis = self.options.is_analyzed(object.kind).then(|| {
            let attribution = attribute(graph, object);
            let leading = select_leading(graph, object);
            if !attribution.primary_fraction().is_defined() {
                issues.push(IssueKind::UndefinedFraction);
            }
            if leading.is_none() {
                issues.push(IssueKind::NoLeadingParticle);
            }
            AnalysisRecord {
                leading: leading.as_ref().map(LeadingRecord::from),
                hard_fraction: attribution.primary_fraction(),
                pileup_fraction: attribution.secondary_fraction(),
            }
        });

        let record = ObjectRecord {
            event_id,
            object_id: object.id,
            kind: object.kind,
            pid: object.pid,
            charge: object.charge,
            kinematics: KinematicRecord::from(&object.momentum),
            outer: OuterRecord::from(&object.position),
            vertex: object
                .constituents
                .first()
                .and_then(|&id| graph.node(id))
                .map(|node| VertexRecord::from(&node.position)),
            particles: flattened.leaves,
            analysis,
        };
        (record, issues)
    }

    /// Write every object of `event` to `sink`, then flush it.
    ///
    /// Only a failed flush is returned as an error; per-object problems,
    /// including rejected writes, end up in the report.
    pub fn process_event<S: RecordSink + ?Sized>(
        &self,
        event: &Event,
        sink: &mut S,
    ) -> Result<EventReport, GenprovError> {
        let mut report = EventReport {
            event_id: event.id(),
            ..EventReport::default()
        };

        for object in event.objects() {
            let (record, issues) = self.record_object(event.id(), event.graph(), object);
            report.issues.extend(issues.into_iter().map(|kind| ObjectIssue {
                object: object.id,
                kind,
            }));
            match sink.write(record) {
                Ok(()) => report.records_written += 1,
                Err(e) => report.issues.push(ObjectIssue {
                    object: object.id,
                    kind: IssueKind::SinkFailed(e.to_string()),
                }),
            }
        }

        sink.flush()?;
        Ok(report)
    }
}

// =============================================================================
// TESTS
// =============================================================================
