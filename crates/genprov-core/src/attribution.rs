//! # Attribution Aggregator
//!
//! Splits an object's energy into primary-interaction and pileup
//! contributions.
//!
//! Every leaf emitted by the walk is filed under a classification key:
//!
//! | constituent | key taken from        | momentum taken from |
//! |-------------|-----------------------|---------------------|
//! | Leaf        | the leaf              | the leaf            |
//! | TrackLike   | the terminal leaf     | the terminal leaf   |
//! | TowerLike   | the intermediate track| the terminal leaf   |
//!
//! Within each class a momentum is summed once: it is skipped when a momentum
//! with identical `(pt, eta, phi, E)` was already accumulated in that class.
//! The comparison is exact; values that differ only by rounding both count.

use crate::graph::GraphView;
use crate::walker::{Constituent, Visitor, walk};
use crate::{FourMomentum, OutputObject};
use serde::{Deserialize, Serialize};

// =============================================================================
// ENERGY FRACTION
// =============================================================================

/// Share of an object's energy, or an explicit marker when the total is zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnergyFraction {
    Defined(f64),
    /// The summed energy of both classes is zero.
    Undefined,
}

impl EnergyFraction {
    /// `part / total`, or `Undefined` when `total` is zero.
    #[must_use]
    pub fn of(part: f64, total: f64) -> Self {
        if total == 0.0 {
            Self::Undefined
        } else {
            Self::Defined(part / total)
        }
    }

    #[must_use]
    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Defined(_))
    }

    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match *self {
            Self::Defined(v) => Some(v),
            Self::Undefined => None,
        }
    }

    /// Flatten to a float for columnar writers: `Undefined` becomes NaN.
    #[must_use]
    pub fn value_or_nan(&self) -> f64 {
        self.value().unwrap_or(f64::NAN)
    }
}

// =============================================================================
// ATTRIBUTION RESULT
// =============================================================================

/// Deduplicated primary and pileup momentum sums for one object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributionResult {
    pub primary: FourMomentum,
    pub secondary: FourMomentum,
    /// Distinct momenta summed into `primary`.
    pub primary_count: usize,
    /// Distinct momenta summed into `secondary`.
    pub secondary_count: usize,
}

impl AttributionResult {
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.primary.e + self.secondary.e
    }

    /// `primary.E / (primary.E + secondary.E)`.
    #[must_use]
    pub fn primary_fraction(&self) -> EnergyFraction {
        EnergyFraction::of(self.primary.e, self.total_energy())
    }

    /// `secondary.E / (primary.E + secondary.E)`.
    #[must_use]
    pub fn secondary_fraction(&self) -> EnergyFraction {
        EnergyFraction::of(self.secondary.e, self.total_energy())
    }
}

// =============================================================================
// AGGREGATION
// =============================================================================

/// Classification key of one visit: `true` files the momentum as pileup.
#[must_use]
pub fn is_pileup_contribution(constituent: &Constituent<'_>) -> bool {
    match *constituent {
        Constituent::Leaf { leaf } | Constituent::Track { leaf, .. } => leaf.is_pileup,
        Constituent::Tower { track, .. } => track.is_pileup,
    }
}

/// Per-call accumulation state. Dropped when `attribute` returns.
#[derive(Default)]
struct Accumulator {
    primary: Vec<FourMomentum>,
    secondary: Vec<FourMomentum>,
}

impl<'g> Visitor<'g> for Accumulator {
    fn visit(&mut self, constituent: Constituent<'g>) {
        let momentum = constituent.leaf().momentum;
        let target = if is_pileup_contribution(&constituent) {
            &mut self.secondary
        } else {
            &mut self.primary
        };
        let key = momentum.collider_key();
        if !target.iter().any(|seen| seen.collider_key() == key) {
            target.push(momentum);
        }
    }
}

/// Sum an object's distinct leaf momenta into primary and pileup classes.
pub fn attribute<G: GraphView + ?Sized>(graph: &G, object: &OutputObject) -> AttributionResult {
    let mut acc = Accumulator::default();
    walk(graph, object, &mut acc);
    AttributionResult {
        primary: acc.primary.iter().sum(),
        secondary: acc.secondary.iter().sum(),
        primary_count: acc.primary.len(),
        secondary_count: acc.secondary.len(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
