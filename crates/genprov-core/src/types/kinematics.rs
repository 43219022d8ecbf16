//! # Kinematics
//!
//! Four-vectors used throughout the engine.
//!
//! Conventions follow the usual collider layout: `z` is the beam axis,
//! pseudorapidity is undefined along it and is reported as
//! `±PSEUDORAPIDITY_LIMIT` instead of NaN or infinity.

use crate::primitives::PSEUDORAPIDITY_LIMIT;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Pseudorapidity from transverse and longitudinal components.
fn pseudorapidity(transverse: f64, longitudinal: f64) -> f64 {
    if transverse == 0.0 {
        if longitudinal == 0.0 {
            0.0
        } else {
            longitudinal.signum() * PSEUDORAPIDITY_LIMIT
        }
    } else {
        (longitudinal / transverse).asinh()
    }
}

/// Azimuth in `(-pi, pi]`, zero for the null transverse vector.
fn azimuth(x: f64, y: f64) -> f64 {
    if x == 0.0 && y == 0.0 { 0.0 } else { y.atan2(x) }
}

// =============================================================================
// FOUR-MOMENTUM
// =============================================================================

/// A Lorentz four-momentum `(px, py, pz, E)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FourMomentum {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub e: f64,
}

impl FourMomentum {
    /// The null four-momentum.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Build from collider coordinates.
    #[must_use]
    pub fn from_pt_eta_phi_e(pt: f64, eta: f64, phi: f64, e: f64) -> Self {
        let pt = pt.abs();
        Self::new(pt * phi.cos(), pt * phi.sin(), pt * eta.sinh(), e)
    }

    /// Transverse momentum, recomputed from the components.
    #[must_use]
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    /// Magnitude of the three-momentum.
    #[must_use]
    pub fn p(&self) -> f64 {
        self.pt().hypot(self.pz)
    }

    #[must_use]
    pub fn eta(&self) -> f64 {
        pseudorapidity(self.pt(), self.pz)
    }

    #[must_use]
    pub fn phi(&self) -> f64 {
        azimuth(self.px, self.py)
    }

    /// Polar angle measured from the beam axis.
    #[must_use]
    pub fn theta(&self) -> f64 {
        let pt = self.pt();
        if pt == 0.0 && self.pz == 0.0 {
            0.0
        } else {
            pt.atan2(self.pz)
        }
    }

    /// `cos(theta)`, 1 for the null three-momentum.
    #[must_use]
    pub fn cos_theta(&self) -> f64 {
        let p = self.p();
        if p == 0.0 { 1.0 } else { self.pz / p }
    }

    /// Invariant mass. Space-like vectors report a negative mass.
    #[must_use]
    pub fn mass(&self) -> f64 {
        let p = self.p();
        let m2 = (self.e - p) * (self.e + p);
        if m2 < 0.0 { -(-m2).sqrt() } else { m2.sqrt() }
    }

    /// Kinematic key used for exact-equality deduplication: `(pt, eta, phi, E)`.
    #[must_use]
    pub fn collider_key(&self) -> [f64; 4] {
        [self.pt(), self.eta(), self.phi(), self.e]
    }
}

impl Add for FourMomentum {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.px + rhs.px,
            self.py + rhs.py,
            self.pz + rhs.pz,
            self.e + rhs.e,
        )
    }
}

impl AddAssign for FourMomentum {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for FourMomentum {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a FourMomentum> for FourMomentum {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// FOUR-POSITION
// =============================================================================

/// A space-time point `(x, y, z, t)`, lengths in mm and `t` in mm/c.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FourPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub t: f64,
}

impl FourPosition {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, t: f64) -> Self {
        Self { x, y, z, t }
    }

    #[must_use]
    pub fn rho(&self) -> f64 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn eta(&self) -> f64 {
        pseudorapidity(self.rho(), self.z)
    }

    #[must_use]
    pub fn phi(&self) -> f64 {
        azimuth(self.x, self.y)
    }

    #[must_use]
    pub fn cos_theta(&self) -> f64 {
        let r = self.rho().hypot(self.z);
        if r == 0.0 { 1.0 } else { self.z / r }
    }
}
