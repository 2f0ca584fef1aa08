// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Lorentz four-vectors.
//!
//! # Examples
//!
//! ```
//! use jigsaw_reco::kinematics::{FourVector, ThreeVector};
//!
//! // A W boson moving along z
//! let w = FourVector::from_momentum_mass(ThreeVector::new(0.0, 0.0, 120.0), 80.4);
//! let at_rest = w.boosted(-w.boost_vector());
//! assert!(at_rest.p() < 1e-9);
//! assert!((at_rest.e - 80.4).abs() < 1e-9);
//! ```

use crate::kinematics::ThreeVector;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

/// A four-momentum (px, py, pz, E) with metric (+, -, -, -).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FourVector {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub e: f64,
}

impl FourVector {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Four-vector with 3-momentum `p` and invariant mass `m`.
    pub fn from_momentum_mass(p: ThreeVector, m: f64) -> Self {
        let e = (p.mag2() + m * m).sqrt();
        Self::new(p.x, p.y, p.z, e)
    }

    /// Four-vector with transverse momentum (`px`, `py`), mass `m` and rapidity `y`.
    pub fn from_transverse_mass_rapidity(px: f64, py: f64, m: f64, y: f64) -> Self {
        let mt = (px * px + py * py + m * m).sqrt();
        Self::new(px, py, mt * y.sinh(), mt * y.cosh())
    }

    pub fn vect(self) -> ThreeVector {
        ThreeVector::new(self.px, self.py, self.pz)
    }

    /// Magnitude of the 3-momentum.
    pub fn p(self) -> f64 {
        self.vect().mag()
    }

    pub fn pt(self) -> f64 {
        self.vect().perp()
    }

    pub fn m2(self) -> f64 {
        self.e * self.e - self.vect().mag2()
    }

    /// Invariant mass. Space-like vectors report a negative mass, -sqrt(-m2).
    pub fn m(self) -> f64 {
        let m2 = self.m2();
        if m2 < 0.0 {
            -(-m2).sqrt()
        } else {
            m2.sqrt()
        }
    }

    /// Rapidity along z, or `None` when E <= |pz|.
    pub fn rapidity(self) -> Option<f64> {
        if self.e <= self.pz.abs() {
            return None;
        }
        Some(0.5 * ((self.e + self.pz) / (self.e - self.pz)).ln())
    }

    /// Velocity of the rest frame of this vector, p / E.
    pub fn boost_vector(self) -> ThreeVector {
        if self.e == 0.0 {
            return ThreeVector::ZERO;
        }
        self.vect() * (1.0 / self.e)
    }

    /// True when the vector has a rest frame (E > |p|).
    pub fn is_timelike(self) -> bool {
        self.e > 0.0 && self.m2() > 0.0
    }

    /// Apply the Lorentz boost with velocity `b` (|b| < 1).
    pub fn boost(&mut self, b: ThreeVector) {
        let b2 = b.mag2();
        let gamma = 1.0 / (1.0 - b2).sqrt();
        let bp = b.dot(self.vect());
        let gamma2 = if b2 > 0.0 { (gamma - 1.0) / b2 } else { 0.0 };

        self.px += gamma2 * bp * b.x + gamma * b.x * self.e;
        self.py += gamma2 * bp * b.y + gamma * b.y * self.e;
        self.pz += gamma2 * bp * b.z + gamma * b.z * self.e;
        self.e = gamma * (self.e + bp);
    }

    pub fn boosted(mut self, b: ThreeVector) -> Self {
        self.boost(b);
        self
    }

    /// This vector seen from the rest frame of `frame`.
    pub fn in_rest_frame_of(self, frame: FourVector) -> Self {
        self.boosted(-frame.boost_vector())
    }

    /// Same energy, reversed 3-momentum.
    pub fn contra(self) -> Self {
        Self::new(-self.px, -self.py, -self.pz, self.e)
    }
}

impl Add for FourVector {
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

impl AddAssign for FourVector {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for FourVector {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.px - rhs.px,
            self.py - rhs.py,
            self.pz - rhs.pz,
            self.e - rhs.e,
        )
    }
}

impl Mul<f64> for FourVector {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.px * rhs, self.py * rhs, self.pz * rhs, self.e * rhs)
    }
}

impl Sum for FourVector {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, v| acc + v)
    }
}

impl<'a> Sum<&'a FourVector> for FourVector {
    fn sum<I: Iterator<Item = &'a FourVector>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, v| acc + *v)
    }
}
