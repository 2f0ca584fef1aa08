// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Numerical primitives for relativistic kinematics.
//!
//! This module contains the value types every jigsaw computes with:
//! - ThreeVector: Cartesian 3-momenta and boost velocities
//! - FourVector: (px, py, pz, E) momenta with invariant mass and boosts
//! - two_body_momentum: the two-body decay momentum formula
//!
//! Units are whatever the caller feeds in (GeV throughout the tests), with c = 1.

pub mod four_vector;
pub mod three_vector;
pub mod two_body;

pub use four_vector::FourVector;
pub use three_vector::ThreeVector;
pub use two_body::two_body_momentum;
