// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use jigsaw_reco::jigsaw::MinMassesCombJigsaw;
use jigsaw_reco::kinematics::two_body_momentum;
use jigsaw_reco::{AnalysisConfig, AnalysisContext, FourVector, FrameId, FrameKind, GroupId, GroupKind, JigsawId, ThreeVector};

pub fn jet(px: f64, py: f64, pz: f64) -> FourVector {
    FourVector::from_momentum_mass(ThreeVector::new(px, py, pz), 0.0)
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} within {}, got {}",
        expected,
        tolerance,
        actual
    );
}

/// Decay `parent` into daughters of masses `m1` and `m2`; in the parent rest
/// frame the first daughter flies along `direction`.
pub fn two_body_decay(parent: FourVector, m1: f64, m2: f64, direction: ThreeVector) -> (FourVector, FourVector) {
    let p = two_body_momentum(parent.m(), m1, m2);
    let axis = direction.unit();
    let d1 = FourVector::from_momentum_mass(axis * p, m1);
    let d2 = FourVector::from_momentum_mass(-axis * p, m2);
    let b = parent.boost_vector();
    (d1.boosted(b), d2.boosted(b))
}

/// LAB → CM → {W, Z}, with W and Z visible frames in one combinatoric
/// group split by a minimum-masses jigsaw.
pub struct DiBoson {
    pub ctx: AnalysisContext,
    pub jets: GroupId,
    pub split: JigsawId,
    pub lab: FrameId,
    pub cm: FrameId,
    pub w: FrameId,
    pub z: FrameId,
}

impl DiBoson {
    pub fn new(config: AnalysisConfig) -> Self {
        let mut ctx = AnalysisContext::new(config);
        let lab = ctx.add_frame("LAB", FrameKind::Lab);
        let cm = ctx.add_frame("CM", FrameKind::Decay);
        let w = ctx.add_frame("W", FrameKind::Visible);
        let z = ctx.add_frame("Z", FrameKind::Visible);
        ctx.set_child(lab, cm).unwrap();
        ctx.set_child(cm, w).unwrap();
        ctx.set_child(cm, z).unwrap();

        let jets = ctx.add_group("JETS", GroupKind::Combinatoric);
        ctx.add_frame_to_group(jets, w).unwrap();
        ctx.add_frame_to_group(jets, z).unwrap();
        let split = ctx.add_jigsaw(jets, MinMassesCombJigsaw::new("MinMjj")).unwrap();
        ctx.add_jigsaw_frame(split, w, 0).unwrap();
        ctx.add_jigsaw_frame(split, z, 1).unwrap();
        ctx.initialize_analysis().unwrap();

        Self {
            ctx,
            jets,
            split,
            lab,
            cm,
            w,
            z,
        }
    }

    pub fn analyze(&mut self, inputs: &[FourVector]) -> Result<(), jigsaw_reco::ResolveFailure> {
        self.ctx.clear_event();
        for &p in inputs {
            self.ctx.add_input(self.jets, p).unwrap();
        }
        self.ctx.analyze_event()
    }
}

/// Four jets from a W (80) and a Z (91) produced back-to-back with a 400 GeV
/// invariant mass, boosted along the beam.
pub fn wz_jets() -> [FourVector; 4] {
    let cm = FourVector::from_momentum_mass(ThreeVector::new(20.0, 0.0, 150.0), 400.0);
    let (w, z) = two_body_decay(cm, 80.0, 91.0, ThreeVector::new(0.3, 1.0, 0.2));
    let (w1, w2) = two_body_decay(w, 0.0, 0.0, ThreeVector::new(1.0, 0.0, -0.3));
    let (z1, z2) = two_body_decay(z, 0.0, 0.0, ThreeVector::new(0.2, -0.1, 1.0));
    [z2, w1, z1, w2]
}
