// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Invisible jigsaws.
//!
//! These rules fix the degrees of freedom the measurement leaves open for
//! unmeasured particles. The parent state carries the invisible momentum
//! (initially the missing transverse momentum, massless); the rules read the
//! visible frames attached as dependency frames.
//!
//! A typical chain for one invisible group:
//! [`SetMassInvJigsaw`] → [`SetRapidityInvJigsaw`] → [`ContraBoostInvJigsaw`].

use crate::engine::EventContext;
use crate::error::ResolveFailure;
use crate::jigsaw::{Jigsaw, JigsawCore, JigsawKind};
use crate::kinematics::FourVector;

fn invisible_parent(core: &JigsawCore, ctx: &EventContext<'_>) -> Result<FourVector, ResolveFailure> {
    let parent = core.parent_state().ok_or(ResolveFailure::NotInitialized)?;
    let state = &ctx.states()[parent];
    if state.is_empty() {
        return Err(ResolveFailure::MissingInput {
            source_name: core.name().to_string(),
        });
    }
    Ok(state.four_vector())
}

fn set_child(ctx: &mut EventContext<'_>, core: &JigsawCore, i: usize, p4: FourVector) {
    let child = core.child_state(i);
    ctx.states_mut()[child].set_four_vector(p4);
}

/// Give the invisible system the summed masses of its frames, keeping its
/// 3-momentum.
#[derive(Debug)]
pub struct SetMassInvJigsaw {
    core: JigsawCore,
}

impl SetMassInvJigsaw {
    pub fn new(name: &str) -> Self {
        Self {
            core: JigsawCore::new(name, 1),
        }
    }
}

impl Jigsaw for SetMassInvJigsaw {
    fn core(&self) -> &JigsawCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut JigsawCore {
        &mut self.core
    }

    fn kind(&self) -> JigsawKind {
        JigsawKind::Invisible
    }

    fn label(&self) -> &str {
        "set invisible mass"
    }

    fn analyze_event(&self, ctx: &mut EventContext<'_>) -> Result<(), ResolveFailure> {
        let parent = invisible_parent(&self.core, ctx)?;
        let tree = ctx.tree();
        let mass: f64 = self
            .core
            .child_frames(0)
            .iter()
            .filter_map(|frame| tree.get(frame))
            .map(|frame| frame.mass())
            .sum();
        set_child(ctx, &self.core, 0, FourVector::from_momentum_mass(parent.vect(), mass));
        Ok(())
    }
}

/// Give the invisible system the rapidity of the visible frames it is
/// paired with, keeping its transverse momentum and mass.
#[derive(Debug)]
pub struct SetRapidityInvJigsaw {
    core: JigsawCore,
}

impl SetRapidityInvJigsaw {
    pub fn new(name: &str) -> Self {
        Self {
            core: JigsawCore::new(name, 1),
        }
    }
}

impl Jigsaw for SetRapidityInvJigsaw {
    fn core(&self) -> &JigsawCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut JigsawCore {
        &mut self.core
    }

    fn kind(&self) -> JigsawKind {
        JigsawKind::Invisible
    }

    fn label(&self) -> &str {
        "set invisible rapidity"
    }

    fn analyze_event(&self, ctx: &mut EventContext<'_>) -> Result<(), ResolveFailure> {
        let invisible = invisible_parent(&self.core, ctx)?;
        let visible = ctx.dependency_four_vector(&self.core, 0);
        let rapidity = visible.rapidity().ok_or_else(|| ResolveFailure::DegenerateKinematics {
            jigsaw: self.name().to_string(),
            reason: "visible system has no rapidity",
        })?;
        let p4 = FourVector::from_transverse_mass_rapidity(
            invisible.px,
            invisible.py,
            invisible.m().max(0.0),
            rapidity,
        );
        set_child(ctx, &self.core, 0, p4);
        Ok(())
    }
}

/// Split the invisible system between two decays so that the two parents
/// have equal energy and opposite momentum in their common rest frame
/// ("contra-boost invariant" split).
///
/// Child `i` reads the visible frames of decay `i` through its dependency
/// frames; the invisible frames of decay `i` are its child frames.
#[derive(Debug)]
pub struct ContraBoostInvJigsaw {
    core: JigsawCore,
}

impl ContraBoostInvJigsaw {
    pub fn new(name: &str) -> Self {
        Self {
            core: JigsawCore::new(name, 2),
        }
    }
}

/// Coefficients (c₁, c₂) of the split, in the rest frame of V₁ + V₂ + I.
fn contra_boost_coefficients(v1: FourVector, v2: FourVector, e_inv: f64) -> (f64, f64) {
    let (m1_sq, m2_sq) = (v1.m2(), v2.m2());
    let mc_sq = 2.0 * (v1.e * v2.e + v1.vect().dot(v2.vect()));
    let k1 = m1_sq - m2_sq + mc_sq;
    let k2 = m2_sq - m1_sq + mc_sq;
    let e_total = e_inv + v1.e + v2.e;
    let denominator = 2.0 * (k2 * v1.e + k1 * v2.e);
    if k1 > 0.0 && k2 > 0.0 && denominator > 0.0 {
        let scale = e_total / denominator;
        (scale * k2, scale * k1)
    } else {
        let c = e_total / (2.0 * (v1.e + v2.e));
        (c, c)
    }
}

impl Jigsaw for ContraBoostInvJigsaw {
    fn core(&self) -> &JigsawCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut JigsawCore {
        &mut self.core
    }

    fn kind(&self) -> JigsawKind {
        JigsawKind::Invisible
    }

    fn label(&self) -> &str {
        "contra-boost invariant split"
    }

    fn analyze_event(&self, ctx: &mut EventContext<'_>) -> Result<(), ResolveFailure> {
        let invisible = invisible_parent(&self.core, ctx)?;
        let v1 = ctx.dependency_four_vector(&self.core, 0);
        let v2 = ctx.dependency_four_vector(&self.core, 1);
        let total = v1 + v2 + invisible;
        let degenerate = |reason: &'static str| ResolveFailure::DegenerateKinematics {
            jigsaw: self.name().to_string(),
            reason,
        };
        if !total.is_timelike() {
            return Err(degenerate("system has no rest frame"));
        }

        let to_rest = -total.boost_vector();
        let (v1, v2, invisible) = (v1.boosted(to_rest), v2.boosted(to_rest), invisible.boosted(to_rest));
        if v1.e + v2.e <= 0.0 {
            return Err(degenerate("no visible energy"));
        }
        let (c1, c2) = contra_boost_coefficients(v1, v2, invisible.e);

        let i1 = v1 * (c1 - 1.0) + v2.contra() * c2;
        let i2 = v2 * (c2 - 1.0) + v1.contra() * c1;
        set_child(ctx, &self.core, 0, i1.boosted(-to_rest));
        set_child(ctx, &self.core, 1, i2.boosted(-to_rest));
        Ok(())
    }
}
