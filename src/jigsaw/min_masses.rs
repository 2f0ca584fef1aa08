// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Minimum-masses pairing of visible objects into two hemispheres.
//!
//! # Algorithm
//!
//! In the rest frame of all inputs, the two-way split maximizing the summed
//! hemisphere momenta |P₀| + |P₁| is separated by a plane through the origin.
//! Such a plane can always be rotated until it touches two inputs, so every
//! candidate is generated by a pair (i, j):
//!
//! 1. n = pᵢ × pⱼ; every other input k goes to hemisphere `pₖ · n > 0`
//! 2. i and j themselves each go to either side (four choices)
//!
//! That gives O(N²) planes with O(N) work each, instead of the 2^N
//! assignments of the exhaustive search.
//!
//! The fast path needs plain children: each child reads only its own state
//! and needs at most one object. Otherwise the exhaustive search is used
//! with the [`TwoBodyMomentum`] metric.
//!
//! Either way the lighter child ends up first.

use super::combinatoric::{fill_children, loop_combinatoric};
use crate::config::AnalysisConfig;
use crate::engine::EventContext;
use crate::error::ResolveFailure;
use crate::jigsaw::{Jigsaw, JigsawCore, JigsawKind, TwoBodyMomentum};
use crate::kinematics::{FourVector, ThreeVector};
use crate::state::statistics::Counters;
use tracing::debug;

/// A two-way split of a list of inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Hemisphere (0 or 1) of each input.
    pub assignment: Vec<usize>,
    /// |P₀| + |P₁| in the rest frame of all inputs.
    pub metric: f64,
}

impl Partition {
    pub fn hemisphere(&self, h: usize) -> impl Iterator<Item = usize> + '_ {
        self.assignment
            .iter()
            .enumerate()
            .filter(move |&(_, &side)| side == h)
            .map(|(i, _)| i)
    }
}

/// Hemisphere split of `inputs` maximizing |P₀| + |P₁| in their rest frame.
///
/// Returns `None` with fewer than two inputs or when the inputs have no
/// rest frame.
///
/// # Examples
///
/// ```
/// use jigsaw_reco::jigsaw::min_masses_partition;
/// use jigsaw_reco::kinematics::{FourVector, ThreeVector};
///
/// let jet = |x, y, z| FourVector::from_momentum_mass(ThreeVector::new(x, y, z), 0.0);
/// let inputs = [jet(50.0, 1.0, 0.0), jet(45.0, -2.0, 3.0), jet(-60.0, 0.0, 1.0), jet(-40.0, 2.0, -2.0)];
/// let partition = min_masses_partition(&inputs).unwrap();
/// assert_eq!(partition.assignment[0], partition.assignment[1]);
/// assert_eq!(partition.assignment[2], partition.assignment[3]);
/// assert_ne!(partition.assignment[0], partition.assignment[2]);
/// ```
pub fn min_masses_partition(inputs: &[FourVector]) -> Option<Partition> {
    let n = inputs.len();
    if n < 2 {
        return None;
    }
    let total: FourVector = inputs.iter().sum();
    if !total.is_timelike() {
        return None;
    }
    let boost = -total.boost_vector();
    let p: Vec<ThreeVector> = inputs.iter().map(|v| v.boosted(boost).vect()).collect();

    let mut best: Option<Partition> = None;
    let mut best_metric = -1.0;
    let mut side = vec![0; n];
    for i in 0..n - 1 {
        for j in (i + 1)..n {
            let normal = p[i].cross(p[j]);
            let mut sums = [ThreeVector::ZERO; 2];
            let mut counts = [0; 2];
            for k in 0..n {
                if k == i || k == j {
                    continue;
                }
                let h = usize::from(p[k].dot(normal) > 0.0);
                side[k] = h;
                sums[h] += p[k];
                counts[h] += 1;
            }

            for (hi, hj) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                if hi == hj && counts[1 - hi] == 0 {
                    continue;
                }
                let mut candidate = sums;
                candidate[hi] += p[i];
                candidate[hj] += p[j];
                let metric = candidate[0].mag() + candidate[1].mag();
                if metric > best_metric {
                    best_metric = metric;
                    side[i] = hi;
                    side[j] = hj;
                    best = Some(Partition {
                        assignment: side.clone(),
                        metric,
                    });
                }
            }
        }
    }
    best
}

/// Two-way combinatoric jigsaw pairing objects into the two lightest
/// hemispheres.
#[derive(Debug)]
pub struct MinMassesCombJigsaw {
    core: JigsawCore,
}

impl MinMassesCombJigsaw {
    pub fn new(name: &str) -> Self {
        Self {
            core: JigsawCore::new(name, 2),
        }
    }

    /// True if the hemisphere algorithm may replace the exhaustive search.
    pub fn uses_fast_path(&self, config: &AnalysisConfig) -> bool {
        let core = &self.core;
        config.min_masses_fast_path
            && core.n_children() == 2
            && (0..2).all(|i| {
                let requirement = core.child_requirement(i);
                core.dependency_states(i).len() == 1 && requirement.min <= 1 && !requirement.exclusive
            })
    }

    fn fast_partition(&self, ctx: &mut EventContext<'_>) -> Result<(), ResolveFailure> {
        let elements = ctx.parent_elements(&self.core)?;
        if elements.len() < 2 {
            return Err(ResolveFailure::InsufficientInputs {
                jigsaw: self.name().to_string(),
                available: elements.len(),
                required: 2,
            });
        }
        let inputs: Vec<FourVector> = elements.iter().map(|e| e.p4).collect();
        if !inputs.iter().sum::<FourVector>().is_timelike() {
            return Err(ResolveFailure::DegenerateKinematics {
                jigsaw: self.name().to_string(),
                reason: "inputs have no rest frame",
            });
        }
        let partition = min_masses_partition(&inputs).ok_or_else(|| ResolveFailure::NoValidPartition {
            jigsaw: self.name().to_string(),
        })?;
        debug!(jigsaw = self.name(), inputs = inputs.len(), metric = partition.metric, "hemisphere partition");
        fill_children(ctx, &self.core, &elements, &partition.assignment);
        ctx.statistics_mut().increment_counter(Counters::FastPathPartitions);
        Ok(())
    }
}

/// Put the lighter of two children first. Equal masses keep their order.
pub(crate) fn order_by_mass(ctx: &mut EventContext<'_>, core: &JigsawCore) {
    let (first, second) = (core.child_state(0), core.child_state(1));
    let states = ctx.states_mut();
    if states[first].mass() > states[second].mass() {
        states.swap_elements(first, second);
    }
}

impl Jigsaw for MinMassesCombJigsaw {
    fn core(&self) -> &JigsawCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut JigsawCore {
        &mut self.core
    }

    fn kind(&self) -> JigsawKind {
        JigsawKind::Combinatoric
    }

    fn label(&self) -> &str {
        "minimum masses"
    }

    fn analyze_event(&self, ctx: &mut EventContext<'_>) -> Result<(), ResolveFailure> {
        ctx.preserving_children(&self.core, |ctx| {
            if self.uses_fast_path(ctx.config()) {
                self.fast_partition(ctx)?;
            } else {
                loop_combinatoric(&self.core, ctx, &TwoBodyMomentum)?;
            }
            order_by_mass(ctx, &self.core);
            ctx.execute_inline(&self.core)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jet(x: f64, y: f64, z: f64) -> FourVector {
        FourVector::from_momentum_mass(ThreeVector::new(x, y, z), 0.0)
    }

    #[test]
    fn test_too_few_inputs() {
        assert_eq!(min_masses_partition(&[]), None);
        assert_eq!(min_masses_partition(&[jet(1.0, 0.0, 0.0)]), None);
    }

    #[test]
    fn test_two_inputs_are_split() {
        let partition = min_masses_partition(&[jet(1.0, 2.0, 0.0), jet(-3.0, 0.5, 1.0)]).unwrap();
        assert_ne!(partition.assignment[0], partition.assignment[1]);
    }

    #[test]
    fn test_collinear_inputs_have_no_rest_frame() {
        assert_eq!(min_masses_partition(&[jet(0.0, 0.0, 5.0), jet(0.0, 0.0, 7.0)]), None);
    }

    #[test]
    fn test_back_to_back_pairs() {
        let inputs = [
            jet(30.0, 1.0, 0.0),
            jet(-31.0, 0.0, 2.0),
            jet(28.0, -1.0, 1.0),
            jet(-27.0, 1.5, -1.0),
        ];
        let partition = min_masses_partition(&inputs).unwrap();
        let first: Vec<usize> = partition.hemisphere(partition.assignment[0]).collect();
        assert_eq!(first, vec![0, 2]);
        assert!(partition.metric > 100.0);
    }
}
