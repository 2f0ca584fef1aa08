// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Exhaustive combinatoric jigsaws.
//!
//! A combinatoric jigsaw distributes the N objects of its parent state among
//! its K children. The exhaustive search visits all K^N assignments, skips
//! those violating a child's [`ChildRequirement`](super::ChildRequirement),
//! and keeps the assignment with the best [`CombinatoricMetric`] score.
//!
//! Before a candidate is scored, the jigsaw's inline jigsaws are run, so a
//! metric may read states that other jigsaws derive from the candidate (an
//! invisible momentum split, for instance).

use crate::engine::EventContext;
use crate::error::ResolveFailure;
use crate::jigsaw::{Jigsaw, JigsawCore, JigsawKind};
use crate::kinematics::two_body_momentum;
use crate::state::statistics::Counters;
use crate::state::Element;
use std::fmt::Debug;
use tracing::{debug, trace};

/// Score of a candidate assignment. Larger is better.
pub trait CombinatoricMetric: Debug {
    fn evaluate(&self, ctx: &EventContext<'_>, core: &JigsawCore) -> f64;

    fn label(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Two-body decay momentum of children 0 and 1, each taken with its
/// dependency states. Only meaningful for two children.
#[derive(Debug, Default, Clone, Copy)]
pub struct TwoBodyMomentum;

impl CombinatoricMetric for TwoBodyMomentum {
    fn evaluate(&self, ctx: &EventContext<'_>, core: &JigsawCore) -> f64 {
        let p1 = ctx.dependency_four_vector(core, 0);
        let p2 = ctx.dependency_four_vector(core, 1);
        two_body_momentum((p1 + p2).m(), p1.m(), p2.m())
    }

    fn label(&self) -> &str {
        "two-body momentum"
    }
}

/// Negated sum of the children's masses: the lightest children win.
#[derive(Debug, Default, Clone, Copy)]
pub struct MinMassSum;

impl CombinatoricMetric for MinMassSum {
    fn evaluate(&self, ctx: &EventContext<'_>, core: &JigsawCore) -> f64 {
        -(0..core.n_children())
            .map(|i| ctx.dependency_four_vector(core, i).m())
            .sum::<f64>()
    }

    fn label(&self) -> &str {
        "minimum mass sum"
    }
}

/// Combinatoric jigsaw scoring every valid assignment with metric `M`.
#[derive(Debug)]
pub struct CombinatoricJigsaw<M: CombinatoricMetric> {
    core: JigsawCore,
    metric: M,
}

impl<M: CombinatoricMetric> CombinatoricJigsaw<M> {
    pub fn new(name: &str, n_children: usize, metric: M) -> Self {
        Self {
            core: JigsawCore::new(name, n_children),
            metric,
        }
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }
}

impl<M: CombinatoricMetric> Jigsaw for CombinatoricJigsaw<M> {
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
        self.metric.label()
    }

    fn analyze_event(&self, ctx: &mut EventContext<'_>) -> Result<(), ResolveFailure> {
        ctx.preserving_children(&self.core, |ctx| {
            loop_combinatoric(&self.core, ctx, &self.metric)?;
            ctx.execute_inline(&self.core)
        })
    }
}

/// Advance `assignment` to the next of the `k^n` assignments. Returns false
/// after the last one.
fn next_assignment(assignment: &mut [usize], k: usize) -> bool {
    for digit in assignment.iter_mut() {
        *digit += 1;
        if *digit < k {
            return true;
        }
        *digit = 0;
    }
    false
}

fn satisfies_requirements(core: &JigsawCore, assignment: &[usize], counts: &mut [usize]) -> bool {
    counts.fill(0);
    for &child in assignment {
        counts[child] += 1;
    }
    counts
        .iter()
        .enumerate()
        .all(|(i, &count)| core.child_requirement(i).accepts(count))
}

/// Write `elements` into the child states: element `e` goes to child
/// `assignment[e]`.
pub(crate) fn fill_children(ctx: &mut EventContext<'_>, core: &JigsawCore, elements: &[Element], assignment: &[usize]) {
    let states = ctx.states_mut();
    for &child in core.child_states() {
        states[child].clear_elements();
    }
    for (element, &i) in elements.iter().zip(assignment) {
        states[core.child_state(i)].add_element(*element);
    }
}

/// Exhaustive search over all assignments of the parent elements to the
/// children of `core`. The best assignment is left in the child states; the
/// inline jigsaws are not re-run for it.
///
/// Candidates are written to the child states as they are scored, so callers
/// run this inside [`EventContext::preserving_children`].
pub(crate) fn loop_combinatoric(
    core: &JigsawCore,
    ctx: &mut EventContext<'_>,
    metric: &dyn CombinatoricMetric,
) -> Result<(), ResolveFailure> {
    let elements = ctx.parent_elements(core)?;
    let n = elements.len();
    let k = core.n_children();

    let required: usize = (0..k).map(|i| core.child_requirement(i).min).sum();
    if n < required {
        return Err(ResolveFailure::InsufficientInputs {
            jigsaw: core.name().to_string(),
            available: n,
            required,
        });
    }
    let limit = ctx.config().max_combinatoric_inputs;
    if n > limit {
        return Err(ResolveFailure::TooManyInputs {
            jigsaw: core.name().to_string(),
            available: n,
            limit,
        });
    }

    let mut assignment = vec![0; n];
    let mut counts = vec![0; k];
    let mut best: Option<(f64, Vec<usize>)> = None;
    let mut evaluated = 0;
    loop {
        if satisfies_requirements(core, &assignment, &mut counts) {
            fill_children(ctx, core, &elements, &assignment);
            if ctx.execute_inline(core).is_ok() {
                let score = metric.evaluate(ctx, core);
                evaluated += 1;
                trace!(jigsaw = core.name(), ?assignment, score, "candidate");
                let improves = best.as_ref().map_or(true, |(top, _)| score > *top);
                if !score.is_nan() && improves {
                    best = Some((score, assignment.clone()));
                }
            }
        }
        if !next_assignment(&mut assignment, k) {
            break;
        }
    }

    debug!(jigsaw = core.name(), metric = metric.label(), evaluated, "exhaustive partition");
    let stats = ctx.statistics_mut();
    stats.increment_counter(Counters::ExhaustivePartitions);
    stats.add_to_counter(Counters::CandidatesEvaluated, evaluated);

    let (_, best) = best.ok_or_else(|| ResolveFailure::NoValidPartition {
        jigsaw: core.name().to_string(),
    })?;
    fill_children(ctx, core, &elements, &best);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odometer_visits_every_assignment() {
        let mut assignment = vec![0; 3];
        let mut seen = vec![assignment.clone()];
        while next_assignment(&mut assignment, 2) {
            seen.push(assignment.clone());
        }
        assert_eq!(seen.len(), 8);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 8);
        assert_eq!(assignment, vec![0, 0, 0]);
    }

    #[test]
    fn test_odometer_with_no_inputs() {
        let mut assignment: Vec<usize> = Vec::new();
        assert!(!next_assignment(&mut assignment, 3));
    }

    #[test]
    fn test_requirements() {
        let mut core = JigsawCore::new("J", 2);
        let mut counts = vec![0; 2];
        assert!(satisfies_requirements(&core, &[0, 1, 1], &mut counts));
        assert_eq!(counts, vec![1, 2]);
        assert!(!satisfies_requirements(&core, &[1, 1, 1], &mut counts));

        core.set_child_requirement(1, crate::jigsaw::ChildRequirement::new(2, true));
        assert!(satisfies_requirements(&core, &[0, 1, 1], &mut counts));
        assert!(!satisfies_requirements(&core, &[1, 1, 1], &mut counts));
        assert!(!satisfies_requirements(&core, &[0, 0, 1], &mut counts));
    }
}
