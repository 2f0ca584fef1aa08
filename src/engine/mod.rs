// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Per-event execution of jigsaws.
//!
//! # Architecture
//!
//! Setup produces an immutable [`Topology`]: the tree, the groups, the
//! jigsaws and an execution list in which every jigsaw comes after the
//! jigsaws it depends on. Per event, [`run_event`] walks that list once.
//! Each jigsaw reads and writes states through an [`EventContext`], which
//! borrows the topology shared and the [`StateStore`] exclusively.
//!
//! Because the topology is only borrowed, a jigsaw can run other jigsaws
//! from inside its own `analyze_event`. Combinatoric jigsaws use this to
//! evaluate jigsaws downstream of a candidate assignment before scoring it
//! (see [`EventContext::execute_inline`]).
//!
//! The first failure abandons the event: it is logged, counted and returned,
//! and the remaining jigsaws are not run.

pub mod schedule;

use crate::config::AnalysisConfig;
use crate::context::Topology;
use crate::error::ResolveFailure;
use crate::jigsaw::{JigsawCore, JigsawId};
use crate::kinematics::FourVector;
use crate::state::statistics::{Counters, Statistics};
use crate::state::{Element, StateId, StateStore};
use crate::tree::FrameTree;
use tracing::{trace, warn};

/// What a jigsaw sees while analyzing an event.
pub struct EventContext<'a> {
    topology: &'a Topology,
    states: &'a mut StateStore,
    statistics: &'a mut Statistics,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(
        topology: &'a Topology,
        states: &'a mut StateStore,
        statistics: &'a mut Statistics,
    ) -> Self {
        Self {
            topology,
            states,
            statistics,
        }
    }

    pub fn config(&self) -> &'a AnalysisConfig {
        self.topology.config()
    }

    pub fn tree(&self) -> &'a FrameTree {
        self.topology.tree()
    }

    pub fn states(&self) -> &StateStore {
        &*self.states
    }

    pub fn states_mut(&mut self) -> &mut StateStore {
        &mut *self.states
    }

    pub(crate) fn statistics_mut(&mut self) -> &mut Statistics {
        &mut *self.statistics
    }

    /// Copy of the elements of the parent state of `core`.
    pub fn parent_elements(&self, core: &JigsawCore) -> Result<Vec<Element>, ResolveFailure> {
        let parent = core.parent_state().ok_or(ResolveFailure::NotInitialized)?;
        Ok(self.states[parent].elements().to_vec())
    }

    pub fn parent_four_vector(&self, core: &JigsawCore) -> Result<FourVector, ResolveFailure> {
        let parent = core.parent_state().ok_or(ResolveFailure::NotInitialized)?;
        Ok(self.states[parent].four_vector())
    }

    /// Sum over the dependency states of child `i`.
    pub fn dependency_four_vector(&self, core: &JigsawCore, i: usize) -> FourVector {
        self.states.four_vector(core.dependency_states(i))
    }

    /// Run one jigsaw.
    pub fn execute(&mut self, id: JigsawId) -> Result<(), ResolveFailure> {
        let topology = self.topology;
        let jigsaw = topology.jigsaw(id).ok_or(ResolveFailure::NotInitialized)?;
        trace!(jigsaw = jigsaw.name(), "execute");
        jigsaw.analyze_event(self)
    }

    /// Run `resolve` for the jigsaw `core`. If it fails, the child states of
    /// `core` and of its inline jigsaws get back the elements they held
    /// before.
    pub fn preserving_children<F>(&mut self, core: &JigsawCore, resolve: F) -> Result<(), ResolveFailure>
    where
        F: FnOnce(&mut Self) -> Result<(), ResolveFailure>,
    {
        let topology = self.topology;
        let owned = core.inline_jigsaws().iter().filter_map(|id| topology.jigsaw(id));
        let saved: Vec<(StateId, Vec<Element>)> = core
            .child_states()
            .iter()
            .chain(owned.flat_map(|jigsaw| jigsaw.core().child_states().iter()))
            .map(|&state| (state, self.states[state].elements().to_vec()))
            .collect();

        let outcome = resolve(self);
        if outcome.is_err() {
            for (state, elements) in saved {
                let state = &mut self.states[state];
                state.clear_elements();
                state.add_elements(&elements);
            }
        }
        outcome
    }

    /// Run the inline jigsaws of `core`, in order.
    ///
    /// Failures are reported against the dependency that failed.
    pub fn execute_inline(&mut self, core: &JigsawCore) -> Result<(), ResolveFailure> {
        for id in core.inline_jigsaws().iter() {
            if let Err(failure) = self.execute(id) {
                let dependency = self
                    .topology
                    .jigsaw(id)
                    .map(|j| j.name().to_string())
                    .unwrap_or_else(|| id.to_string());
                trace!(jigsaw = core.name(), %dependency, reason = %failure, "inline jigsaw failed");
                return Err(ResolveFailure::DependencyFailed {
                    jigsaw: core.name().to_string(),
                    dependency,
                });
            }
        }
        Ok(())
    }
}

/// Resolve the current event: run every jigsaw of the execution list.
pub(crate) fn run_event(
    topology: &Topology,
    states: &mut StateStore,
    statistics: &mut Statistics,
) -> Result<(), ResolveFailure> {
    statistics.increment_counter(Counters::EventsAnalyzed);
    let outcome = run_jigsaws(topology, states, statistics);
    match &outcome {
        Ok(()) => statistics.increment_counter(Counters::EventsResolved),
        Err(failure) => statistics.record_failure(failure),
    }
    outcome
}

fn run_jigsaws(
    topology: &Topology,
    states: &mut StateStore,
    statistics: &mut Statistics,
) -> Result<(), ResolveFailure> {
    for (frame, state) in topology.standalone_states() {
        if states[state].is_empty() {
            let failure = ResolveFailure::MissingInput {
                source_name: topology.tree().name(frame),
            };
            warn!(frame = %topology.tree().name(frame), reason = %failure, "event not resolved");
            return Err(failure);
        }
    }

    let mut ctx = EventContext::new(topology, states, statistics);
    for id in topology.execution_list().iter() {
        if let Err(failure) = ctx.execute(id) {
            let name = topology.jigsaw(id).map(|j| j.name()).unwrap_or("?");
            warn!(jigsaw = name, reason = %failure, "event not resolved");
            return Err(failure);
        }
    }
    Ok(())
}
