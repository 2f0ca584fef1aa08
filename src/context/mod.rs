// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Analysis context combining the fixed topology and the per-event states.
//!
//! The AnalysisContext owns everything of one analysis configuration:
//! - the [`Topology`]: tree, groups, jigsaws, execution order (fixed once
//!   initialized)
//! - the [`StateStore`]: element lists, refilled for every event
//! - the [`Statistics`] counters
//!
//! Independent contexts share nothing, so several analyses can run side by
//! side on different threads.
//!
//! # Examples
//!
//! ```
//! use jigsaw_reco::context::AnalysisContext;
//! use jigsaw_reco::config::AnalysisConfig;
//! use jigsaw_reco::group::GroupKind;
//! use jigsaw_reco::jigsaw::MinMassesCombJigsaw;
//! use jigsaw_reco::kinematics::{FourVector, ThreeVector};
//! use jigsaw_reco::tree::FrameKind;
//!
//! let mut ctx = AnalysisContext::new(AnalysisConfig::default());
//! let lab = ctx.add_frame("LAB", FrameKind::Lab);
//! let cm = ctx.add_frame("CM", FrameKind::Decay);
//! let a = ctx.add_frame("A", FrameKind::Visible);
//! let b = ctx.add_frame("B", FrameKind::Visible);
//! ctx.set_child(lab, cm).unwrap();
//! ctx.set_child(cm, a).unwrap();
//! ctx.set_child(cm, b).unwrap();
//!
//! let jets = ctx.add_group("JETS", GroupKind::Combinatoric);
//! ctx.add_frame_to_group(jets, a).unwrap();
//! ctx.add_frame_to_group(jets, b).unwrap();
//!
//! let split = ctx.add_jigsaw(jets, MinMassesCombJigsaw::new("MinM")).unwrap();
//! ctx.add_jigsaw_frame(split, a, 0).unwrap();
//! ctx.add_jigsaw_frame(split, b, 1).unwrap();
//! ctx.initialize_analysis().unwrap();
//!
//! let inputs = [
//!     FourVector::from_momentum_mass(ThreeVector::new(40.0, 0.0, 0.0), 0.0),
//!     FourVector::from_momentum_mass(ThreeVector::new(-40.0, 5.0, 0.0), 0.0),
//!     FourVector::from_momentum_mass(ThreeVector::new(0.0, -5.0, 30.0), 0.0),
//! ];
//! ctx.clear_event();
//! for p in inputs {
//!     ctx.add_input(jets, p).unwrap();
//! }
//! ctx.analyze_event().unwrap();
//!
//! // every input lands in exactly one child, the lighter child first
//! let total: FourVector = inputs.iter().sum();
//! assert!((ctx.frame_four_vector(cm).unwrap().e - total.e).abs() < 1e-9);
//! assert!(ctx.frame_mass(a).unwrap() <= ctx.frame_mass(b).unwrap());
//! ```

mod topology;

pub use topology::Topology;

use crate::config::AnalysisConfig;
use crate::engine;
use crate::engine::schedule;
use crate::error::{ConfigError, ResolveFailure};
use crate::group::{Group, GroupId, GroupKind};
use crate::jigsaw::{ChildRequirement, Jigsaw, JigsawId, JigsawKind};
use crate::key::KeyRegistry;
use crate::kinematics::{FourVector, ThreeVector};
use crate::list::ObjectList;
use crate::state::statistics::Statistics;
use crate::state::{Element, State, StateId, StateOwner, StateStore};
use crate::tree::{Frame, FrameId, FrameKind, FrameTree};
use tracing::warn;

pub struct AnalysisContext {
    keys: KeyRegistry,
    topology: Topology,
    states: StateStore,
    statistics: Statistics,
    initialized: bool,
    last_event: Option<Result<(), ResolveFailure>>,
}

impl AnalysisContext {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            keys: KeyRegistry::new(),
            topology: Topology::new(config),
            states: StateStore::new(),
            statistics: Statistics::new(),
            initialized: false,
            last_event: None,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.topology.config()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn tree(&self) -> &FrameTree {
        self.topology.tree()
    }

    pub fn states(&self) -> &StateStore {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn reset_statistics(&mut self) {
        self.statistics.reset();
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Any change to the configuration requires a new initialization.
    fn invalidate(&mut self) {
        self.initialized = false;
        self.last_event = None;
    }

    // ---- Frames ----

    pub fn add_frame(&mut self, name: &str, kind: FrameKind) -> FrameId {
        let id = FrameId(self.keys.issue());
        self.topology.tree.add(id, name, kind);
        self.invalidate();
        id
    }

    pub fn set_child(&mut self, parent: FrameId, child: FrameId) -> Result<(), ConfigError> {
        self.invalidate();
        self.topology.tree.set_child(parent, child)
    }

    /// Mass assumed for an invisible frame by the mass-setting jigsaws.
    pub fn set_invisible_mass(&mut self, frame: FrameId, mass: f64) -> Result<(), ConfigError> {
        self.topology.tree.set_mass(frame, mass)
    }

    pub fn frame(&self, id: FrameId) -> Result<&Frame, ConfigError> {
        self.topology.tree.frame(id)
    }

    // ---- Groups ----

    /// Create a group and its root state.
    pub fn add_group(&mut self, name: &str, kind: GroupKind) -> GroupId {
        let id = GroupId(self.keys.issue());
        let state = StateId(self.keys.issue());
        self.states
            .insert(State::new(state, StateOwner::Group(id), kind.element_kind()));
        self.topology.groups.insert(id, Group::new(id, name, kind, state));
        self.invalidate();
        id
    }

    pub fn group(&self, id: GroupId) -> Result<&Group, ConfigError> {
        self.topology
            .group(id)
            .ok_or_else(|| ConfigError::UnknownGroup(id.to_string()))
    }

    pub fn add_frame_to_group(&mut self, group: GroupId, frame: FrameId) -> Result<(), ConfigError> {
        let g = self.group(group)?;
        let f = self.topology.tree.frame(frame)?;
        let expected = g.kind().frame_kind();
        if f.kind() != expected {
            return Err(ConfigError::WrongFrameKind {
                frame: f.name().to_string(),
                actual: f.kind().name(),
                expected: expected.name(),
            });
        }
        match f.group() {
            Some(existing) if existing == group => return Ok(()),
            Some(existing) => {
                return Err(ConfigError::FrameAlreadyGrouped {
                    frame: f.name().to_string(),
                    group: self.topology.group(existing).map_or_else(|| existing.to_string(), |g| g.name().to_string()),
                })
            }
            None => {}
        }

        self.topology.tree.frame_mut(frame)?.group = Some(group);
        self.topology.groups[group].add_frame(frame);
        self.invalidate();
        Ok(())
    }

    // ---- Jigsaws ----

    /// Register `jigsaw` to `group` and create its child states.
    pub fn add_jigsaw<J: Jigsaw + 'static>(&mut self, group: GroupId, jigsaw: J) -> Result<JigsawId, ConfigError> {
        self.add_boxed_jigsaw(group, Box::new(jigsaw))
    }

    pub fn add_boxed_jigsaw(&mut self, group: GroupId, mut jigsaw: Box<dyn Jigsaw>) -> Result<JigsawId, ConfigError> {
        self.check_group_accepts(group, jigsaw.as_ref())?;

        let id = JigsawId(self.keys.issue());
        let kind = jigsaw.child_state_kind();
        let mut child_states = Vec::with_capacity(jigsaw.n_children());
        for i in 0..jigsaw.n_children() {
            let state = StateId(self.keys.issue());
            self.states.insert(State::new(state, StateOwner::Jigsaw(id, i), kind));
            child_states.push(state);
        }
        jigsaw.core_mut().set_child_states(child_states);
        jigsaw.core_mut().set_group(Some(group));

        self.topology.groups[group].add_jigsaw(id);
        self.topology.jigsaws.insert(id, jigsaw);
        self.invalidate();
        Ok(id)
    }

    pub fn jigsaw(&self, id: JigsawId) -> Result<&dyn Jigsaw, ConfigError> {
        self.topology
            .jigsaw(id)
            .ok_or_else(|| ConfigError::UnknownJigsaw(id.to_string()))
    }

    fn jigsaw_mut(&mut self, id: JigsawId) -> Result<&mut Box<dyn Jigsaw>, ConfigError> {
        self.topology
            .jigsaws
            .get_mut(id)
            .ok_or_else(|| ConfigError::UnknownJigsaw(id.to_string()))
    }

    fn check_group_accepts(&self, group: GroupId, jigsaw: &dyn Jigsaw) -> Result<(), ConfigError> {
        let g = self.group(group)?;
        match (jigsaw.kind(), g.kind()) {
            (JigsawKind::Combinatoric, GroupKind::Invisible) | (JigsawKind::Invisible, GroupKind::Combinatoric) => {
                Err(ConfigError::WrongGroupKind {
                    group: g.name().to_string(),
                    actual: g.kind().name(),
                    expected: jigsaw.kind().name(),
                })
            }
            _ => Ok(()),
        }
    }

    fn check_child_index(jigsaw: &dyn Jigsaw, i: usize) -> Result<(), ConfigError> {
        if i >= jigsaw.n_children() {
            return Err(ConfigError::ChildIndexOutOfRange {
                jigsaw: jigsaw.name().to_string(),
                index: i,
                n_children: jigsaw.n_children(),
            });
        }
        Ok(())
    }

    /// Move a jigsaw to another group. Its frame wiring is forgotten.
    pub fn set_jigsaw_group(&mut self, jigsaw: JigsawId, group: GroupId) -> Result<(), ConfigError> {
        self.check_group_accepts(group, self.jigsaw(jigsaw)?)?;
        if let Some(old) = self.jigsaw(jigsaw)?.core().group() {
            if let Some(g) = self.topology.groups.get_mut(old) {
                g.remove_jigsaw(jigsaw);
            }
        }
        self.jigsaw_mut(jigsaw)?.core_mut().set_group(Some(group));
        self.topology.groups[group].add_jigsaw(jigsaw);
        self.invalidate();
        Ok(())
    }

    /// Attach `frame` to child slot `i` of `jigsaw`.
    ///
    /// Every leaf at or below `frame` is considered. Leaves in the jigsaw's
    /// group become child frames (and are read by the rule for that child);
    /// other leaves are only read.
    pub fn add_jigsaw_frame(&mut self, jigsaw: JigsawId, frame: FrameId, i: usize) -> Result<(), ConfigError> {
        self.attach_frame(jigsaw, frame, i, true)
    }

    pub fn add_jigsaw_frames(&mut self, jigsaw: JigsawId, frames: &[FrameId], i: usize) -> Result<(), ConfigError> {
        for &frame in frames {
            self.add_jigsaw_frame(jigsaw, frame, i)?;
        }
        Ok(())
    }

    /// Let the rule for child `i` read `frame` without distributing it.
    pub fn add_dependency_frame(&mut self, jigsaw: JigsawId, frame: FrameId, i: usize) -> Result<(), ConfigError> {
        self.attach_frame(jigsaw, frame, i, false)
    }

    fn attach_frame(&mut self, jigsaw: JigsawId, frame: FrameId, i: usize, as_child: bool) -> Result<(), ConfigError> {
        self.topology.tree.frame(frame)?;
        Self::check_child_index(self.jigsaw(jigsaw)?, i)?;
        let tree = &self.topology.tree;
        let jig = self
            .topology
            .jigsaws
            .get_mut(jigsaw)
            .ok_or_else(|| ConfigError::UnknownJigsaw(jigsaw.to_string()))?;
        let group = jig.core().group();
        for leaf in tree.leaf_frames_under(frame).iter() {
            let in_group = group.is_some() && tree.get(leaf).and_then(|f| f.group()) == group;
            if as_child && in_group {
                jig.core_mut().add_child_frame(leaf, i);
            } else {
                jig.core_mut().add_dependency_frame(leaf, i);
            }
        }
        self.invalidate();
        Ok(())
    }

    /// Detach every leaf at or below `frame` from `jigsaw`. Returns true if
    /// anything was attached.
    pub fn remove_jigsaw_frame(&mut self, jigsaw: JigsawId, frame: FrameId) -> Result<bool, ConfigError> {
        let leaves = self.topology.tree.leaf_frames_under(frame);
        let core = self.jigsaw_mut(jigsaw)?.core_mut();
        let mut removed = false;
        for leaf in leaves.iter() {
            removed |= core.remove_frame(leaf);
        }
        self.invalidate();
        Ok(removed)
    }

    /// Require the child holding `frame` to receive at least `n` objects, or
    /// exactly `n` when `exclusive`.
    pub fn set_n_elements_for_frame(
        &mut self,
        jigsaw: JigsawId,
        frame: FrameId,
        n: usize,
        exclusive: bool,
    ) -> Result<(), ConfigError> {
        let jig = self.jigsaw(jigsaw)?;
        if jig.kind() != JigsawKind::Combinatoric {
            return Err(ConfigError::WrongJigsawKind {
                jigsaw: jig.name().to_string(),
                actual: jig.kind().name(),
                expected: JigsawKind::Combinatoric.name(),
            });
        }
        let child = self
            .topology
            .tree
            .leaf_frames_under(frame)
            .iter()
            .find_map(|leaf| jig.core().child_index_of(leaf))
            .ok_or_else(|| ConfigError::UnsoundJigsaw {
                jigsaw: jig.name().to_string(),
                reason: format!("frame {} is not one of its children", self.topology.tree.name(frame)),
            })?;
        self.jigsaw_mut(jigsaw)?
            .core_mut()
            .set_child_requirement(child, ChildRequirement::new(n, exclusive));
        self.invalidate();
        Ok(())
    }

    /// True if `jigsaw` can only run after `other`.
    pub fn depends_on(&self, jigsaw: JigsawId, other: JigsawId) -> bool {
        schedule::depends_on(&self.topology.jigsaws, jigsaw, other)
    }

    pub fn execution_list(&self) -> &ObjectList<JigsawId> {
        self.topology.execution_list()
    }

    // ---- Setup ----

    /// Check the configuration and prepare it for event analysis.
    ///
    /// Must be called after the last configuration change and before the
    /// first event. On error the context stays uninitialized.
    pub fn initialize_analysis(&mut self) -> Result<(), ConfigError> {
        self.invalidate();
        if let Err(err) = self.topology.initialize(&mut self.keys, &mut self.states) {
            warn!(error = %err, "analysis initialization failed");
            return Err(err);
        }
        self.initialized = true;
        Ok(())
    }

    fn require_initialized(&self) -> Result<(), ConfigError> {
        if self.initialized {
            Ok(())
        } else {
            Err(ConfigError::NotInitialized)
        }
    }

    // ---- Events ----

    /// Empty every state before the next event's inputs are added.
    pub fn clear_event(&mut self) {
        self.states.clear_all();
        self.last_event = None;
    }

    /// Add a measured object to a combinatoric group. Returns its index.
    pub fn add_input(&mut self, group: GroupId, p4: FourVector) -> Result<usize, ConfigError> {
        self.require_initialized()?;
        let state = self.group_state_of_kind(group, GroupKind::Combinatoric)?;
        let state = &mut self.states[state];
        let index = state.len();
        state.add_element(Element::visible(p4, index));
        self.last_event = None;
        Ok(index)
    }

    /// Set the unmeasured momentum shared by an invisible group. Its mass
    /// starts at zero and is fixed by the group's jigsaws.
    pub fn set_invisible_momentum(&mut self, group: GroupId, momentum: ThreeVector) -> Result<(), ConfigError> {
        self.require_initialized()?;
        let state = self.group_state_of_kind(group, GroupKind::Invisible)?;
        self.states[state].set_four_vector(FourVector::from_momentum_mass(momentum, 0.0));
        self.last_event = None;
        Ok(())
    }

    /// Set the momentum of a visible frame that belongs to no group.
    pub fn set_frame_four_vector(&mut self, frame: FrameId, p4: FourVector) -> Result<(), ConfigError> {
        self.require_initialized()?;
        let f = self.topology.tree.frame(frame)?;
        let state = self
            .topology
            .standalone_state(frame)
            .ok_or_else(|| ConfigError::WrongFrameKind {
                frame: f.name().to_string(),
                actual: if f.group().is_some() { "grouped" } else { f.kind().name() },
                expected: "ungrouped visible",
            })?;
        self.states[state].set_four_vector(p4);
        self.last_event = None;
        Ok(())
    }

    fn group_state_of_kind(&self, group: GroupId, kind: GroupKind) -> Result<StateId, ConfigError> {
        let g = self.group(group)?;
        if g.kind() != kind {
            return Err(ConfigError::WrongGroupKind {
                group: g.name().to_string(),
                actual: g.kind().name(),
                expected: kind.name(),
            });
        }
        Ok(g.group_state())
    }

    /// Resolve the current event by running every jigsaw in execution order.
    pub fn analyze_event(&mut self) -> Result<(), ResolveFailure> {
        let outcome = if self.initialized {
            engine::run_event(&self.topology, &mut self.states, &mut self.statistics)
        } else {
            let failure = ResolveFailure::NotInitialized;
            self.statistics.record_failure(&failure);
            warn!(reason = %failure, "event not resolved");
            Err(failure)
        };
        self.last_event = Some(outcome.clone());
        outcome
    }

    fn require_resolved(&self) -> Result<(), ResolveFailure> {
        match &self.last_event {
            Some(outcome) => outcome.clone(),
            None if !self.initialized => Err(ResolveFailure::NotInitialized),
            None => Err(ResolveFailure::EventNotAnalyzed),
        }
    }

    /// Reconstructed four-vector of `frame` in the lab, the sum of its leaves.
    pub fn frame_four_vector(&self, frame: FrameId) -> Result<FourVector, ResolveFailure> {
        self.require_resolved()?;
        let leaves = self.topology.tree.leaf_frames_under(frame);
        if leaves.is_empty() {
            return Err(ResolveFailure::MissingInput {
                source_name: self.topology.tree.name(frame),
            });
        }
        Ok(leaves
            .iter()
            .filter_map(|leaf| self.topology.leaf_state(leaf))
            .map(|state| self.states[state].four_vector())
            .sum())
    }

    /// Four-vector of `frame` seen from the rest frame of `rest_frame`.
    pub fn frame_four_vector_in(&self, frame: FrameId, rest_frame: FrameId) -> Result<FourVector, ResolveFailure> {
        let p = self.frame_four_vector(frame)?;
        if self.topology.tree.get(rest_frame).map(|f| f.kind()) == Some(FrameKind::Lab) {
            return Ok(p);
        }
        let rest = self.frame_four_vector(rest_frame)?;
        if !rest.is_timelike() {
            return Err(ResolveFailure::DegenerateKinematics {
                jigsaw: self.topology.tree.name(rest_frame),
                reason: "frame has no rest frame",
            });
        }
        Ok(p.in_rest_frame_of(rest))
    }

    pub fn frame_mass(&self, frame: FrameId) -> Result<f64, ResolveFailure> {
        Ok(self.frame_four_vector(frame)?.m())
    }
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
