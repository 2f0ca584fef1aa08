// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Jigsaw trait and the bookkeeping shared by every jigsaw.
//!
//! A jigsaw resolves one ambiguity: it takes the momentum content of a
//! parent state and splits it into one state per child, according to a
//! rule. Concrete jigsaws implement the rule in
//! [`analyze_event`](Jigsaw::analyze_event); everything else (which frames
//! each child describes, which states the rule may read, which jigsaws must
//! run first) lives in a [`JigsawCore`] and is filled in by the
//! [`AnalysisContext`](crate::context::AnalysisContext) during setup.
//!
//! # Lifecycle
//!
//! 1. A jigsaw is created detached, with a name and a number of children.
//! 2. It is registered to a group; its child states are created then.
//! 3. Frames are attached to child slots (`add_jigsaw_frame`).
//! 4. `initialize_analysis` assigns its parent state, dependency states,
//!    ordering edges and, for combinatoric jigsaws, the inline list.
//! 5. For every event, `analyze_event` reads the parent and dependency
//!    states and writes the child states.
//!
//! # Example
//!
//! ```
//! use jigsaw_reco::engine::EventContext;
//! use jigsaw_reco::error::ResolveFailure;
//! use jigsaw_reco::jigsaw::{Jigsaw, JigsawCore};
//!
//! /// Put every object in the first child.
//! #[derive(Debug)]
//! struct AllInFirst {
//!     core: JigsawCore,
//! }
//!
//! impl Jigsaw for AllInFirst {
//!     fn core(&self) -> &JigsawCore {
//!         &self.core
//!     }
//!
//!     fn core_mut(&mut self) -> &mut JigsawCore {
//!         &mut self.core
//!     }
//!
//!     fn analyze_event(&self, ctx: &mut EventContext<'_>) -> Result<(), ResolveFailure> {
//!         let elements = ctx.parent_elements(&self.core)?;
//!         let first = self.core.child_state(0);
//!         ctx.states_mut()[first].clear_elements();
//!         ctx.states_mut()[first].add_elements(&elements);
//!         Ok(())
//!     }
//! }
//!
//! let jigsaw = AllInFirst { core: JigsawCore::new("AllInFirst", 2) };
//! assert_eq!(jigsaw.n_children(), 2);
//! assert_eq!(jigsaw.name(), "AllInFirst");
//! ```

pub mod combinatoric;
pub mod invisible;
pub mod min_masses;

pub use combinatoric::{CombinatoricJigsaw, CombinatoricMetric, MinMassSum, TwoBodyMomentum};
pub use invisible::{ContraBoostInvJigsaw, SetMassInvJigsaw, SetRapidityInvJigsaw};
pub use min_masses::{min_masses_partition, MinMassesCombJigsaw, Partition};

use crate::engine::EventContext;
use crate::error::ResolveFailure;
use crate::group::{Group, GroupId};
use crate::key::keyed_id;
use crate::list::ObjectList;
use crate::state::{ElementKind, StateId};
use crate::tree::FrameId;
use std::fmt::Debug;
use strum_macros::IntoStaticStr;

keyed_id!(
    /// Handle of a registered jigsaw.
    JigsawId
);

/// Broad family of a jigsaw, which decides its scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum JigsawKind {
    /// A rule with no special scheduling.
    Vanilla,
    /// Distributes unmeasured momentum among invisible frames.
    Invisible,
    /// Distributes measured objects among visible frames.
    Combinatoric,
}

impl JigsawKind {
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// How many objects a combinatoric child must receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRequirement {
    /// Minimum number of objects.
    pub min: usize,
    /// When set, the child receives exactly `min` objects.
    pub exclusive: bool,
}

impl ChildRequirement {
    pub const fn new(min: usize, exclusive: bool) -> Self {
        Self { min, exclusive }
    }

    pub fn accepts(&self, count: usize) -> bool {
        if self.exclusive {
            count == self.min
        } else {
            count >= self.min
        }
    }
}

impl Default for ChildRequirement {
    fn default() -> Self {
        Self::new(1, false)
    }
}

/// Wiring shared by all jigsaws.
///
/// Index `i` always runs over child slots, `0..n_children()`. Accessors
/// taking a child index panic when it is out of range, like slice indexing.
#[derive(Debug, Clone)]
pub struct JigsawCore {
    name: String,
    n_children: usize,
    group: Option<GroupId>,
    parent_state: Option<StateId>,
    child_states: Vec<StateId>,
    child_frames: Vec<ObjectList<FrameId>>,
    dependency_frames: Vec<ObjectList<FrameId>>,
    dependency_states: Vec<ObjectList<StateId>>,
    child_requirements: Vec<ChildRequirement>,
    dependency_jigsaws: ObjectList<JigsawId>,
    inline_jigsaws: ObjectList<JigsawId>,
}

impl JigsawCore {
    pub fn new(name: &str, n_children: usize) -> Self {
        Self {
            name: String::from(name),
            n_children,
            group: None,
            parent_state: None,
            child_states: Vec::new(),
            child_frames: vec![ObjectList::new(); n_children],
            dependency_frames: vec![ObjectList::new(); n_children],
            dependency_states: vec![ObjectList::new(); n_children],
            child_requirements: vec![ChildRequirement::default(); n_children],
            dependency_jigsaws: ObjectList::new(),
            inline_jigsaws: ObjectList::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_children(&self) -> usize {
        self.n_children
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    /// Move the jigsaw to `group`, forgetting all frame wiring.
    pub(crate) fn set_group(&mut self, group: Option<GroupId>) {
        self.group = group;
        for i in 0..self.n_children {
            self.child_frames[i].clear();
            self.dependency_frames[i].clear();
        }
        self.clear_derived();
    }

    /// Forget everything computed by setup.
    pub(crate) fn clear_derived(&mut self) {
        self.parent_state = None;
        for states in &mut self.dependency_states {
            states.clear();
        }
        self.dependency_jigsaws.clear();
        self.inline_jigsaws.clear();
    }

    /// State this jigsaw splits, known once the analysis is initialized.
    pub fn parent_state(&self) -> Option<StateId> {
        self.parent_state
    }

    pub(crate) fn set_parent_state(&mut self, state: StateId) {
        self.parent_state = Some(state);
    }

    pub fn child_states(&self) -> &[StateId] {
        &self.child_states
    }

    pub fn child_state(&self, i: usize) -> StateId {
        self.child_states[i]
    }

    pub(crate) fn set_child_states(&mut self, states: Vec<StateId>) {
        self.child_states = states;
    }

    pub fn child_frames(&self, i: usize) -> &ObjectList<FrameId> {
        &self.child_frames[i]
    }

    /// Union of all child frames.
    pub fn parent_frames(&self) -> ObjectList<FrameId> {
        let mut frames = ObjectList::new();
        for child in &self.child_frames {
            frames.add_all(child);
        }
        frames
    }

    pub fn dependency_frames(&self, i: usize) -> &ObjectList<FrameId> {
        &self.dependency_frames[i]
    }

    pub(crate) fn add_child_frame(&mut self, frame: FrameId, i: usize) {
        self.child_frames[i].add(frame);
        self.dependency_frames[i].add(frame);
    }

    pub(crate) fn add_dependency_frame(&mut self, frame: FrameId, i: usize) {
        self.dependency_frames[i].add(frame);
    }

    /// Detach `frame` from every child and dependency list. Returns true if
    /// it was attached anywhere.
    pub(crate) fn remove_frame(&mut self, frame: FrameId) -> bool {
        let mut found = false;
        for list in self.child_frames.iter_mut().chain(self.dependency_frames.iter_mut()) {
            found |= list.remove(&frame).is_some();
        }
        found
    }

    /// Number of dependency state lists, one per child.
    pub fn n_dependency_states(&self) -> usize {
        self.dependency_states.len()
    }

    /// States whose content the rule for child `i` reads.
    pub fn dependency_states(&self, i: usize) -> &ObjectList<StateId> {
        &self.dependency_states[i]
    }

    pub(crate) fn set_dependency_states(&mut self, i: usize, states: ObjectList<StateId>) {
        self.dependency_states[i] = states;
    }

    pub fn child_requirement(&self, i: usize) -> ChildRequirement {
        self.child_requirements[i]
    }

    pub(crate) fn set_child_requirement(&mut self, i: usize, requirement: ChildRequirement) {
        self.child_requirements[i] = requirement;
    }

    /// Index of the child slot holding `frame`.
    pub fn child_index_of(&self, frame: FrameId) -> Option<usize> {
        self.child_frames.iter().position(|frames| frames.contains(&frame))
    }

    /// Jigsaws that must run before this one.
    pub fn dependency_jigsaws(&self) -> &ObjectList<JigsawId> {
        &self.dependency_jigsaws
    }

    pub(crate) fn set_dependency_jigsaws(&mut self, jigsaws: ObjectList<JigsawId>) {
        self.dependency_jigsaws = jigsaws;
    }

    /// Jigsaws re-run, in order, for every candidate this jigsaw evaluates.
    pub fn inline_jigsaws(&self) -> &ObjectList<JigsawId> {
        &self.inline_jigsaws
    }

    pub(crate) fn set_inline_jigsaws(&mut self, jigsaws: ObjectList<JigsawId>) {
        self.inline_jigsaws = jigsaws;
    }

    /// True if this jigsaw splits exactly `frames`.
    pub fn can_resolve(&self, frames: &ObjectList<FrameId>) -> bool {
        !frames.is_empty() && self.parent_frames().is_same(frames)
    }

    /// Check the wiring is usable: every child has frames, children do not
    /// overlap, all child frames belong to the jigsaw's group.
    pub fn is_sound_body(&self, group: Option<&Group>) -> Result<(), String> {
        let Some(group) = group else {
            return Err(String::from("not registered to a group"));
        };
        if self.group != Some(group.id()) {
            return Err(format!("checked against group {} it does not belong to", group.name()));
        }
        if self.n_children == 0 {
            return Err(String::from("has no children"));
        }
        if self.child_states.len() != self.n_children {
            return Err(String::from("child states were never created"));
        }
        for i in 0..self.n_children {
            let frames = &self.child_frames[i];
            if frames.is_empty() {
                return Err(format!("child {} has no frames", i));
            }
            if let Some(frame) = frames.iter().find(|&f| !group.contains_frame(f)) {
                return Err(format!("child {} holds frame {} outside group {}", i, frame, group.name()));
            }
            for j in (i + 1)..self.n_children {
                if frames.size_intersection(&self.child_frames[j]) > 0 {
                    return Err(format!("children {} and {} share frames", i, j));
                }
            }
            let requirement = self.child_requirements[i];
            if requirement.exclusive && requirement.min == 0 {
                return Err(format!("child {} is required to stay empty", i));
            }
        }
        Ok(())
    }
}

/// A rule that resolves one ambiguity of an event.
pub trait Jigsaw: Debug {
    fn core(&self) -> &JigsawCore;

    fn core_mut(&mut self) -> &mut JigsawCore;

    /// Fill the child states for the current event.
    ///
    /// Reads the parent state and the dependency states, writes only this
    /// jigsaw's child states. A failure abandons the event.
    fn analyze_event(&self, ctx: &mut EventContext<'_>) -> Result<(), ResolveFailure>;

    fn kind(&self) -> JigsawKind {
        JigsawKind::Vanilla
    }

    /// Short description of the rule, for diagnostics.
    fn label(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn n_children(&self) -> usize {
        self.core().n_children()
    }

    /// Kind of the elements this jigsaw writes into its children.
    fn child_state_kind(&self) -> ElementKind {
        match self.kind() {
            JigsawKind::Invisible => ElementKind::Invisible,
            JigsawKind::Vanilla | JigsawKind::Combinatoric => ElementKind::Visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupKind;
    use crate::key::KeyRegistry;

    fn frames(keys: &mut KeyRegistry, n: usize) -> Vec<FrameId> {
        (0..n).map(|_| FrameId(keys.issue())).collect()
    }

    #[test]
    fn test_requirement() {
        let at_least_two = ChildRequirement::new(2, false);
        assert!(!at_least_two.accepts(1));
        assert!(at_least_two.accepts(3));
        let exactly_two = ChildRequirement::new(2, true);
        assert!(exactly_two.accepts(2));
        assert!(!exactly_two.accepts(3));
        assert_eq!(ChildRequirement::default(), ChildRequirement::new(1, false));
    }

    #[test]
    fn test_parent_frames_is_union() {
        let mut keys = KeyRegistry::new();
        let f = frames(&mut keys, 3);
        let mut core = JigsawCore::new("J", 2);
        core.add_child_frame(f[0], 0);
        core.add_child_frame(f[1], 1);
        core.add_child_frame(f[2], 1);
        core.add_dependency_frame(f[0], 1);

        assert_eq!(core.parent_frames().as_slice(), &[f[0], f[1], f[2]]);
        assert!(core.can_resolve(&f.iter().rev().copied().collect()));
        assert!(!core.can_resolve(&ObjectList::from(f[0])));
        assert_eq!(core.dependency_frames(1).len(), 3);
        assert_eq!(core.child_index_of(f[2]), Some(1));
    }

    #[test]
    fn test_remove_frame() {
        let mut keys = KeyRegistry::new();
        let f = frames(&mut keys, 2);
        let mut core = JigsawCore::new("J", 2);
        core.add_child_frame(f[0], 0);
        core.add_dependency_frame(f[0], 1);
        core.add_child_frame(f[1], 1);

        assert!(core.remove_frame(f[0]));
        assert!(!core.remove_frame(f[0]));
        assert!(core.child_frames(0).is_empty());
        assert_eq!(core.dependency_frames(1).as_slice(), &[f[1]]);
    }

    #[test]
    fn test_sound_body() {
        let mut keys = KeyRegistry::new();
        let f = frames(&mut keys, 3);
        let gid = GroupId(keys.issue());
        let mut group = Group::new(gid, "G", GroupKind::Combinatoric, StateId(keys.issue()));
        group.add_frame(f[0]);
        group.add_frame(f[1]);

        let mut core = JigsawCore::new("J", 2);
        assert!(core.is_sound_body(None).is_err());
        core.set_group(Some(gid));
        core.set_child_states(vec![StateId(keys.issue()), StateId(keys.issue())]);
        core.add_child_frame(f[0], 0);
        assert!(core.is_sound_body(Some(&group)).is_err());

        core.add_child_frame(f[1], 1);
        assert!(core.is_sound_body(Some(&group)).is_ok());

        core.add_child_frame(f[2], 1);
        assert!(core.is_sound_body(Some(&group)).is_err());
        core.remove_frame(f[2]);

        core.add_child_frame(f[1], 0);
        assert_eq!(
            core.is_sound_body(Some(&group)),
            Err(String::from("children 0 and 1 share frames"))
        );
    }

    #[test]
    fn test_set_group_clears_wiring() {
        let mut keys = KeyRegistry::new();
        let f = frames(&mut keys, 1);
        let mut core = JigsawCore::new("J", 1);
        core.add_child_frame(f[0], 0);
        core.set_parent_state(StateId(keys.issue()));
        core.set_group(Some(GroupId(keys.issue())));
        assert!(core.child_frames(0).is_empty());
        assert!(core.parent_state().is_none());
    }
}
