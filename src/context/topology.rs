// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The fixed part of an analysis.
//!
//! Everything here is decided before the first event and only read while
//! events are analyzed: the decay tree, the groups, the jigsaws with their
//! wiring, and the execution order. [`Topology::initialize`] derives the
//! wiring from what the builder calls recorded.

use crate::config::AnalysisConfig;
use crate::engine::schedule;
use crate::error::ConfigError;
use crate::group::{resolve_coverage, Group, GroupId};
use crate::jigsaw::{Jigsaw, JigsawId, JigsawKind};
use crate::key::{Arena, KeyRegistry};
use crate::list::ObjectList;
use crate::state::{ElementKind, State, StateId, StateOwner, StateStore};
use crate::tree::{FrameId, FrameKind, FrameTree};
use rustc_hash::FxHashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Topology {
    config: AnalysisConfig,
    pub(crate) tree: FrameTree,
    pub(crate) groups: Arena<GroupId, Group>,
    pub(crate) jigsaws: Arena<JigsawId, Box<dyn Jigsaw>>,
    execution_list: ObjectList<JigsawId>,
    /// Final single-frame state of every leaf frame.
    leaf_states: FxHashMap<FrameId, StateId>,
    /// States of visible frames outside any group.
    standalone: Vec<(FrameId, StateId)>,
}

impl Topology {
    pub(crate) fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn tree(&self) -> &FrameTree {
        &self.tree
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().map(|(_, group)| group)
    }

    pub fn jigsaw(&self, id: JigsawId) -> Option<&dyn Jigsaw> {
        self.jigsaws.get(id).map(|jigsaw| jigsaw.as_ref())
    }

    pub fn jigsaws(&self) -> &Arena<JigsawId, Box<dyn Jigsaw>> {
        &self.jigsaws
    }

    pub fn jigsaw_ids(&self) -> impl Iterator<Item = JigsawId> + '_ {
        self.jigsaws.ids()
    }

    /// Jigsaws in the order they run for each event.
    pub fn execution_list(&self) -> &ObjectList<JigsawId> {
        &self.execution_list
    }

    pub fn leaf_state(&self, frame: FrameId) -> Option<StateId> {
        self.leaf_states.get(&frame).copied()
    }

    pub fn standalone_states(&self) -> impl Iterator<Item = (FrameId, StateId)> + '_ {
        self.standalone.iter().copied()
    }

    pub fn standalone_state(&self, frame: FrameId) -> Option<StateId> {
        self.standalone
            .iter()
            .find(|(f, _)| *f == frame)
            .map(|&(_, state)| state)
    }

    /// Forget everything derived by a previous initialization.
    pub(crate) fn clear_derived(&mut self) {
        self.execution_list.clear();
        self.leaf_states.clear();
        for jigsaw in self.jigsaws.values_mut() {
            jigsaw.core_mut().clear_derived();
        }
    }

    /// Check the configuration and derive the wiring used per event.
    pub(crate) fn initialize(
        &mut self,
        keys: &mut KeyRegistry,
        states: &mut StateStore,
    ) -> Result<(), ConfigError> {
        self.clear_derived();
        self.tree.validate()?;
        self.check_groups()?;
        self.check_jigsaws()?;
        self.create_standalone_states(keys, states);
        self.resolve_groups(states)?;
        self.assign_dependency_states();
        self.assign_dependency_jigsaws(states);
        self.build_execution_list()?;
        self.assign_inline_jigsaws(states);

        debug!(
            jigsaws = self.jigsaws.len(),
            order = ?self
                .execution_list
                .iter()
                .map(|id| self.jigsaws[id].name().to_string())
                .collect::<Vec<_>>(),
            "analysis initialized"
        );
        Ok(())
    }

    fn check_groups(&self) -> Result<(), ConfigError> {
        for group in self.groups() {
            if group.frames().is_empty() {
                return Err(ConfigError::EmptyGroup(group.name().to_string()));
            }
        }
        for id in self.tree.ids() {
            let frame = self.tree.frame(id)?;
            if frame.kind() == FrameKind::Invisible && frame.group().is_none() {
                return Err(ConfigError::UnsoundTree {
                    frame: frame.name().to_string(),
                    reason: String::from("invisible frame is not in any group"),
                });
            }
        }
        Ok(())
    }

    fn check_jigsaws(&self) -> Result<(), ConfigError> {
        for (_, jigsaw) in self.jigsaws.iter() {
            let group = jigsaw.core().group().and_then(|g| self.groups.get(g));
            jigsaw
                .core()
                .is_sound_body(group)
                .map_err(|reason| ConfigError::UnsoundJigsaw {
                    jigsaw: jigsaw.name().to_string(),
                    reason,
                })?;
        }
        Ok(())
    }

    fn create_standalone_states(&mut self, keys: &mut KeyRegistry, states: &mut StateStore) {
        let tree = &self.tree;
        self.standalone
            .retain(|&(frame, _)| tree.get(frame).is_some_and(|f| f.group().is_none()));
        for id in self.tree.ids().collect::<Vec<_>>() {
            let ungrouped_visible = self
                .tree
                .get(id)
                .is_some_and(|f| f.kind() == FrameKind::Visible && f.group().is_none());
            if ungrouped_visible && self.standalone_state(id).is_none() {
                let state_id = StateId(keys.issue());
                let mut state = State::new(state_id, StateOwner::Standalone(id), ElementKind::Visible);
                state.set_frames(ObjectList::from(id));
                states.insert(state);
                self.standalone.push((id, state_id));
            }
        }
        for &(frame, state) in &self.standalone {
            self.leaf_states.insert(frame, state);
        }
    }

    fn resolve_groups(&mut self, states: &mut StateStore) -> Result<(), ConfigError> {
        for (_, group) in self.groups.iter() {
            states[group.group_state()].set_frames(group.frames().clone());
        }
        for (id, jigsaw) in self.jigsaws.iter() {
            let core = jigsaw.core();
            for i in 0..core.n_children() {
                let state = core.child_state(i);
                debug_assert_eq!(states[state].owner(), StateOwner::Jigsaw(id, i));
                states[state].set_frames(core.child_frames(i).clone());
            }
        }

        let mut parents = Vec::new();
        for (_, group) in self.groups.iter() {
            let coverage = resolve_coverage(group, &self.jigsaws, states, &self.tree)?;
            parents.extend(coverage.parents);
            self.leaf_states.extend(coverage.leaves);
        }
        for (jigsaw, state) in parents {
            self.jigsaws[jigsaw].core_mut().set_parent_state(state);
        }
        Ok(())
    }

    fn assign_dependency_states(&mut self) {
        let leaf_states = &self.leaf_states;
        for jigsaw in self.jigsaws.values_mut() {
            let reads_own_children = jigsaw.kind() != JigsawKind::Invisible;
            let core = jigsaw.core();
            let lists: Vec<ObjectList<StateId>> = (0..core.n_children())
                .map(|i| {
                    let mut list = ObjectList::new();
                    for frame in core.dependency_frames(i).iter() {
                        match core.child_index_of(frame) {
                            Some(k) if reads_own_children => {
                                list.add(core.child_state(k));
                            }
                            Some(_) => {}
                            None => {
                                if let Some(&state) = leaf_states.get(&frame) {
                                    list.add(state);
                                }
                            }
                        }
                    }
                    list
                })
                .collect();
            for (i, list) in lists.into_iter().enumerate() {
                jigsaw.core_mut().set_dependency_states(i, list);
            }
        }
    }

    fn assign_dependency_jigsaws(&mut self, states: &StateStore) {
        let edges: Vec<(JigsawId, ObjectList<JigsawId>)> = self
            .jigsaws
            .ids()
            .map(|id| (id, schedule::dependency_jigsaws(&self.jigsaws, states, id)))
            .collect();
        for (id, deps) in edges {
            self.jigsaws[id].core_mut().set_dependency_jigsaws(deps);
        }
    }

    fn build_execution_list(&mut self) -> Result<(), ConfigError> {
        let mut execution_list = ObjectList::new();
        for id in self.jigsaws.ids() {
            schedule::initialize_execution_list(&self.jigsaws, id, &mut execution_list)?;
        }
        self.execution_list = execution_list;
        Ok(())
    }

    fn assign_inline_jigsaws(&mut self, states: &StateStore) {
        let inline: Vec<(JigsawId, ObjectList<JigsawId>)> = self
            .jigsaws
            .ids()
            .map(|id| {
                (
                    id,
                    schedule::inline_jigsaws(&self.jigsaws, states, &self.execution_list, id),
                )
            })
            .collect();
        for (id, list) in inline {
            self.jigsaws[id].core_mut().set_inline_jigsaws(list);
        }
    }
}
