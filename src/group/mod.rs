// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Groups of jointly ambiguous frames.
//!
//! A Group collects the leaf frames whose momentum content is ambiguous as a
//! whole: all visible frames sharing a pool of measured objects
//! (combinatoric groups), or all invisible frames sharing the unmeasured
//! momentum of an event (invisible groups).
//!
//! Each group owns a root state holding the event inputs. During setup the
//! group's jigsaws are chained below that root: each state is taken as
//! parent by one of the unused jigsaws whose parent frames equal its frames,
//! and that jigsaw's child states join the queue. When several qualify, the
//! ones passing the state through unsplit go first, so the result does not
//! depend on the order jigsaws were added. The group is covered when every state left over
//! describes a single frame.

use crate::error::ConfigError;
use crate::jigsaw::{Jigsaw, JigsawCore, JigsawId};
use crate::key::{keyed_id, Arena};
use crate::list::ObjectList;
use crate::state::{ElementKind, StateId, StateStore};
use crate::tree::{FrameId, FrameKind, FrameTree};
use std::collections::VecDeque;
use strum_macros::IntoStaticStr;

keyed_id!(
    /// Handle of a group.
    GroupId
);

/// The kind of ambiguity a group resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum GroupKind {
    /// Measured objects to distribute among visible frames.
    Combinatoric,
    /// Unmeasured momentum to distribute among invisible frames.
    Invisible,
}

impl GroupKind {
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn frame_kind(self) -> FrameKind {
        match self {
            GroupKind::Combinatoric => FrameKind::Visible,
            GroupKind::Invisible => FrameKind::Invisible,
        }
    }

    pub fn element_kind(self) -> ElementKind {
        match self {
            GroupKind::Combinatoric => ElementKind::Visible,
            GroupKind::Invisible => ElementKind::Invisible,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    id: GroupId,
    name: String,
    kind: GroupKind,
    frames: ObjectList<FrameId>,
    jigsaws: ObjectList<JigsawId>,
    group_state: StateId,
}

impl Group {
    pub(crate) fn new(id: GroupId, name: &str, kind: GroupKind, group_state: StateId) -> Self {
        Self {
            id,
            name: String::from(name),
            kind,
            frames: ObjectList::new(),
            jigsaws: ObjectList::new(),
            group_state,
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn frames(&self) -> &ObjectList<FrameId> {
        &self.frames
    }

    pub fn contains_frame(&self, frame: FrameId) -> bool {
        self.frames.contains(&frame)
    }

    /// Jigsaws registered to this group, in registration order.
    pub fn jigsaws(&self) -> &ObjectList<JigsawId> {
        &self.jigsaws
    }

    /// Root state, filled from the event inputs.
    pub fn group_state(&self) -> StateId {
        self.group_state
    }

    pub(crate) fn add_frame(&mut self, frame: FrameId) -> bool {
        self.frames.add(frame)
    }

    pub(crate) fn add_jigsaw(&mut self, jigsaw: JigsawId) -> bool {
        self.jigsaws.add(jigsaw)
    }

    pub(crate) fn remove_jigsaw(&mut self, jigsaw: JigsawId) {
        self.jigsaws.remove(&jigsaw);
    }
}

/// Result of chaining a group's jigsaws below its root state.
#[derive(Debug, Default)]
pub(crate) struct Coverage {
    /// Parent state of each jigsaw of the group.
    pub parents: Vec<(JigsawId, StateId)>,
    /// Final single-frame state of each frame of the group.
    pub leaves: Vec<(FrameId, StateId)>,
}

/// Order among jigsaws able to resolve the same state: pass-through
/// jigsaws (one child, same frames) before splitting ones, and among
/// pass-through jigsaws those reading fewer frames outside their child first.
/// The last pass-through child is what the splitting jigsaw resolves.
fn resolver_rank(core: &JigsawCore) -> (bool, usize) {
    let pass_through = core.n_children() == 1;
    let external = (0..core.n_children())
        .map(|i| core.dependency_frames(i).size_complement(core.child_frames(i)))
        .sum();
    (!pass_through, external)
}

/// Assign every jigsaw of `group` a parent state and find the final state of
/// each of its frames.
///
/// State frames must already be set: the root state describes all group
/// frames, each jigsaw child state describes its child frames.
pub(crate) fn resolve_coverage(
    group: &Group,
    jigsaws: &Arena<JigsawId, Box<dyn Jigsaw>>,
    states: &StateStore,
    tree: &FrameTree,
) -> Result<Coverage, ConfigError> {
    let mut coverage = Coverage::default();
    let mut unused: Vec<JigsawId> = group.jigsaws.iter().collect();
    let mut queue = VecDeque::from([group.group_state]);

    while let Some(state_id) = queue.pop_front() {
        let frames = states[state_id].frames();
        let resolver = unused
            .iter()
            .enumerate()
            .filter_map(|(pos, &j)| {
                let core = jigsaws.get(j)?.core();
                core.can_resolve(frames).then(|| (resolver_rank(core), pos))
            })
            .min()
            .map(|(_, pos)| pos);

        if let Some(pos) = resolver {
            let jigsaw = unused.remove(pos);
            coverage.parents.push((jigsaw, state_id));
            queue.extend(jigsaws[jigsaw].core().child_states().iter());
        } else if let (1, Some(frame)) = (frames.len(), frames.first()) {
            coverage.leaves.push((frame, state_id));
        } else {
            return Err(ConfigError::UncoveredState {
                group: group.name.clone(),
                frames: tree.names(frames),
            });
        }
    }

    if let Some(&jigsaw) = unused.first() {
        return Err(ConfigError::UnusedJigsaw {
            jigsaw: jigsaws
                .get(jigsaw)
                .map(|jig| jig.name().to_string())
                .unwrap_or_else(|| jigsaw.to_string()),
            group: group.name.clone(),
        });
    }
    Ok(coverage)
}
