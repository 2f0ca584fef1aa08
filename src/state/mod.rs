// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Per-event states (the mutable tier of an analysis).
//!
//! A State is the current knowledge about the momentum content of a set of
//! frames: an ordered list of elements (measured visible objects, or
//! reconstructed invisible momenta). States are created once, when the
//! topology is fixed, and their element lists are cleared and refilled for
//! every event without reallocating.
//!
//! All states of one analysis live in a [`StateStore`]; groups and jigsaws
//! refer to them by [`StateId`].

pub mod statistics;

use crate::group::GroupId;
use crate::jigsaw::JigsawId;
use crate::key::{keyed_id, Arena};
use crate::kinematics::FourVector;
use crate::list::ObjectList;
use crate::tree::FrameId;
use std::ops::{Index, IndexMut};

keyed_id!(
    /// Handle of a state in a [`StateStore`].
    StateId
);

/// Whether an element was measured or reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Visible,
    Invisible,
}

/// One momentum carried by a state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    pub p4: FourVector,
    /// Position of the measured object in its group's input list.
    pub input: Option<usize>,
}

impl Element {
    pub fn visible(p4: FourVector, input: usize) -> Self {
        Self {
            kind: ElementKind::Visible,
            p4,
            input: Some(input),
        }
    }

    pub fn invisible(p4: FourVector) -> Self {
        Self {
            kind: ElementKind::Invisible,
            p4,
            input: None,
        }
    }
}

/// What a state belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateOwner {
    /// The root state of a group, filled from the event inputs.
    Group(GroupId),
    /// An output slot of a jigsaw.
    Jigsaw(JigsawId, usize),
    /// The state of a visible frame outside any group.
    Standalone(FrameId),
}

/// A bag of four-vectors attached to a set of frames.
#[derive(Debug, Clone)]
pub struct State {
    id: StateId,
    owner: StateOwner,
    kind: ElementKind,
    frames: ObjectList<FrameId>,
    elements: Vec<Element>,
}

impl State {
    pub(crate) fn new(id: StateId, owner: StateOwner, kind: ElementKind) -> Self {
        Self {
            id,
            owner,
            kind,
            frames: ObjectList::new(),
            elements: Vec::new(),
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn owner(&self) -> StateOwner {
        self.owner
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Frames whose momentum content this state describes.
    pub fn frames(&self) -> &ObjectList<FrameId> {
        &self.frames
    }

    pub(crate) fn set_frames(&mut self, frames: ObjectList<FrameId>) {
        self.frames = frames;
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Sum of all element four-vectors.
    pub fn four_vector(&self) -> FourVector {
        self.elements.iter().map(|e| e.p4).sum()
    }

    pub fn mass(&self) -> f64 {
        self.four_vector().m()
    }

    /// Empty the element list, keeping its allocation.
    pub fn clear_elements(&mut self) {
        self.elements.clear();
    }

    pub fn add_element(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn add_elements(&mut self, elements: &[Element]) {
        self.elements.extend_from_slice(elements);
    }

    /// Replace the content by a single element of this state's kind.
    pub fn set_four_vector(&mut self, p4: FourVector) {
        self.elements.clear();
        self.elements.push(Element {
            kind: self.kind,
            p4,
            input: None,
        });
    }
}

/// Owner of every state of one analysis.
#[derive(Debug, Default)]
pub struct StateStore {
    states: Arena<StateId, State>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, state: State) {
        self.states.insert(state.id, state);
    }

    pub fn get(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states.ids()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Sum of the four-vectors of `states`.
    pub fn four_vector(&self, states: &ObjectList<StateId>) -> FourVector {
        states.iter().map(|s| self[s].four_vector()).sum()
    }

    /// Exchange the element lists of two states.
    pub fn swap_elements(&mut self, a: StateId, b: StateId) {
        if a == b {
            return;
        }
        let taken = std::mem::take(&mut self[a].elements);
        let other = std::mem::replace(&mut self[b].elements, taken);
        self[a].elements = other;
    }

    /// Clear every state, keeping allocations.
    pub fn clear_all(&mut self) {
        for state in self.states.values_mut() {
            state.elements.clear();
        }
    }
}

impl Index<StateId> for StateStore {
    type Output = State;

    fn index(&self, id: StateId) -> &State {
        &self.states[id]
    }
}

impl IndexMut<StateId> for StateStore {
    fn index_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[id]
    }
}
