// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Decay tree of reconstruction frames.
//!
//! The tree is the fixed topology an analysis reconstructs:
//! - one Lab frame at the root, with exactly one child
//! - Decay frames, each with at least one child
//! - Visible and Invisible leaf frames, which hold measured objects and
//!   unmeasured momenta respectively
//!
//! Frames refer to each other (and to their group) by handle only; the
//! tree owns the frames.

use crate::error::ConfigError;
use crate::group::GroupId;
use crate::key::{keyed_id, Arena};
use crate::list::ObjectList;
use strum_macros::IntoStaticStr;

keyed_id!(
    /// Handle of a frame in a [`FrameTree`].
    FrameId
);

/// Role of a frame in the decay tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum FrameKind {
    Lab,
    Decay,
    Visible,
    Invisible,
}

impl FrameKind {
    pub fn is_leaf(self) -> bool {
        matches!(self, FrameKind::Visible | FrameKind::Invisible)
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// A node of the decay tree.
#[derive(Debug, Clone)]
pub struct Frame {
    id: FrameId,
    name: String,
    kind: FrameKind,
    parent: Option<FrameId>,
    children: ObjectList<FrameId>,
    pub(crate) group: Option<GroupId>,
    mass: f64,
}

impl Frame {
    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn parent(&self) -> Option<FrameId> {
        self.parent
    }

    pub fn children(&self) -> &ObjectList<FrameId> {
        &self.children
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    /// Mass assumed for an invisible frame (0 unless configured).
    pub fn mass(&self) -> f64 {
        self.mass
    }
}

/// Owner of all frames of one analysis.
#[derive(Debug, Default)]
pub struct FrameTree {
    frames: Arena<FrameId, Frame>,
}

impl FrameTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, id: FrameId, name: &str, kind: FrameKind) {
        self.frames.insert(
            id,
            Frame {
                id,
                name: String::from(name),
                kind,
                parent: None,
                children: ObjectList::new(),
                group: None,
                mass: 0.0,
            },
        );
    }

    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id)
    }

    pub fn frame(&self, id: FrameId) -> Result<&Frame, ConfigError> {
        self.frames
            .get(id)
            .ok_or_else(|| ConfigError::UnknownFrame(id.to_string()))
    }

    pub(crate) fn frame_mut(&mut self, id: FrameId) -> Result<&mut Frame, ConfigError> {
        self.frames
            .get_mut(id)
            .ok_or_else(|| ConfigError::UnknownFrame(id.to_string()))
    }

    /// Frame name, or the handle when the frame is unknown.
    pub fn name(&self, id: FrameId) -> String {
        self.frames
            .get(id)
            .map(|frame| frame.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn names(&self, frames: &ObjectList<FrameId>) -> Vec<String> {
        frames.iter().map(|f| self.name(f)).collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = FrameId> + '_ {
        self.frames.ids()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Attach `child` below `parent`.
    pub(crate) fn set_child(&mut self, parent: FrameId, child: FrameId) -> Result<(), ConfigError> {
        let parent_frame = self.frame(parent)?;
        if parent_frame.kind.is_leaf() {
            return Err(ConfigError::WrongFrameKind {
                frame: parent_frame.name.clone(),
                actual: parent_frame.kind.name(),
                expected: "lab or decay",
            });
        }
        let child_frame = self.frame(child)?;
        if child_frame.kind == FrameKind::Lab {
            return Err(ConfigError::WrongFrameKind {
                frame: child_frame.name.clone(),
                actual: child_frame.kind.name(),
                expected: "decay, visible or invisible",
            });
        }
        if let Some(existing) = child_frame.parent {
            return Err(ConfigError::FrameAlreadyParented {
                frame: child_frame.name.clone(),
                parent: self.name(existing),
            });
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(ConfigError::UnsoundTree {
                frame: self.name(child),
                reason: String::from("attaching it would create a cycle"),
            });
        }

        self.frame_mut(child)?.parent = Some(parent);
        self.frame_mut(parent)?.children.add(child);
        Ok(())
    }

    pub(crate) fn set_mass(&mut self, id: FrameId, mass: f64) -> Result<(), ConfigError> {
        let frame = self.frame_mut(id)?;
        if frame.kind != FrameKind::Invisible {
            return Err(ConfigError::WrongFrameKind {
                frame: frame.name.clone(),
                actual: frame.kind.name(),
                expected: "invisible",
            });
        }
        frame.mass = mass.max(0.0);
        Ok(())
    }

    /// True if `ancestor` lies on the parent chain of `frame`.
    pub fn is_ancestor(&self, ancestor: FrameId, frame: FrameId) -> bool {
        let mut current = self.get(frame).and_then(|f| f.parent);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.len() {
                return false;
            }
            current = self.get(id).and_then(|f| f.parent);
        }
        false
    }

    /// Visible and invisible leaves at or below `frame`, depth first.
    pub fn leaf_frames_under(&self, frame: FrameId) -> ObjectList<FrameId> {
        let mut leaves = ObjectList::new();
        let mut stack = vec![frame];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            if node.kind.is_leaf() {
                leaves.add(id);
            } else {
                stack.extend(node.children.as_slice().iter().rev().copied());
            }
        }
        leaves
    }

    pub fn lab_frame(&self) -> Option<FrameId> {
        self.frames
            .iter()
            .find(|(_, frame)| frame.kind == FrameKind::Lab)
            .map(|(id, _)| id)
    }

    /// Check the tree is internally consistent: one lab frame with a single
    /// child, every other frame reachable from it, no childless decay frame.
    pub fn validate(&self) -> Result<FrameId, ConfigError> {
        let labs: Vec<FrameId> = self
            .frames
            .iter()
            .filter(|(_, frame)| frame.kind == FrameKind::Lab)
            .map(|(id, _)| id)
            .collect();
        let lab = match labs.as_slice() {
            [lab] => *lab,
            [] => {
                return Err(ConfigError::UnsoundTree {
                    frame: String::from("<none>"),
                    reason: String::from("no lab frame"),
                })
            }
            [_, second, ..] => {
                return Err(ConfigError::UnsoundTree {
                    frame: self.name(*second),
                    reason: String::from("more than one lab frame"),
                })
            }
        };

        let lab_frame = self.frame(lab)?;
        if lab_frame.children.len() != 1 {
            return Err(ConfigError::UnsoundTree {
                frame: lab_frame.name.clone(),
                reason: format!("lab frame needs exactly one child, has {}", lab_frame.children.len()),
            });
        }

        for (id, frame) in self.frames.iter() {
            if frame.kind == FrameKind::Decay && frame.children.is_empty() {
                return Err(ConfigError::UnsoundTree {
                    frame: frame.name.clone(),
                    reason: String::from("decay frame has no children"),
                });
            }
            if id != lab && !self.is_ancestor(lab, id) {
                return Err(ConfigError::UnsoundTree {
                    frame: frame.name.clone(),
                    reason: String::from("not connected to the lab frame"),
                });
            }
        }
        Ok(lab)
    }
}
