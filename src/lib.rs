// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Recursive jigsaw reconstruction of particle decays.
//!
//! An analysis describes a decay hypothesis as a tree of reference frames
//! (lab → decays → visible and invisible leaves). Events only measure the
//! visible objects and the missing transverse momentum, which leaves two
//! ambiguities: which measured object belongs to which visible frame, and
//! how the unmeasured momentum splits among the invisible frames. Jigsaws
//! resolve those ambiguities one at a time, each with a fixed rule.
//!
//! # Architecture
//!
//! The implementation separates a fixed tier from a per-event tier:
//!
//! ## Topology (fixed)
//!
//! Built through the [`AnalysisContext`] builder calls and frozen by
//! [`AnalysisContext::initialize_analysis`]:
//! - the frame tree ([`tree`])
//! - groups of jointly ambiguous frames ([`group`])
//! - jigsaws with their child, dependency and ordering wiring ([`jigsaw`])
//! - an execution list respecting every ordering edge ([`engine::schedule`])
//!
//! ## States (per event)
//!
//! Lists of momenta attached to sets of frames ([`state`]), cleared and
//! refilled for every event. Jigsaws read their parent and dependency
//! states and write their child states.
//!
//! # Event loop
//!
//! 1. [`AnalysisContext::clear_event`]
//! 2. inputs: [`AnalysisContext::add_input`],
//!    [`AnalysisContext::set_invisible_momentum`],
//!    [`AnalysisContext::set_frame_four_vector`]
//! 3. [`AnalysisContext::analyze_event`] runs the execution list once
//! 4. results: [`AnalysisContext::frame_four_vector`] and friends
//!
//! A failed event reports a [`ResolveFailure`] and leaves the analysis ready
//! for the next event; configuration mistakes are [`ConfigError`]s raised
//! before any event is processed.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod group;
pub mod jigsaw;
pub mod key;
pub mod kinematics;
pub mod list;
pub mod state;
pub mod tree;

// Re-export commonly used types
pub use config::AnalysisConfig;
pub use context::AnalysisContext;
pub use engine::EventContext;
pub use error::{ConfigError, ResolveFailure};
pub use group::{GroupId, GroupKind};
pub use jigsaw::{Jigsaw, JigsawCore, JigsawId, JigsawKind};
pub use kinematics::{FourVector, ThreeVector};
pub use list::ObjectList;
pub use state::statistics::{Counters, Statistics};
pub use tree::{FrameId, FrameKind};
