// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Error types.
//!
//! Two kinds of failure exist and they never mix:
//!
//! - [`ConfigError`]: something is wrong with the analysis configuration
//!   (tree wiring, group membership, jigsaw wiring, dependency cycles).
//!   Raised by the builder calls and by
//!   [`initialize_analysis`](crate::context::AnalysisContext::initialize_analysis),
//!   always before any event is processed.
//! - [`ResolveFailure`]: one event could not be resolved. Returned by every
//!   jigsaw's `analyze_event` and by
//!   [`analyze_event`](crate::context::AnalysisContext::analyze_event); the
//!   next event starts from a clean slate.

use strum_macros::EnumCount as EnumCountMacro;
use thiserror::Error;

/// Configuration errors, detected during setup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown frame {0}")]
    UnknownFrame(String),

    #[error("unknown group {0}")]
    UnknownGroup(String),

    #[error("unknown jigsaw {0}")]
    UnknownJigsaw(String),

    #[error("frame {frame} is a {actual} frame, expected {expected}")]
    WrongFrameKind {
        frame: String,
        actual: &'static str,
        expected: &'static str,
    },

    #[error("frame {frame} already has parent {parent}")]
    FrameAlreadyParented { frame: String, parent: String },

    #[error("frame {frame} already belongs to group {group}")]
    FrameAlreadyGrouped { frame: String, group: String },

    #[error("unsound decay tree at {frame}: {reason}")]
    UnsoundTree { frame: String, reason: String },

    #[error("unsound jigsaw {jigsaw}: {reason}")]
    UnsoundJigsaw { jigsaw: String, reason: String },

    #[error("group {0} has no frames")]
    EmptyGroup(String),

    #[error("group {group} has a state with frames [{}] that no jigsaw resolves", .frames.join(", "))]
    UncoveredState { group: String, frames: Vec<String> },

    #[error("jigsaw {jigsaw} does not resolve any state of group {group}")]
    UnusedJigsaw { jigsaw: String, group: String },

    #[error("cyclic jigsaw dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("group {group} is a {actual} group, expected {expected}")]
    WrongGroupKind {
        group: String,
        actual: &'static str,
        expected: &'static str,
    },

    #[error("jigsaw {jigsaw} is a {actual} jigsaw, expected {expected}")]
    WrongJigsawKind {
        jigsaw: String,
        actual: &'static str,
        expected: &'static str,
    },

    #[error("jigsaw {jigsaw} has {n_children} children, index {index} is out of range")]
    ChildIndexOutOfRange {
        jigsaw: String,
        index: usize,
        n_children: usize,
    },

    #[error("analysis has not been initialized")]
    NotInitialized,

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

/// Per-event resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error, EnumCountMacro)]
pub enum ResolveFailure {
    /// `analyze_event` was called before a successful setup.
    #[error("analysis is not initialized")]
    NotInitialized,

    /// Frame results were queried before `analyze_event` ran for this event.
    #[error("the current event has not been analyzed")]
    EventNotAnalyzed,

    /// A group or standalone frame was not given its per-event input.
    #[error("{source_name} has no input for this event")]
    MissingInput { source_name: String },

    /// Fewer input objects than the jigsaw needs.
    #[error("jigsaw {jigsaw} needs {required} inputs, got {available}")]
    InsufficientInputs {
        jigsaw: String,
        available: usize,
        required: usize,
    },

    /// More inputs than the exhaustive search is allowed to enumerate.
    #[error("jigsaw {jigsaw} got {available} inputs, the combinatoric limit is {limit}")]
    TooManyInputs {
        jigsaw: String,
        available: usize,
        limit: usize,
    },

    /// No assignment satisfied the per-child requirements.
    #[error("jigsaw {jigsaw} found no valid partition")]
    NoValidPartition { jigsaw: String },

    /// The kinematics admit no solution (no rest frame, undefined rapidity).
    #[error("{jigsaw}: degenerate kinematics ({reason})")]
    DegenerateKinematics { jigsaw: String, reason: &'static str },

    /// A jigsaw executed on behalf of another one failed.
    #[error("jigsaw {jigsaw}: dependency {dependency} failed")]
    DependencyFailed { jigsaw: String, dependency: String },
}

impl ResolveFailure {
    /// Position of this failure kind, for per-kind counters.
    pub fn index(&self) -> usize {
        match self {
            ResolveFailure::NotInitialized => 0,
            ResolveFailure::EventNotAnalyzed => 1,
            ResolveFailure::MissingInput { .. } => 2,
            ResolveFailure::InsufficientInputs { .. } => 3,
            ResolveFailure::TooManyInputs { .. } => 4,
            ResolveFailure::NoValidPartition { .. } => 5,
            ResolveFailure::DegenerateKinematics { .. } => 6,
            ResolveFailure::DependencyFailed { .. } => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::EnumCount;

    #[test]
    fn test_failure_indices_are_dense() {
        let failures = [
            ResolveFailure::NotInitialized,
            ResolveFailure::EventNotAnalyzed,
            ResolveFailure::MissingInput { source_name: "JETS".into() },
            ResolveFailure::InsufficientInputs {
                jigsaw: "J".into(),
                available: 1,
                required: 2,
            },
            ResolveFailure::TooManyInputs {
                jigsaw: "J".into(),
                available: 20,
                limit: 12,
            },
            ResolveFailure::NoValidPartition { jigsaw: "J".into() },
            ResolveFailure::DegenerateKinematics {
                jigsaw: "J".into(),
                reason: "no rest frame",
            },
            ResolveFailure::DependencyFailed {
                jigsaw: "J".into(),
                dependency: "K".into(),
            },
        ];
        assert_eq!(failures.len(), ResolveFailure::COUNT);
        for (i, failure) in failures.iter().enumerate() {
            assert_eq!(failure.index(), i);
        }
    }

    #[test]
    fn test_messages() {
        let failure = ResolveFailure::InsufficientInputs {
            jigsaw: "MinMjj".into(),
            available: 1,
            required: 2,
        };
        assert_eq!(failure.to_string(), "jigsaw MinMjj needs 2 inputs, got 1");

        let err = ConfigError::CyclicDependency {
            cycle: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "cyclic jigsaw dependency: A -> B -> A");
    }
}
