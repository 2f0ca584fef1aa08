// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Statistics
//!
//! Statistics are stored in the analysis context and incremented while events
//! are analyzed: by the scheduler for event outcomes, by the combinatoric
//! jigsaws for the search path taken.

use crate::error::ResolveFailure;
use strum::EnumCount;
use strum_macros::EnumCount as EnumCountMacro;

#[derive(Debug, EnumCountMacro, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Counters {
    EventsAnalyzed,
    EventsResolved,
    FastPathPartitions,
    ExhaustivePartitions,
    CandidatesEvaluated,
}

const COUNT: usize = Counters::COUNT + ResolveFailure::COUNT;

#[derive(Debug, Default, Clone)]
pub struct Statistics {
    stats: [u64; COUNT],
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    /// Increment the specified counter by 1.
    pub(crate) fn increment_counter(&mut self, counter: Counters) {
        self.stats[counter as usize] += 1;
    }

    pub(crate) fn add_to_counter(&mut self, counter: Counters, amount: u64) {
        self.stats[counter as usize] += amount;
    }

    pub(crate) fn record_failure(&mut self, failure: &ResolveFailure) {
        self.stats[Counters::COUNT + failure.index()] += 1;
    }

    /// Get the current value of the specified counter.
    pub fn get(&self, counter: Counters) -> u64 {
        self.stats[counter as usize]
    }

    /// Number of events that failed with the same kind of failure as `failure`.
    pub fn failures_like(&self, failure: &ResolveFailure) -> u64 {
        self.stats[Counters::COUNT + failure.index()]
    }

    pub fn total_failures(&self) -> u64 {
        self.stats[Counters::COUNT..].iter().sum()
    }

    pub fn reset(&mut self) {
        self.stats = [0; COUNT];
    }
}
