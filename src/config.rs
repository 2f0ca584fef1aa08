// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Analysis configuration.
//!
//! # Examples
//!
//! ```
//! use jigsaw_reco::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::from_json_str(r#"{ "max_combinatoric_inputs": 8 }"#).unwrap();
//! assert_eq!(config.max_combinatoric_inputs, 8);
//! assert!(config.min_masses_fast_path);
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Default limit on the number of inputs enumerated by the exhaustive search.
pub const DEFAULT_MAX_COMBINATORIC_INPUTS: usize = 12;

/// Tunables of one analysis configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Events with more inputs than this are refused by the exhaustive
    /// combinatoric search (it visits K^N assignments).
    pub max_combinatoric_inputs: usize,

    /// Use the O(N³) hemisphere algorithm for minimum-masses pairing when
    /// its preconditions hold.
    pub min_masses_fast_path: bool,
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_combinatoric_inputs: DEFAULT_MAX_COMBINATORIC_INPUTS,
            min_masses_fast_path: true,
        }
    }
}
