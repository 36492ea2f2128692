//! Solver configuration.
//!
//! Values come from an optional JSON file and are then overridden by
//! command line flags.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Algorithm used to order the stops
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlgorithmKind {
    /// Plain nearest neighbor from the origin
    NearestNeighbor,
    /// Seeded randomized nearest neighbor
    NearestNeighborRandom,
    /// Best of deterministic and randomized nearest neighbor runs
    MultiStart,
    /// Multi-start followed by 2-opt
    TwoOpt,
    /// Multi-start followed by 2-opt and Or-opt descent
    Vnd,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 5] = [
        AlgorithmKind::NearestNeighbor,
        AlgorithmKind::NearestNeighborRandom,
        AlgorithmKind::MultiStart,
        AlgorithmKind::TwoOpt,
        AlgorithmKind::Vnd,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AlgorithmKind::NearestNeighbor => "NearestNeighbor",
            AlgorithmKind::NearestNeighborRandom => "NearestNeighbor-Randomized",
            AlgorithmKind::MultiStart => "MultiStart",
            AlgorithmKind::TwoOpt => "MultiStart+2-Opt",
            AlgorithmKind::Vnd => "MultiStart+VND",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Return to the origin after the last delivery
    pub closed_route: bool,
    pub algorithm: AlgorithmKind,
    pub seed: u64,
    /// Randomized runs added to the deterministic start in multi-start
    pub multi_start_runs: usize,
    /// How many of the closest stops the randomized heuristic picks from
    pub candidate_pool: usize,
    /// Used to estimate arrival times
    pub average_speed_kmh: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            closed_route: false,
            algorithm: AlgorithmKind::NearestNeighbor,
            seed: 42,
            multi_start_runs: 8,
            candidate_pool: 3,
            average_speed_kmh: 30.0,
        }
    }
}

impl SolverConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: SolverConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.average_speed_kmh.is_finite() && self.average_speed_kmh > 0.0) {
            return Err(Error::invalid_input(format!(
                "average speed must be positive, got {}",
                self.average_speed_kmh
            )));
        }
        if self.candidate_pool == 0 {
            return Err(Error::invalid_input("candidate pool must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert!(!config.closed_route);
        assert_eq!(config.algorithm, AlgorithmKind::NearestNeighbor);
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SolverConfig =
            serde_json::from_str(r#"{ "algorithm": "vnd", "closed_route": true }"#).unwrap();
        assert_eq!(config.algorithm, AlgorithmKind::Vnd);
        assert!(config.closed_route);
        assert_eq!(config.multi_start_runs, 8);
    }

    #[test]
    fn test_invalid_speed() {
        let config = SolverConfig {
            average_speed_kmh: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
