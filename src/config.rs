// Configuration module for reading Boxes.toml
// Every threshold and weight the strategy engine uses lives here, so the
// baseline and refined engines are two configurations of the same code

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub strategy: StrategyConfig,
    pub heuristic: HeuristicConfig,
    pub cycles: CycleConfig,
    pub search: SearchConfig,
    pub debug: DebugConfig,
}

/// Identity and fallback policy of the engine
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    pub fallback: Fallback,
}

/// Move chosen when neither a tactical move nor a search applies
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// First legal move
    FirstMove,
    /// Free captures first, then moves that leave no three-sided cell
    SafeRisky,
}

/// Static evaluation weights
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicConfig {
    pub claimed_weight: i32,
    pub chain_seed_weight: i32,
    pub untouched_weight: i32,
    pub three_lines_penalty: i32,
}

/// Fraction of the remaining time handed to a sub-task, capped
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct TimeSlice {
    pub fraction: f64,
    pub cap_ms: u64,
}

impl TimeSlice {
    /// Milliseconds granted out of `time_remaining_ms`
    pub fn budget_ms(&self, time_remaining_ms: u64) -> u64 {
        let share = (time_remaining_ms as f64 * self.fraction).floor();
        if share <= 0.0 {
            0
        } else {
            (share as u64).min(self.cap_ms)
        }
    }
}

/// Chain and cycle exploitation
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CycleConfig {
    pub min_chain_len: usize,
    /// Minimum number of three-sided cells before detection runs
    pub min_opportunity: usize,
    /// Detection runs only with strictly more time than this
    pub min_time_remaining_ms: Option<u64>,
    /// Detection runs only past this game progress ratio
    pub min_game_progress: Option<f64>,
    /// Deadline for detection; unbounded when absent
    pub time_slice: Option<TimeSlice>,
    /// Grow a chain when one exists but no cycle does
    pub extend_chains: bool,
}

/// Depth override applied when the remaining time is below `below_ms`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DepthTier {
    pub below_ms: u64,
    pub depth: u8,
}

/// Deeper search when many cells are about to be captured and time allows
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DeepTier {
    pub min_opportunity: usize,
    pub above_ms: u64,
    pub depth: u8,
}

/// Adversarial search depth table and gating
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SearchConfig {
    pub default_depth: u8,
    /// Applied in order; a later matching tier wins
    pub tiers: Vec<DepthTier>,
    pub deep_tier: Option<DeepTier>,
    /// Deadline for the search; unbounded when absent
    pub time_slice: Option<TimeSlice>,
    /// Share of open cells with two or more lines required to search
    pub min_developed_ratio: Option<f64>,
    pub min_time_remaining_ms: Option<u64>,
    pub min_opportunity: usize,
    /// Search only when there are strictly fewer legal moves than this
    pub max_legal_moves: Option<usize>,
    pub min_game_progress: Option<f64>,
}

impl SearchConfig {
    /// Picks the search depth for this turn
    pub fn depth_for(&self, time_remaining_ms: u64, opportunity: usize) -> u8 {
        let mut depth = self.default_depth;
        for tier in &self.tiers {
            if time_remaining_ms < tier.below_ms {
                depth = tier.depth;
            }
        }
        if let Some(deep) = self.deep_tier {
            if opportunity >= deep.min_opportunity && time_remaining_ms > deep.above_ms {
                depth = deep.depth;
            }
        }
        depth
    }
}

/// Decision log configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Boxes.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&contents)
    }

    /// Parses configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Boxes.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Boxes.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Boxes.toml
    pub fn default_hardcoded() -> Self {
        Self::refined()
    }

    /// Time-aware engine: gated cycle detection, tiered search, safe-move fallback
    pub fn refined() -> Self {
        Config {
            strategy: StrategyConfig {
                name: "refined".to_string(),
                fallback: Fallback::SafeRisky,
            },
            heuristic: HeuristicConfig {
                claimed_weight: 50,
                chain_seed_weight: 5,
                untouched_weight: 1,
                three_lines_penalty: 15,
            },
            cycles: CycleConfig {
                min_chain_len: 3,
                min_opportunity: 2,
                min_time_remaining_ms: Some(3000),
                min_game_progress: Some(0.3),
                time_slice: Some(TimeSlice {
                    fraction: 0.02,
                    cap_ms: 100,
                }),
                extend_chains: false,
            },
            search: SearchConfig {
                default_depth: 3,
                tiers: vec![
                    DepthTier {
                        below_ms: 3000,
                        depth: 2,
                    },
                    DepthTier {
                        below_ms: 1000,
                        depth: 1,
                    },
                ],
                deep_tier: Some(DeepTier {
                    min_opportunity: 6,
                    above_ms: 5000,
                    depth: 4,
                }),
                time_slice: Some(TimeSlice {
                    fraction: 0.04,
                    cap_ms: 400,
                }),
                min_developed_ratio: None,
                min_time_remaining_ms: Some(2000),
                min_opportunity: 3,
                max_legal_moves: Some(50),
                min_game_progress: Some(0.2),
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "boxes_debug.jsonl".to_string(),
            },
        }
    }

    /// Always-on chain play, unbounded search once half the board is developed
    pub fn baseline() -> Self {
        Config {
            strategy: StrategyConfig {
                name: "baseline".to_string(),
                fallback: Fallback::FirstMove,
            },
            heuristic: HeuristicConfig {
                claimed_weight: 50,
                chain_seed_weight: 5,
                untouched_weight: 1,
                three_lines_penalty: 0,
            },
            cycles: CycleConfig {
                min_chain_len: 3,
                min_opportunity: 0,
                min_time_remaining_ms: None,
                min_game_progress: None,
                time_slice: None,
                extend_chains: true,
            },
            search: SearchConfig {
                default_depth: 4,
                tiers: vec![
                    DepthTier {
                        below_ms: 5000,
                        depth: 2,
                    },
                    DepthTier {
                        below_ms: 2000,
                        depth: 1,
                    },
                ],
                deep_tier: None,
                time_slice: None,
                min_developed_ratio: Some(0.5),
                min_time_remaining_ms: None,
                min_opportunity: 0,
                max_legal_moves: None,
                min_game_progress: None,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "boxes_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            eprintln!("Warning: Could not load Boxes.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}
