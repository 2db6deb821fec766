//! Configuration loading for RakshaPatrol

use crate::error::{PatrolError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PatrolConfig {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub faults: FaultConfig,
}

/// Command durations and loop cadence, all in seconds
#[derive(Clone, Debug, Deserialize)]
pub struct TimingConfig {
    /// Sleep between loop iterations (default: 0.1)
    #[serde(default = "default_poll_interval")]
    pub poll_interval: f32,

    /// Backward command when an obstacle is ahead (default: 1.0)
    #[serde(default = "default_backup")]
    pub backup: f32,

    /// Avoidance turn after backing up (default: 1.5)
    #[serde(default = "default_turn")]
    pub turn: f32,

    /// Backward command of the escape maneuver (default: 1.5)
    #[serde(default = "default_escape_backup")]
    pub escape_backup: f32,

    /// Turn of the escape maneuver (default: 2.0)
    #[serde(default = "default_escape_turn")]
    pub escape_turn: f32,

    /// Heading nudge when a side sensor is blocked (default: 0.15)
    #[serde(default = "default_correction")]
    pub correction: f32,

    /// Forward command per clear iteration (default: 0.3)
    #[serde(default = "default_forward")]
    pub forward: f32,

    /// Settle sleep after a forward command, shorter than `forward` (default: 0.2)
    #[serde(default = "default_forward_settle")]
    pub forward_settle: f32,

    /// Upper bound on waiting for the loop thread in `stop_patrol` (default: 1.0)
    #[serde(default = "default_join_timeout")]
    pub join_timeout: f32,
}

/// Decision thresholds and randomness
#[derive(Clone, Debug, Deserialize)]
pub struct PolicyConfig {
    /// Obstacle handler escalates to escape once blocks exceed this (default: 3)
    #[serde(default = "default_escape_block_threshold")]
    pub escape_block_threshold: u32,

    /// Stuck detector fires once blocks exceed this (default: 5)
    #[serde(default = "default_stuck_block_threshold")]
    pub stuck_block_threshold: u32,

    /// Chance of repeating the last turn when both sides are blocked (default: 0.7)
    #[serde(default = "default_repeat_last_turn_probability")]
    pub repeat_last_turn_probability: f32,

    /// Left/right imbalance that triggers anti-bias correction (default: 2)
    #[serde(default = "default_anti_bias_margin")]
    pub anti_bias_margin: usize,

    /// Random seed; 0 draws from OS entropy (default: 0)
    #[serde(default)]
    pub seed: u64,
}

/// Collaborator fault handling
#[derive(Clone, Debug, Deserialize)]
pub struct FaultConfig {
    /// Pause before retrying a faulted iteration, in seconds (default: 0.5)
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: f32,

    /// Consecutive faulted iterations before the patrol goes idle (default: 5)
    #[serde(default = "default_max_consecutive_faults")]
    pub max_consecutive_faults: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            backup: default_backup(),
            turn: default_turn(),
            escape_backup: default_escape_backup(),
            escape_turn: default_escape_turn(),
            correction: default_correction(),
            forward: default_forward(),
            forward_settle: default_forward_settle(),
            join_timeout: default_join_timeout(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            escape_block_threshold: default_escape_block_threshold(),
            stuck_block_threshold: default_stuck_block_threshold(),
            repeat_last_turn_probability: default_repeat_last_turn_probability(),
            anti_bias_margin: default_anti_bias_margin(),
            seed: 0,
        }
    }
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            retry_backoff: default_retry_backoff(),
            max_consecutive_faults: default_max_consecutive_faults(),
        }
    }
}

// Default value functions
fn default_poll_interval() -> f32 {
    0.1
}
fn default_backup() -> f32 {
    1.0
}
fn default_turn() -> f32 {
    1.5
}
fn default_escape_backup() -> f32 {
    1.5
}
fn default_escape_turn() -> f32 {
    2.0
}
fn default_correction() -> f32 {
    0.15
}
fn default_forward() -> f32 {
    0.3
}
fn default_forward_settle() -> f32 {
    0.2
}
fn default_join_timeout() -> f32 {
    1.0
}

fn default_escape_block_threshold() -> u32 {
    3
}
fn default_stuck_block_threshold() -> u32 {
    5
}
fn default_repeat_last_turn_probability() -> f32 {
    0.7
}
fn default_anti_bias_margin() -> usize {
    2
}

fn default_retry_backoff() -> f32 {
    0.5
}
fn default_max_consecutive_faults() -> u32 {
    5
}

impl TimingConfig {
    /// All waits collapsed to zero. Used by tests and dry runs.
    pub fn instant() -> Self {
        Self {
            poll_interval: 0.0,
            backup: 0.0,
            turn: 0.0,
            escape_backup: 0.0,
            escape_turn: 0.0,
            correction: 0.0,
            forward: 0.0,
            forward_settle: 0.0,
            join_timeout: default_join_timeout(),
        }
    }
}

impl PatrolConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PatrolError::Config(format!("Failed to read config file: {}", e)))?;
        let config: PatrolConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check durations and probabilities for sane values.
    pub fn validate(&self) -> Result<()> {
        let t = &self.timing;
        let durations = [
            ("poll_interval", t.poll_interval),
            ("backup", t.backup),
            ("turn", t.turn),
            ("escape_backup", t.escape_backup),
            ("escape_turn", t.escape_turn),
            ("correction", t.correction),
            ("forward", t.forward),
            ("forward_settle", t.forward_settle),
            ("join_timeout", t.join_timeout),
            ("retry_backoff", self.faults.retry_backoff),
        ];
        for (name, value) in durations {
            if !value.is_finite() || value < 0.0 {
                return Err(PatrolError::Config(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, value
                )));
            }
        }

        // Settle must undercut the forward command so consecutive moves overlap
        if t.forward > 0.0 && t.forward_settle >= t.forward {
            return Err(PatrolError::Config(format!(
                "forward_settle ({}) must be shorter than forward ({})",
                t.forward_settle, t.forward
            )));
        }

        let p = self.policy.repeat_last_turn_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(PatrolError::Config(format!(
                "repeat_last_turn_probability must be within [0, 1], got {}",
                p
            )));
        }

        Ok(())
    }

    /// Defaults with every wait set to zero.
    pub fn instant() -> Self {
        Self {
            timing: TimingConfig::instant(),
            faults: FaultConfig {
                retry_backoff: 0.0,
                ..FaultConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Convert a seconds value from config into a `Duration`.
#[inline]
pub fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}
