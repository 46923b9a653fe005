//! Data-driven gameplay tuning
//!
//! Loaded from the game manifest; every field falls back to the defaults in
//! [`crate::consts`].

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// What happens when the robot reaches a junction with no queued direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnderrunPolicy {
    /// Keep walking in the current facing
    #[default]
    ContinueStraight,
    /// Treat the underrun like falling off the track
    FailRun,
}

impl UnderrunPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnderrunPolicy::ContinueStraight => "continue_straight",
            UnderrunPolicy::FailRun => "fail_run",
        }
    }
}

/// Gameplay constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Geometry ===
    /// Pixel pitch of one tile
    pub tile_size: f32,
    /// Robot displacement per movement tick
    pub step: f32,
    /// Trailing offset used to decide which tile the robot is on
    pub lookback: f32,

    // === Cadence (in frames) ===
    pub run_cadence: f32,
    pub idle_cadence: f32,
    /// Delay between level complete and the level transition
    pub completion_delay: f32,

    // === Falling ===
    pub fall_shrink: f32,
    pub fall_threshold: f32,
    /// Idle ticks spent in the fell state before the robot is reset
    pub fall_penalty_ticks: u32,

    // === Scoring ===
    pub start_points: u8,

    pub underrun: UnderrunPolicy,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            step: ROBOT_STEP,
            lookback: TILE_SIZE / 2.0,

            run_cadence: RUN_CADENCE,
            idle_cadence: IDLE_CADENCE,
            completion_delay: COMPLETION_DELAY,

            fall_shrink: FALL_SHRINK,
            fall_threshold: FALL_THRESHOLD,
            fall_penalty_ticks: 3,

            start_points: START_POINTS,

            underrun: UnderrunPolicy::ContinueStraight,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: "must be a positive number",
                })
            }
        }

        positive("tile_size", self.tile_size)?;
        positive("step", self.step)?;
        positive("lookback", self.lookback)?;
        positive("run_cadence", self.run_cadence)?;
        positive("idle_cadence", self.idle_cadence)?;
        positive("fall_shrink", self.fall_shrink)?;

        if self.completion_delay < 0.0 || !self.completion_delay.is_finite() {
            return Err(ConfigError::Invalid {
                field: "completion_delay",
                reason: "must not be negative",
            });
        }
        if self.step >= self.tile_size {
            return Err(ConfigError::Invalid {
                field: "step",
                reason: "must be smaller than a tile",
            });
        }
        if self.lookback >= self.tile_size {
            return Err(ConfigError::Invalid {
                field: "lookback",
                reason: "must be smaller than a tile",
            });
        }
        if !(self.fall_threshold > 0.0 && self.fall_threshold < 1.0) {
            return Err(ConfigError::Invalid {
                field: "fall_threshold",
                reason: "must lie strictly between 0 and 1",
            });
        }
        if self.start_points == 0 {
            return Err(ConfigError::Invalid {
                field: "start_points",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}
