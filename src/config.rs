use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CATCH_SHRINKAGE, FRIGHTENED_REROLL_CHANCE, FRIGHTENED_SPEED_FACTOR, GHOST_BASE_SPEED,
    GHOST_SCORE, HOSTILE_REROLL_CHANCE, INTERSECTION_TOLERANCE, PELLET_SCORE, PLAYER_SPEED,
    POWER_DURATION_TICKS, POWER_PELLET_SCORE, READY_DELAY_TICKS, START_LIVES, TURN_MIN_PX,
    TURN_TILE_FRACTION, VISIT_PENALTY,
};
use crate::error::ConfigError;

/// Speeds and the turn window used by every mover.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    #[serde(rename = "playerSpeed")]
    pub player_speed: f64,
    #[serde(rename = "ghostSpeed")]
    pub ghost_speed: f64,
    #[serde(rename = "turnMinPx")]
    pub turn_min_px: f64,
    #[serde(rename = "turnTileFraction")]
    pub turn_tile_fraction: f64,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            player_speed: PLAYER_SPEED,
            ghost_speed: GHOST_BASE_SPEED,
            turn_min_px: TURN_MIN_PX,
            turn_tile_fraction: TURN_TILE_FRACTION,
        }
    }
}

impl MovementTuning {
    /// How far off a grid line a mover may be and still commit a turn.
    pub fn turn_threshold(&self, tile_size: f64) -> f64 {
        (tile_size * self.turn_tile_fraction)
            .max(self.turn_min_px)
            .min(tile_size / 2.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuitTuning {
    /// Fraction of a tile the center may stray from a cell center and still count as a junction.
    #[serde(rename = "intersectionTolerance")]
    pub intersection_tolerance: f64,
    #[serde(rename = "hostileRerollChance")]
    pub hostile_reroll_chance: f64,
    #[serde(rename = "frightenedRerollChance")]
    pub frightened_reroll_chance: f64,
    #[serde(rename = "visitPenalty")]
    pub visit_penalty: f64,
    #[serde(rename = "frightenedSpeedFactor")]
    pub frightened_speed_factor: f64,
}

impl Default for PursuitTuning {
    fn default() -> Self {
        Self {
            intersection_tolerance: INTERSECTION_TOLERANCE,
            hostile_reroll_chance: HOSTILE_REROLL_CHANCE,
            frightened_reroll_chance: FRIGHTENED_REROLL_CHANCE,
            visit_penalty: VISIT_PENALTY,
            frightened_speed_factor: FRIGHTENED_SPEED_FACTOR,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    #[serde(rename = "startLives")]
    pub start_lives: u32,
    #[serde(rename = "pelletScore")]
    pub pellet_score: u32,
    #[serde(rename = "powerPelletScore")]
    pub power_pellet_score: u32,
    #[serde(rename = "ghostScore")]
    pub ghost_score: u32,
    #[serde(rename = "powerDurationTicks")]
    pub power_duration_ticks: u32,
    #[serde(rename = "readyDelayTicks")]
    pub ready_delay_ticks: u32,
    #[serde(rename = "catchShrinkage")]
    pub catch_shrinkage: f64,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            start_lives: START_LIVES,
            pellet_score: PELLET_SCORE,
            power_pellet_score: POWER_PELLET_SCORE,
            ghost_score: GHOST_SCORE,
            power_duration_ticks: POWER_DURATION_TICKS,
            ready_delay_ticks: READY_DELAY_TICKS,
            catch_shrinkage: CATCH_SHRINKAGE,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub movement: MovementTuning,
    pub pursuit: PursuitTuning,
    pub session: SessionTuning,
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let movement = &self.movement;
        if !(movement.player_speed > 0.0 && movement.player_speed.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "playerSpeed must be positive, got {}",
                movement.player_speed
            )));
        }
        if !(movement.ghost_speed > 0.0 && movement.ghost_speed.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "ghostSpeed must be positive, got {}",
                movement.ghost_speed
            )));
        }
        if movement.turn_min_px < 0.0 || !(0.0..=0.5).contains(&movement.turn_tile_fraction) {
            return Err(ConfigError::Invalid(
                "turn window must be non-negative and at most half a tile".to_string(),
            ));
        }

        let pursuit = &self.pursuit;
        for (name, value) in [
            ("hostileRerollChance", pursuit.hostile_reroll_chance),
            ("frightenedRerollChance", pursuit.frightened_reroll_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if !(0.0..=0.5).contains(&pursuit.intersection_tolerance) {
            return Err(ConfigError::Invalid(format!(
                "intersectionTolerance must be within [0, 0.5], got {}",
                pursuit.intersection_tolerance
            )));
        }
        if pursuit.visit_penalty < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "visitPenalty must be non-negative, got {}",
                pursuit.visit_penalty
            )));
        }
        if !(pursuit.frightened_speed_factor > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "frightenedSpeedFactor must be positive, got {}",
                pursuit.frightened_speed_factor
            )));
        }

        if self.session.start_lives == 0 {
            return Err(ConfigError::Invalid("startLives must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Speeds of half a tile or more let the corner-sampled lookahead step over a wall.
    pub fn check_tile_size(&self, tile_size: f64) -> Result<(), ConfigError> {
        let limit = tile_size / 2.0;
        for (name, speed) in [
            ("playerSpeed", self.movement.player_speed),
            ("ghostSpeed", self.movement.ghost_speed),
        ] {
            if speed >= limit {
                return Err(ConfigError::Invalid(format!(
                    "{name} {speed} must be below half the tile size ({limit})"
                )));
            }
        }
        Ok(())
    }
}
