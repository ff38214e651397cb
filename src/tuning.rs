//! Data-driven game balance
//!
//! Everything the simulation reads besides the fixed lane constants. Loaded
//! from JSON; any field left out keeps its default.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::spatial::GridPosition;

/// Rejected balance values
#[derive(Debug, Error, PartialEq)]
pub enum TuningError {
    #[error("tiles_per_row must be non-zero")]
    NoColumns,
    #[error("player start column {x} is outside a {tiles}-column grid")]
    StartOutOfBounds { x: u32, tiles: u32 },
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("near-miss band {min}..{max} must start above the collision tolerance {tolerance}")]
    NearMissBand { min: f32, max: f32, tolerance: f32 },
    #[error("lookahead ({lookahead}) must cover the behind margin ({behind})")]
    WindowTooSmall { lookahead: u32, behind: u32 },
    #[error("milestone_interval must be non-zero")]
    ZeroMilestone,
    #[error("failed to read tuning: {0}")]
    Io(String),
    #[error("failed to parse tuning: {0}")]
    Parse(String),
}

/// Game balance parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Grid ===
    pub tiles_per_row: u32,
    pub player_start: GridPosition,
    pub starting_lives: u8,

    // === Timing ===
    /// Target tick rate for the driver
    pub tick_rate_hz: f32,
    /// Wall time between spawn passes (seconds)
    pub spawn_interval: f64,
    /// Move-lock duration after a forward step (seconds)
    pub forward_settle: f64,
    /// Move-lock duration after a sideways or backward step (seconds)
    pub move_settle: f64,

    // === Lane window ===
    pub lookahead: u32,
    pub behind_margin: u32,
    pub cleanup_distance: u32,
    /// Lanes 0..=initial_lanes exist at session start
    pub initial_lanes: u32,

    // === Traffic ===
    /// Hard cap on active vehicles after each spawn pass
    pub max_active_vehicles: usize,
    pub spacing_base: f32,
    pub spacing_speed_reference: f32,
    pub spacing_floor: f32,
    pub convoy_spacing: f32,
    /// Rush hour lanes spawn pairs when there is room
    pub rush_hour_convoys: bool,

    // === Collision & scoring ===
    pub collision_tolerance: f32,
    pub near_miss_min: f32,
    pub near_miss_max: f32,
    pub points_per_step: u64,
    pub near_miss_bonus: u64,
    pub milestone_bonus_enabled: bool,
    pub milestone_bonus: u64,
    pub milestone_interval: u32,

    // === Performance governor ===
    pub perf_window: f32,
    pub perf_min_fps: f32,
    /// Shed vehicles only above this count...
    pub perf_vehicle_threshold: usize,
    /// ...dropping this many of the oldest
    pub perf_vehicle_drop: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tiles_per_row: 8,
            player_start: GridPosition::new(4, 0),
            starting_lives: 3,

            tick_rate_hz: 60.0,
            spawn_interval: 0.2,
            forward_settle: 0.15,
            move_settle: 0.2,

            lookahead: 10,
            behind_margin: 5,
            cleanup_distance: 10,
            initial_lanes: 15,

            max_active_vehicles: 50,
            spacing_base: 20.0,
            spacing_speed_reference: 20.0,
            spacing_floor: 0.8,
            convoy_spacing: 120.0,
            rush_hour_convoys: true,

            collision_tolerance: 30.0,
            near_miss_min: 40.0,
            near_miss_max: 80.0,
            points_per_step: 10,
            near_miss_bonus: 25,
            milestone_bonus_enabled: false,
            milestone_bonus: 100,
            milestone_interval: 10,

            perf_window: 1.0,
            perf_min_fps: 25.0,
            perf_vehicle_threshold: 30,
            perf_vehicle_drop: 10,
        }
    }
}

impl Tuning {
    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.tiles_per_row == 0 {
            return Err(TuningError::NoColumns);
        }
        if !self.player_start.is_within(self.tiles_per_row) {
            return Err(TuningError::StartOutOfBounds {
                x: self.player_start.x,
                tiles: self.tiles_per_row,
            });
        }

        let positives = [
            ("tick_rate_hz", self.tick_rate_hz as f64),
            ("spawn_interval", self.spawn_interval),
            ("collision_tolerance", self.collision_tolerance as f64),
            ("spacing_speed_reference", self.spacing_speed_reference as f64),
            ("perf_window", self.perf_window as f64),
        ];
        for (name, value) in positives {
            if !(value.is_finite() && value > 0.0) {
                return Err(TuningError::NonPositive { name, value });
            }
        }

        if self.near_miss_min < self.collision_tolerance || self.near_miss_max <= self.near_miss_min {
            return Err(TuningError::NearMissBand {
                min: self.near_miss_min,
                max: self.near_miss_max,
                tolerance: self.collision_tolerance,
            });
        }
        if self.lookahead < self.behind_margin {
            return Err(TuningError::WindowTooSmall {
                lookahead: self.lookahead,
                behind: self.behind_margin,
            });
        }
        if self.milestone_interval == 0 {
            return Err(TuningError::ZeroMilestone);
        }
        Ok(())
    }

    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning =
            serde_json::from_str(json).map_err(|e| TuningError::Parse(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())
            .map_err(|e| TuningError::Io(e.to_string()))?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Seconds between ticks at the target rate
    pub fn tick_interval(&self) -> f64 {
        1.0 / self.tick_rate_hz as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(Tuning::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "collision_tolerance": 20.0, "lookahead": 12 }"#).unwrap();
        assert_eq!(tuning.collision_tolerance, 20.0);
        assert_eq!(tuning.lookahead, 12);
        assert_eq!(tuning.points_per_step, 10);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = Tuning {
            tiles_per_row: 0,
            ..Default::default()
        };
        assert_eq!(bad.validate(), Err(TuningError::NoColumns));

        let bad = Tuning {
            player_start: GridPosition::new(8, 0),
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(TuningError::StartOutOfBounds { .. })));

        let bad = Tuning {
            spawn_interval: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(TuningError::NonPositive { name: "spawn_interval", .. })
        ));

        let bad = Tuning {
            near_miss_min: 10.0,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(TuningError::NearMissBand { .. })));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(TuningError::Parse(_))));
    }
}
