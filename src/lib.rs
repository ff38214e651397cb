//! Chaotic Street - an endless crosswalk arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (lanes, traffic, collisions, game state)
//! - `engine`: Session owner that routes simulation events to services
//! - `platform`: Clock, input queue and fixed-rate driver
//! - `persistence`: Versioned JSON save/load
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod engine;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod scores;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use engine::{EngineStatus, GameEngine};
pub use highscores::HighScore;
pub use settings::Settings;
pub use tuning::{Tuning, TuningError};

/// Fixed gameplay constants
///
/// Lane generation reads only these, never `Tuning`, so a lane stays a pure
/// function of its index.
pub mod consts {
    /// Lane pace before difficulty and per-lane variation (units/sec)
    pub const BASE_LANE_SPEED: f32 = 200.0;
    /// Per-lane pace variation, indexed by `lane % 7`
    pub const LANE_SPEED_VARIATION: [f32; 7] = [0.8, 1.0, 1.2, 0.9, 1.1, 0.7, 1.3];

    /// Every 4th lane (past the start rows) is a sidewalk
    pub const SAFE_ZONE_INTERVAL: u32 = 4;
    /// Rush hour lanes repeat every 7 rows...
    pub const RUSH_HOUR_INTERVAL: u32 = 7;
    /// ...but only beyond this row
    pub const RUSH_HOUR_MIN_LANE: u32 = 20;

    /// Screen layout
    pub const SIDEWALK_HEIGHT: f32 = 80.0;
    pub const MAX_LANE_HEIGHT: f32 = 80.0;
    /// Nominal vehicle width used for the lane spawn edge
    pub const VEHICLE_WIDTH: f32 = 60.0;

    /// Isometric projection tile
    pub const ISO_TILE_WIDTH: f32 = 60.0;
    pub const ISO_TILE_HEIGHT: f32 = 30.0;
    pub const ISO_BOTTOM_OFFSET: f32 = 200.0;

    /// Fallback viewport (iPhone 14 Pro, points)
    pub const DEFAULT_SCREEN_WIDTH: f32 = 393.0;
    pub const DEFAULT_SCREEN_HEIGHT: f32 = 852.0;

    /// Rows needed for 100% progress
    pub const PROGRESS_ROWS: u32 = 100;

    /// Pseudo-3D depth cues
    pub const PERSPECTIVE_SCALE: f32 = 0.08;
    pub const MAX_PERSPECTIVE_DISTANCE: u32 = 5;
    pub const PERSPECTIVE_OPACITY_STEP: f32 = 0.1;
}

/// Progress toward the 100-row goal, in percent (capped at 100)
#[inline]
pub fn progress_percentage(y: u32) -> f32 {
    (y as f32 / consts::PROGRESS_ROWS as f32 * 100.0).min(100.0)
}
