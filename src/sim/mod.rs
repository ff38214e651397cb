//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Time arrives as an explicit `now`, never read from a clock
//! - Randomness comes only from the injected `RandomSource`
//! - Stable iteration order (vehicles oldest first, lanes by index)
//! - No audio, storage or platform dependencies

pub mod collision;
pub mod lane;
pub mod lane_window;
pub mod rng;
pub mod schedule;
pub mod spatial;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod vehicle;

pub use collision::{Hit, collect_near_misses, first_collision};
pub use lane::{Difficulty, Direction, Lane, LaneKind, lane_for};
pub use lane_window::{LaneWindow, WindowExtent};
pub use rng::{RandomSource, ScriptedRng, seeded};
pub use spatial::{GridPosition, Viewport, grid_to_isometric, grid_to_screen};
pub use spawner::{VehicleSpawner, select_vehicle_type, weighted_pick};
pub use state::{
    Facing, GameEvent, GamePhase, GameState, Player, RunSummary, ScoreReason, Step,
};
pub use tick::{move_player, pause, resume, return_to_menu, start_game, tick};
pub use vehicle::{Vehicle, VehicleType};
