//! Game state and core simulation types
//!
//! One `GameState` per engine; `reset_session` wipes everything a run
//! touches so no state leaks from one run into the next.

use serde::{Deserialize, Serialize};

use super::lane::{Difficulty, Lane};
use super::lane_window::{LaneWindow, WindowExtent};
use super::schedule::Scheduler;
use super::spatial::{GridPosition, Viewport, grid_to_screen};
use super::spawner::VehicleSpawner;
use super::vehicle::{Vehicle, VehicleType};
use crate::progress_percentage;
use crate::tuning::Tuning;

/// Slack for wall-clock comparisons, so a tick landing on a boundary counts
const TIME_EPSILON: f64 = 1e-9;

/// Session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, nothing ticking
    #[default]
    Menu,
    /// Active gameplay
    Playing,
    /// Ticking suspended
    Paused,
    /// Run ended by a collision
    GameOver,
}

/// Which way the player sprite faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

/// A one-cell player move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Forward,
    Left,
    Right,
    Backward,
}

impl Step {
    /// Cell the move lands on, or `None` if it leaves the grid
    pub fn target(&self, from: GridPosition, tiles_per_row: u32) -> Option<GridPosition> {
        let GridPosition { x, y } = from;
        let to = match self {
            Step::Forward => GridPosition::new(x, y.checked_add(1)?),
            Step::Backward => GridPosition::new(x, y.checked_sub(1)?),
            Step::Left => GridPosition::new(x.checked_sub(1)?, y),
            Step::Right => GridPosition::new(x.checked_add(1)?, y),
        };
        to.is_within(tiles_per_row).then_some(to)
    }

    pub fn facing(&self) -> Facing {
        match self {
            Step::Forward => Facing::Up,
            Step::Backward => Facing::Down,
            Step::Left => Facing::Left,
            Step::Right => Facing::Right,
        }
    }
}

/// The pedestrian
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub grid: GridPosition,
    pub alive: bool,
    /// Hop animation in progress; blocks further moves
    pub moving: bool,
    pub score: u64,
    pub lives: u8,
    pub facing: Facing,
}

impl Player {
    pub fn new(start: GridPosition, lives: u8) -> Self {
        Self {
            grid: start,
            alive: true,
            moving: false,
            score: 0,
            lives,
            facing: Facing::Up,
        }
    }

    pub fn die(&mut self) {
        self.alive = false;
        self.moving = false;
        self.lives = self.lives.saturating_sub(1);
    }

    /// Back to the start cell, keeping score and lives
    pub fn respawn(&mut self, start: GridPosition) {
        self.grid = start;
        self.alive = true;
        self.moving = false;
        self.facing = Facing::Up;
    }

    pub fn finish_moving(&mut self) {
        self.moving = false;
    }

    pub fn screen_position(&self, viewport: &Viewport) -> glam::Vec2 {
        grid_to_screen(self.grid, viewport)
    }
}

/// Finalized record of one run, handed to the score sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub score: u64,
    /// Final row
    pub distance: u32,
    pub difficulty: String,
    /// Seconds played, excluding pauses
    pub time_alive: f64,
    pub player_id: String,
}

/// Why points were awarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreReason {
    Step,
    NearMiss,
    Milestone,
}

/// Observable simulation events, drained by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    PlayerMoved { to: GridPosition, facing: Facing },
    PointsAwarded { reason: ScoreReason, points: u64, total: u64 },
    NearMiss { vehicle_id: u32, distance: f32 },
    Collision { vehicle_id: u32, vehicle: VehicleType, distance: f32 },
    GameOver(RunSummary),
    LoadShed { fps: f32, vehicles_dropped: usize, lanes_dropped: usize },
}

/// Wall-clock bookkeeping for delta time and the spawn cadence
#[derive(Debug, Clone, Default)]
pub struct TickClock {
    last_tick: Option<f64>,
    last_spawn: f64,
    started_at: f64,
    paused_at: Option<f64>,
    paused_total: f64,
}

impl TickClock {
    /// Fresh clock for a run starting at `now`
    pub fn start(now: f64) -> Self {
        Self {
            last_tick: Some(now),
            last_spawn: now,
            started_at: now,
            paused_at: None,
            paused_total: 0.0,
        }
    }

    /// Seconds since the previous tick (0 on the first, never negative)
    pub fn delta(&mut self, now: f64) -> f32 {
        let dt = self.last_tick.map_or(0.0, |last| (now - last).max(0.0));
        self.last_tick = Some(now);
        dt as f32
    }

    /// True once per `interval` of wall time; missed intervals aren't replayed
    pub fn spawn_due(&mut self, now: f64, interval: f64) -> bool {
        if now - self.last_spawn + TIME_EPSILON < interval {
            return false;
        }
        self.last_spawn += interval;
        // After a stall, re-base instead of bursting
        if now - self.last_spawn >= interval {
            self.last_spawn = now;
        }
        true
    }

    pub fn suspend(&mut self, now: f64) {
        self.paused_at.get_or_insert(now);
    }

    /// Re-base on resume so the paused gap is never replayed
    pub fn resume(&mut self, now: f64) {
        if let Some(at) = self.paused_at.take() {
            self.paused_total += (now - at).max(0.0);
        }
        self.last_tick = Some(now);
        self.last_spawn = now;
    }

    /// Active play time at `now`
    pub fn elapsed(&self, now: f64) -> f64 {
        let paused_now = self.paused_at.map_or(0.0, |at| (now - at).max(0.0));
        (now - self.started_at - self.paused_total - paused_now).max(0.0)
    }
}

/// Tracks achieved tick rate over fixed windows
#[derive(Debug, Clone, Default)]
pub struct PerfGovernor {
    window_start: Option<f64>,
    frames: u32,
    /// Rate measured over the last complete window
    pub last_fps: f32,
}

impl PerfGovernor {
    /// Count a tick. Returns `Some(fps)` when a window just closed below
    /// `min_fps`.
    pub fn record(&mut self, now: f64, window: f32, min_fps: f32) -> Option<f32> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;

        let elapsed = now - start;
        if elapsed < window as f64 {
            return None;
        }
        let fps = (self.frames as f64 / elapsed) as f32;
        self.last_fps = fps;
        self.frames = 0;
        self.window_start = Some(now);
        (fps < min_fps).then_some(fps)
    }

    pub fn rebase(&mut self, now: f64) {
        self.window_start = Some(now);
        self.frames = 0;
    }
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    pub phase: GamePhase,
    pub player: Player,
    /// Active vehicles, oldest first
    pub vehicles: Vec<Vehicle>,
    pub lanes: LaneWindow,
    pub viewport: Viewport,
    pub spawner: VehicleSpawner,
    /// Tier for the furthest row reached
    pub difficulty: Difficulty,
    /// Percent of the 100-row goal reached
    pub progress: f32,
    /// Peak y this run; forward points are paid only past it
    pub max_reached_y: u32,
    /// Bumped on every reset; invalidates deferred actions
    pub session: u64,
    pub time_ticks: u64,
    pub player_id: String,
    pub clock: TickClock,
    pub governor: PerfGovernor,
    pub deferred: Scheduler,
    events: Vec<GameEvent>,
}

impl GameState {
    /// A state sitting in the menu
    pub fn new(tuning: Tuning, width: f32, height: f32, speed_multiplier: f32) -> Self {
        let extent = WindowExtent {
            behind: tuning.behind_margin,
            lookahead: tuning.lookahead,
            cleanup: tuning.cleanup_distance,
        };
        Self {
            phase: GamePhase::Menu,
            player: Player::new(tuning.player_start, tuning.starting_lives),
            vehicles: Vec::new(),
            lanes: LaneWindow::new(extent, tuning.initial_lanes),
            viewport: Viewport::new(width, height, tuning.tiles_per_row),
            spawner: VehicleSpawner::new(&tuning, speed_multiplier),
            difficulty: Difficulty::Easy,
            progress: 0.0,
            max_reached_y: 0,
            session: 0,
            time_ticks: 0,
            player_id: String::new(),
            clock: TickClock::default(),
            governor: PerfGovernor::default(),
            deferred: Scheduler::new(),
            events: Vec::new(),
            tuning,
        }
    }

    /// Clear everything a run mutates
    pub fn reset_session(&mut self) {
        self.session += 1;
        self.deferred.cancel_all();
        self.vehicles.clear();
        self.lanes.reset();
        self.player = Player::new(self.tuning.player_start, self.tuning.starting_lives);
        self.spawner = VehicleSpawner::new(&self.tuning, self.spawner.speed_multiplier);
        self.difficulty = Difficulty::Easy;
        self.progress = 0.0;
        self.max_reached_y = 0;
        self.time_ticks = 0;
        self.clock = TickClock::default();
        self.governor = PerfGovernor::default();
    }

    pub fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::debug!("Phase {:?} -> {:?}", from, to);
        self.phase = to;
        self.events.push(GameEvent::PhaseChanged { from, to });
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Add points to the run score
    pub fn award(&mut self, reason: ScoreReason, points: u64) {
        self.player.score += points;
        self.events.push(GameEvent::PointsAwarded {
            reason,
            points,
            total: self.player.score,
        });
    }

    pub fn score(&self) -> u64 {
        self.player.score
    }

    /// Recompute difficulty and progress from the peak row
    pub fn update_status(&mut self) {
        self.difficulty = Difficulty::for_index(self.max_reached_y);
        self.progress = progress_percentage(self.max_reached_y);
    }

    /// Lane under the player (synthesized if the window dropped it)
    pub fn current_lane(&mut self) -> &Lane {
        let y = self.player.grid.y;
        self.lanes.lane(y)
    }

    pub fn is_player_in_safe_zone(&mut self) -> bool {
        self.current_lane().is_player_safe()
    }

    /// New viewport size; existing vehicle positions are left untouched
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height, self.tuning.tiles_per_row);
    }

    pub fn run_summary(&self, now: f64) -> RunSummary {
        RunSummary {
            score: self.player.score,
            distance: self.player.grid.y,
            difficulty: self.difficulty.as_str().to_string(),
            time_alive: self.clock.elapsed(now),
            player_id: self.player_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_targets() {
        let from = GridPosition::new(0, 0);
        assert_eq!(Step::Forward.target(from, 8), Some(GridPosition::new(0, 1)));
        assert_eq!(Step::Backward.target(from, 8), None);
        assert_eq!(Step::Left.target(from, 8), None);
        assert_eq!(Step::Right.target(GridPosition::new(7, 3), 8), None);
        assert_eq!(Step::Right.target(GridPosition::new(6, 3), 8), Some(GridPosition::new(7, 3)));
    }

    #[test]
    fn test_player_die_and_respawn() {
        let start = GridPosition::new(4, 0);
        let mut p = Player::new(start, 3);
        p.grid = GridPosition::new(2, 9);
        p.score = 90;
        p.die();
        assert!(!p.alive);
        assert_eq!(p.lives, 2);
        p.respawn(start);
        assert!(p.alive);
        assert_eq!(p.grid, start);
        assert_eq!(p.score, 90);
    }

    #[test]
    fn test_tick_clock_delta_and_pause() {
        let mut clock = TickClock::start(10.0);
        assert_eq!(clock.delta(10.5), 0.5);
        clock.suspend(11.0);
        clock.resume(16.0);
        // Gap is not replayed
        assert!((clock.delta(16.02) - 0.02).abs() < 1e-6);
        assert!((clock.elapsed(17.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_tick_clock_never_negative() {
        let mut clock = TickClock::start(5.0);
        assert_eq!(clock.delta(4.0), 0.0);
    }

    #[test]
    fn test_spawn_cadence() {
        let mut clock = TickClock::start(0.0);
        assert!(!clock.spawn_due(0.1, 0.2));
        assert!(clock.spawn_due(0.2, 0.2));
        assert!(!clock.spawn_due(0.3, 0.2));
        // A long stall yields a single pass, not a backlog
        assert!(clock.spawn_due(2.0, 0.2));
        assert!(!clock.spawn_due(2.1, 0.2));
    }

    #[test]
    fn test_spawn_cadence_at_sixty_hz() {
        let mut clock = TickClock::start(0.0);
        let due: Vec<u32> = (1..=60)
            .filter(|&i| clock.spawn_due(i as f64 / 60.0, 0.2))
            .collect();
        assert_eq!(due, vec![12, 24, 36, 48, 60]);
    }

    #[test]
    fn test_governor_window() {
        let mut gov = PerfGovernor::default();
        // 10 ticks over one second: below 25 fps
        let mut verdict = None;
        for i in 0..=10 {
            verdict = gov.record(i as f64 * 0.1, 1.0, 25.0);
        }
        assert!(verdict.is_some());

        let mut gov = PerfGovernor::default();
        let mut verdict = None;
        for i in 0..=60 {
            verdict = verdict.or(gov.record(i as f64 / 60.0, 1.0, 25.0));
        }
        assert!(verdict.is_none());
        assert!(gov.last_fps > 25.0);
    }

    #[test]
    fn test_update_status_uses_peak() {
        let mut state = GameState::new(Tuning::default(), 400.0, 800.0, 1.0);
        state.max_reached_y = 30;
        state.player.grid.y = 2;
        state.update_status();
        assert_eq!(state.difficulty, Difficulty::Hard);
        assert!((state.progress - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_resize_keeps_positions() {
        use crate::sim::lane::Direction;
        let mut state = GameState::new(Tuning::default(), 400.0, 800.0, 1.0);
        let v = Vehicle::new(1, 2, VehicleType::Car, Direction::LeftToRight, 100.0, &state.viewport);
        let before = v.pos;
        state.vehicles.push(v);
        state.resize(800.0, 600.0);
        assert_eq!(state.vehicles[0].pos, before);
        assert_eq!(state.viewport.width, 800.0);
    }
}
