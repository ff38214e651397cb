//! Session owner
//!
//! Wraps the pure simulation with its collaborators: the random source,
//! settings, score sink, high score and audio. Simulation events are routed
//! to those services here and then queued for the presentation layer to poll.

use serde::Serialize;

use crate::audio::{AudioManager, MusicCue, SoundEffect};
use crate::highscores::HighScore;
use crate::scores::{MemoryScoreSink, ScoreSink};
use crate::settings::Settings;
use crate::sim::{
    self, GameEvent, GamePhase, GameState, GridPosition, RandomSource, Step, lane_for,
};
use crate::tuning::{Tuning, TuningError};

/// Snapshot for a HUD
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub phase: GamePhase,
    pub score: u64,
    pub high_score: u64,
    pub position: GridPosition,
    pub max_reached_y: u32,
    pub lives: u8,
    pub difficulty: &'static str,
    pub progress: f32,
    pub scenario: &'static str,
    pub in_safe_zone: bool,
    pub active_lanes: usize,
    pub active_vehicles: usize,
}

pub struct GameEngine {
    state: GameState,
    rng: Box<dyn RandomSource>,
    settings: Settings,
    scores: Box<dyn ScoreSink>,
    audio: AudioManager,
    high_score: HighScore,
    events: Vec<GameEvent>,
}

impl GameEngine {
    /// Engine in the menu, seeded from `seed`, with an in-memory score sink
    /// and silent audio
    pub fn new(
        tuning: Tuning,
        settings: Settings,
        width: f32,
        height: f32,
        seed: u64,
    ) -> Result<Self, TuningError> {
        tuning.validate()?;
        let state = GameState::new(tuning, width, height, settings.speed_multiplier());
        Ok(Self {
            state,
            rng: Box::new(sim::seeded(seed)),
            settings,
            scores: Box::new(MemoryScoreSink::new()),
            audio: AudioManager::silent(),
            high_score: HighScore::default(),
            events: Vec::new(),
        })
    }

    pub fn with_rng(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_score_sink(mut self, sink: Box<dyn ScoreSink>) -> Self {
        self.scores = sink;
        self
    }

    pub fn with_audio(mut self, audio: AudioManager) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_high_score(mut self, high_score: HighScore) -> Self {
        self.high_score = high_score;
        self
    }

    // === Commands ===

    /// Start a run. Settings are read here and fixed for the session.
    pub fn start_game(&mut self, now: f64) -> bool {
        if self.state.phase != GamePhase::Menu {
            return false;
        }
        self.state.spawner.speed_multiplier = self.settings.speed_multiplier();
        self.state.player_id = self.settings.player_id.clone();
        let started = sim::start_game(&mut self.state, now);
        self.dispatch();
        started
    }

    pub fn pause(&mut self, now: f64) -> bool {
        let ok = sim::pause(&mut self.state, now);
        self.dispatch();
        ok
    }

    pub fn resume(&mut self, now: f64) -> bool {
        let ok = sim::resume(&mut self.state, now);
        self.dispatch();
        ok
    }

    pub fn return_to_menu(&mut self) -> bool {
        let ok = sim::return_to_menu(&mut self.state);
        self.dispatch();
        ok
    }

    pub fn move_player(&mut self, step: Step, now: f64) -> bool {
        let moved = sim::move_player(&mut self.state, step, now);
        self.dispatch();
        moved
    }

    pub fn tick(&mut self, now: f64) {
        sim::tick(&mut self.state, self.rng.as_mut(), now);
        self.dispatch();
    }

    /// Viewport changed (rotation, window resize)
    pub fn resize(&mut self, width: f32, height: f32) {
        self.state.resize(width, height);
    }

    /// Takes effect at the next `start_game`
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.audio.set_muted(muted);
    }

    // === Queries ===

    /// Events since the last call, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn score(&self) -> u64 {
        self.state.score()
    }

    pub fn high_score(&self) -> HighScore {
        self.high_score
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn status(&self) -> EngineStatus {
        let state = &self.state;
        let y = state.player.grid.y;
        let (scenario, in_safe_zone) = match state.lanes.get(y) {
            Some(lane) => (lane.scenario(), lane.is_player_safe()),
            None => {
                let lane = lane_for(y);
                (lane.scenario(), lane.is_player_safe())
            }
        };
        EngineStatus {
            phase: state.phase,
            score: state.score(),
            high_score: self.high_score.best,
            position: state.player.grid,
            max_reached_y: state.max_reached_y,
            lives: state.player.lives,
            difficulty: state.difficulty.display_name(),
            progress: state.progress,
            scenario,
            in_safe_zone,
            active_lanes: state.lanes.len(),
            active_vehicles: state.vehicles.len(),
        }
    }

    /// Route simulation events to services, then queue them for polling
    fn dispatch(&mut self) {
        for event in self.state.drain_events() {
            match &event {
                GameEvent::PlayerMoved { .. } => self.audio.play(SoundEffect::Hop),
                GameEvent::NearMiss { .. } => self.audio.play(SoundEffect::NearMiss),
                GameEvent::Collision { vehicle, .. } => {
                    self.audio.play(SoundEffect::Crash(*vehicle))
                }
                GameEvent::GameOver(summary) => {
                    self.scores.submit(summary);
                    self.audio.music(MusicCue::Stop);
                    self.audio.play(SoundEffect::GameOver);
                    if self.high_score.submit(summary.score) {
                        self.audio.play(SoundEffect::HighScore);
                    }
                }
                GameEvent::PhaseChanged { to, .. } => match to {
                    GamePhase::Playing => self.audio.music(MusicCue::Start),
                    GamePhase::Paused => self.audio.music(MusicCue::Pause),
                    GamePhase::Menu => self.audio.music(MusicCue::Stop),
                    GamePhase::GameOver => {}
                },
                GameEvent::PointsAwarded { .. } | GameEvent::LoadShed { .. } => {}
            }
            self.events.push(event);
        }
    }
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("phase", &self.state.phase)
            .field("score", &self.state.score())
            .field("high_score", &self.high_score)
            .field("audio", &self.audio)
            .finish_non_exhaustive()
    }
}
