//! Platform abstraction layer
//!
//! Handles the host-facing side of a session:
//! - Time (system or manual clock)
//! - Input commands from other threads
//! - The fixed-rate loop that interleaves commands and ticks

pub mod input;
pub mod time;

pub use input::{Command, InputHandle, InputQueue};
pub use time::{Clock, ManualClock, SystemClock};

use crate::engine::GameEngine;
use crate::sim::GamePhase;

/// Why `GameRunner::run` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    GameOver,
    Quit,
    TimeLimit,
}

/// Drives an engine at a fixed target rate. Commands are applied before each
/// tick, never during one.
#[derive(Debug)]
pub struct GameRunner<C: Clock> {
    clock: C,
    input: InputQueue,
    interval: f64,
    ticks: u64,
    quit: bool,
}

impl<C: Clock> GameRunner<C> {
    pub fn new(clock: C, tick_rate_hz: f32) -> Self {
        Self {
            clock,
            input: InputQueue::new(),
            interval: 1.0 / tick_rate_hz.max(1.0) as f64,
            ticks: 0,
            quit: false,
        }
    }

    pub fn input(&self) -> InputHandle {
        self.input.handle()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn apply(&mut self, engine: &mut GameEngine, command: Command, now: f64) {
        let accepted = match command {
            Command::Start => engine.start_game(now),
            Command::Move(step) => engine.move_player(step, now),
            Command::Pause => engine.pause(now),
            Command::Resume => engine.resume(now),
            Command::Menu => engine.return_to_menu(),
            Command::Resize { width, height } => {
                engine.resize(width, height);
                true
            }
            Command::Quit => {
                self.quit = true;
                true
            }
        };
        if !accepted {
            log::trace!("Ignored {:?} in {:?}", command, engine.phase());
        }
    }

    /// Apply queued commands, then tick once
    pub fn step(&mut self, engine: &mut GameEngine) {
        let now = self.clock.now();
        for command in self.input.drain() {
            self.apply(engine, command, now);
        }
        engine.tick(now);
        self.ticks += 1;
    }

    /// Loop until game over, a quit command, or `limit` seconds pass
    pub fn run(&mut self, engine: &mut GameEngine, limit: f64) -> StopReason {
        let start = self.clock.now();
        let mut next = start;
        loop {
            self.step(engine);
            if self.quit {
                return StopReason::Quit;
            }
            if engine.phase() == GamePhase::GameOver {
                return StopReason::GameOver;
            }
            let now = self.clock.now();
            if now - start >= limit {
                return StopReason::TimeLimit;
            }

            next += self.interval;
            // Fell behind: drop the backlog instead of bursting ticks
            if next < now {
                next = now;
            }
            self.clock.sleep(next - now);
        }
    }
}
