//! Chaotic Street entry point
//!
//! Native headless demo: an autopilot thread walks the pedestrian forward
//! while the main thread runs the fixed-rate loop, then the run is scored.
//!
//! Environment:
//! - `RUST_LOG`: log filter (env_logger)
//! - `CHAOTIC_STREET_DIR`: where settings, high score and runs live
//! - `CHAOTIC_STREET_TUNING`: optional tuning JSON
//! - `CHAOTIC_STREET_SEED`: RNG seed (defaults to the current time)

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Chaotic Street (native) starting...");

    if let Err(e) = native::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No web front end; the library is the product there
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::thread;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use chaotic_street::audio::{AudioManager, LoggingAudio};
    use chaotic_street::consts::{DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH};
    use chaotic_street::platform::{Command, GameRunner, InputHandle, StopReason, SystemClock};
    use chaotic_street::scores::{JsonLinesSink, top_runs};
    use chaotic_street::sim::{GameEvent, Step};
    use chaotic_street::{GameEngine, HighScore, Settings, Tuning, TuningError};

    /// Longest a demo run may last (seconds)
    const RUN_LIMIT: f64 = 60.0;

    fn data_dir() -> PathBuf {
        std::env::var_os("CHAOTIC_STREET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".chaotic-street"))
    }

    fn seed() -> u64 {
        std::env::var("CHAOTIC_STREET_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| {
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0)
            })
    }

    fn tuning() -> Result<Tuning, TuningError> {
        match std::env::var_os("CHAOTIC_STREET_TUNING") {
            Some(path) => Tuning::load(PathBuf::from(path)),
            None => Ok(Tuning::default()),
        }
    }

    /// Mostly forward, with a sidestep now and then
    fn autopilot(input: InputHandle) {
        input.send(Command::Start);
        let pattern = [
            Step::Forward,
            Step::Forward,
            Step::Right,
            Step::Forward,
            Step::Forward,
            Step::Left,
        ];
        for step in pattern.iter().cycle() {
            thread::sleep(Duration::from_millis(350));
            if !input.send(Command::Move(*step)) {
                break;
            }
        }
    }

    pub fn run() -> Result<(), TuningError> {
        let dir = data_dir();
        let settings_path = dir.join("settings.json");
        let high_score_path = dir.join("highscore.json");
        let runs_path = dir.join("runs.jsonl");

        let settings = Settings::load_from(&settings_path);
        let tuning = tuning()?;
        let tick_rate = tuning.tick_rate_hz;
        let seed = seed();
        log::info!("Seed {}, difficulty {}", seed, settings.tier().as_str());

        let mut engine = GameEngine::new(
            tuning,
            settings.clone(),
            DEFAULT_SCREEN_WIDTH,
            DEFAULT_SCREEN_HEIGHT,
            seed,
        )?
        .with_score_sink(Box::new(JsonLinesSink::new(&runs_path)))
        .with_audio(AudioManager::new(Box::new(LoggingAudio), &settings))
        .with_high_score(HighScore::load_from(&high_score_path));

        let mut runner = GameRunner::new(SystemClock::new(), tick_rate);
        let input = runner.input();
        // Detached: it exits on its next send once the runner is gone
        thread::spawn(move || autopilot(input));

        let reason = runner.run(&mut engine, RUN_LIMIT);
        let status = engine.status();
        log::info!(
            "Stopped ({:?}) after {} ticks: row {}, {} vehicles, {} lanes",
            reason,
            runner.ticks(),
            status.position.y,
            status.active_vehicles,
            status.active_lanes
        );

        let summary = engine.drain_events().into_iter().find_map(|e| match e {
            GameEvent::GameOver(summary) => Some(summary),
            _ => None,
        });
        match (reason, summary) {
            (StopReason::GameOver, Some(s)) => println!(
                "Game over: {} points, {} rows, {} traffic, {:.1}s",
                s.score, s.distance, s.difficulty, s.time_alive
            ),
            _ => println!("Survived the demo with {} points", engine.score()),
        }

        if let Err(e) = engine.high_score().save_to(&high_score_path) {
            log::warn!("Could not save high score: {}", e);
        }
        println!("Best: {}", engine.high_score().best);

        if let Ok(top) = top_runs(&runs_path, 5) {
            for (rank, run) in top.iter().enumerate() {
                println!("{:>2}. {:>6}  row {:>3}  {}", rank + 1, run.score, run.distance, run.player_id);
            }
        }
        Ok(())
    }
}
