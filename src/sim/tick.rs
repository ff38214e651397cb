//! Session transitions, player moves and the per-tick update
//!
//! Everything takes an explicit `now` (seconds, any monotonic origin) so the
//! caller owns the clock and tests can drive time directly.

use super::collision::{collect_near_misses, first_collision};
use super::rng::RandomSource;
use super::schedule::Deferred;
use super::state::{GameEvent, GamePhase, GameState, ScoreReason, Step, TickClock};

/// Menu -> Playing with a fresh session
pub fn start_game(state: &mut GameState, now: f64) -> bool {
    if state.phase != GamePhase::Menu {
        return false;
    }
    state.reset_session();
    state.clock = TickClock::start(now);
    state.governor.rebase(now);
    state.lanes.advance_to(state.player.grid.y);
    state.update_status();
    state.set_phase(GamePhase::Playing);
    log::info!(
        "Session {} started (speed x{:.1})",
        state.session,
        state.spawner.speed_multiplier
    );
    true
}

/// Playing -> Paused. Pending move unlocks are dropped and the lock is
/// released so a resumed run is never stuck mid-hop.
pub fn pause(state: &mut GameState, now: f64) -> bool {
    if state.phase != GamePhase::Playing {
        return false;
    }
    state.deferred.cancel_all();
    state.player.finish_moving();
    state.clock.suspend(now);
    state.set_phase(GamePhase::Paused);
    true
}

/// Paused -> Playing; the paused gap is never replayed
pub fn resume(state: &mut GameState, now: f64) -> bool {
    if state.phase != GamePhase::Paused {
        return false;
    }
    state.clock.resume(now);
    state.governor.rebase(now);
    state.set_phase(GamePhase::Playing);
    true
}

/// GameOver, Paused or Menu -> Menu with everything reset
pub fn return_to_menu(state: &mut GameState) -> bool {
    match state.phase {
        GamePhase::GameOver | GamePhase::Paused | GamePhase::Menu => {
            state.reset_session();
            state.set_phase(GamePhase::Menu);
            true
        }
        GamePhase::Playing => false,
    }
}

/// Run deferred actions that have come due for the current session
fn fire_deferred(state: &mut GameState, now: f64) {
    for action in state.deferred.take_due(now, state.session) {
        match action {
            Deferred::FinishMove => state.player.finish_moving(),
        }
    }
}

/// Apply a one-cell move. Returns false (and changes nothing) when the
/// move is rejected.
pub fn move_player(state: &mut GameState, step: Step, now: f64) -> bool {
    fire_deferred(state, now);

    if state.phase != GamePhase::Playing || state.player.moving || !state.player.alive {
        return false;
    }
    let Some(target) = step.target(state.player.grid, state.tuning.tiles_per_row) else {
        return false;
    };

    let player = &mut state.player;
    player.grid = target;
    player.facing = step.facing();
    player.moving = true;
    state.push_event(GameEvent::PlayerMoved {
        to: target,
        facing: step.facing(),
    });

    // Points only for new ground
    if step == Step::Forward && target.y > state.max_reached_y {
        state.max_reached_y = target.y;
        state.award(ScoreReason::Step, state.tuning.points_per_step);

        let tuning = &state.tuning;
        if tuning.milestone_bonus_enabled && target.y % tuning.milestone_interval == 0 {
            let bonus = tuning.milestone_bonus;
            log::info!("Milestone at row {}", target.y);
            state.award(ScoreReason::Milestone, bonus);
        }
    }
    state.update_status();

    let settle = match step {
        Step::Forward => state.tuning.forward_settle,
        _ => state.tuning.move_settle,
    };
    state
        .deferred
        .schedule(now + settle, state.session, Deferred::FinishMove);
    true
}

/// Advance the simulation to `now`
pub fn tick(state: &mut GameState, rng: &mut dyn RandomSource, now: f64) {
    if state.phase != GamePhase::Playing {
        return;
    }
    fire_deferred(state, now);
    state.time_ticks += 1;

    let dt = state.clock.delta(now);
    let viewport = state.viewport;
    for vehicle in state.vehicles.iter_mut().filter(|v| v.active) {
        vehicle.advance(dt);
        vehicle.leave_if_offscreen(&viewport);
    }

    if let Some(hit) = first_collision(
        &state.vehicles,
        state.player.grid,
        &viewport,
        state.tuning.collision_tolerance,
    ) {
        log::info!(
            "Hit by {} #{} at row {} ({:.1} away)",
            hit.kind.as_str(),
            hit.vehicle_id,
            state.player.grid.y,
            hit.distance
        );
        state.push_event(GameEvent::Collision {
            vehicle_id: hit.vehicle_id,
            vehicle: hit.kind,
            distance: hit.distance,
        });
        game_over(state, now);
        return;
    }

    let near_misses = collect_near_misses(
        &mut state.vehicles,
        state.player.grid,
        &viewport,
        state.tuning.near_miss_min,
        state.tuning.near_miss_max,
    );
    for (vehicle_id, distance) in near_misses {
        state.push_event(GameEvent::NearMiss {
            vehicle_id,
            distance,
        });
        state.award(ScoreReason::NearMiss, state.tuning.near_miss_bonus);
    }

    state.vehicles.retain(|v| v.active);
    state.update_status();
    state.lanes.advance_to(state.player.grid.y);

    if state.clock.spawn_due(now, state.tuning.spawn_interval) {
        spawn_pass(state, rng);
    }

    let (window, min_fps) = (state.tuning.perf_window, state.tuning.perf_min_fps);
    if let Some(fps) = state.governor.record(now, window, min_fps) {
        shed_load(state, fps);
    }
}

fn game_over(state: &mut GameState, now: f64) {
    state.player.die();
    state.deferred.cancel_all();
    state.set_phase(GamePhase::GameOver);
    let summary = state.run_summary(now);
    log::info!(
        "Game over: score {} at row {} ({}, {:.1}s)",
        summary.score,
        summary.distance,
        summary.difficulty,
        summary.time_alive
    );
    state.push_event(GameEvent::GameOver(summary));
}

/// One spawn check per traffic lane near the player, then the global cap
fn spawn_pass(state: &mut GameState, rng: &mut dyn RandomSource) {
    let y = state.player.grid.y;
    let GameState {
        lanes,
        spawner,
        vehicles,
        viewport,
        tuning,
        ..
    } = state;

    let nearby: Vec<u32> = lanes
        .lanes_around(y, tuning.lookahead)
        .into_iter()
        .filter(|l| l.is_traffic())
        .map(|l| l.index)
        .collect();

    for index in nearby {
        let Some(lane) = lanes.get(index) else {
            continue;
        };
        let in_lane = vehicles.iter().filter(|v| v.active && v.lane == index).count();
        let pair_fits = in_lane + 2 <= lane.max_vehicles();

        let Some(leader) = spawner.try_spawn(lane, vehicles.as_slice(), viewport, rng) else {
            continue;
        };
        let leader_x = leader.pos.x;
        vehicles.push(leader);

        if tuning.rush_hour_convoys && lane.has_rush_hour_pattern() && pair_fits {
            vehicles.push(spawner.trail(lane, leader_x, viewport, rng));
        }
    }

    let cap = tuning.max_active_vehicles;
    if vehicles.len() > cap {
        let excess = vehicles.len() - cap;
        vehicles.drain(..excess);
        log::trace!("Trimmed {} vehicles over the cap", excess);
    }
}

/// Drop the oldest vehicles and far lanes after a slow window
fn shed_load(state: &mut GameState, fps: f32) {
    let threshold = state.tuning.perf_vehicle_threshold;
    let vehicles_dropped = if state.vehicles.len() > threshold {
        let n = state.tuning.perf_vehicle_drop.min(state.vehicles.len());
        state.vehicles.drain(..n);
        n
    } else {
        0
    };
    let lanes_dropped = state.lanes.shrink_around(state.player.grid.y);

    log::warn!(
        "Running at {:.1} fps, shed {} vehicles and {} lanes",
        fps,
        vehicles_dropped,
        lanes_dropped
    );
    state.push_event(GameEvent::LoadShed {
        fps,
        vehicles_dropped,
        lanes_dropped,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::lane::Direction;
    use crate::sim::rng::{ScriptedRng, seeded};
    use crate::sim::spatial::GridPosition;
    use crate::sim::vehicle::{Vehicle, VehicleType};
    use crate::tuning::Tuning;

    const DT: f64 = 1.0 / 60.0;

    fn new_state() -> GameState {
        GameState::new(Tuning::default(), 400.0, 800.0, 1.0)
    }

    fn playing() -> GameState {
        let mut state = new_state();
        assert!(start_game(&mut state, 0.0));
        state
    }

    /// Never passes a spawn roll
    fn quiet_rng() -> ScriptedRng {
        ScriptedRng::constant(0.99)
    }

    fn parked(state: &GameState, id: u32, lane: u32, x: f32) -> Vehicle {
        let mut v = Vehicle::new(id, lane, VehicleType::Car, Direction::LeftToRight, 0.0, &state.viewport);
        v.pos.x = x;
        v
    }

    fn game_over_count(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver(_)))
            .count()
    }

    #[test]
    fn test_five_forward_moves() {
        let mut state = playing();
        for i in 0..5 {
            assert!(move_player(&mut state, Step::Forward, i as f64));
        }
        assert_eq!(state.score(), 50);
        assert_eq!(state.player.grid, GridPosition::new(4, 5));
        assert!(state.player.alive);
    }

    #[test]
    fn test_move_locked_until_settled() {
        let mut state = playing();
        assert!(move_player(&mut state, Step::Forward, 0.0));
        assert!(!move_player(&mut state, Step::Forward, 0.1));
        assert!(move_player(&mut state, Step::Forward, 0.16));
        assert!(!move_player(&mut state, Step::Left, 0.3));
        // Sideways settles slower
        assert!(move_player(&mut state, Step::Left, 0.35));
        assert!(!move_player(&mut state, Step::Left, 0.5));
        assert!(move_player(&mut state, Step::Left, 0.56));
    }

    #[test]
    fn test_no_points_for_revisited_rows() {
        let mut state = playing();
        move_player(&mut state, Step::Forward, 0.0);
        move_player(&mut state, Step::Backward, 1.0);
        move_player(&mut state, Step::Forward, 2.0);
        assert_eq!(state.score(), 10);
        assert_eq!(state.max_reached_y, 1);
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut state = playing();
        state.player.grid = GridPosition::new(0, 0);
        assert!(!move_player(&mut state, Step::Left, 0.0));
        assert!(!move_player(&mut state, Step::Backward, 0.0));
        assert_eq!(state.player.grid, GridPosition::new(0, 0));
        assert!(!state.player.moving);

        state.player.grid = GridPosition::new(7, 0);
        assert!(!move_player(&mut state, Step::Right, 0.0));
    }

    #[test]
    fn test_moves_rejected_outside_playing() {
        let mut state = new_state();
        assert!(!move_player(&mut state, Step::Forward, 0.0));
        start_game(&mut state, 0.0);
        pause(&mut state, 0.0);
        assert!(!move_player(&mut state, Step::Forward, 0.0));
    }

    #[test]
    fn test_milestone_bonus_when_enabled() {
        let mut state = new_state();
        state.tuning.milestone_bonus_enabled = true;
        start_game(&mut state, 0.0);
        for i in 0..10 {
            move_player(&mut state, Step::Forward, i as f64);
        }
        assert_eq!(state.score(), 200);

        let mut plain = playing();
        for i in 0..10 {
            move_player(&mut plain, Step::Forward, i as f64);
        }
        assert_eq!(plain.score(), 100);
    }

    #[test]
    fn test_collision_ends_game_once() {
        let mut state = playing();
        state.player.grid = GridPosition::new(4, 3);
        let x = state.viewport.column_center_x(4) + 10.0;
        let v = parked(&state, 99, 3, x);
        state.vehicles.push(v);
        state.drain_events();

        let mut rng = quiet_rng();
        tick(&mut state, &mut rng, 2.0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(!state.player.alive);
        assert_eq!(state.player.lives, 2);

        tick(&mut state, &mut rng, 2.0 + DT);
        let events = state.drain_events();
        assert_eq!(game_over_count(&events), 1);

        let summary = events
            .iter()
            .find_map(|e| match e {
                GameEvent::GameOver(s) => Some(s.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(summary.distance, 3);
        assert_eq!(summary.difficulty, "easy");
        assert!((summary.time_alive - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_near_miss_awarded_once() {
        let mut state = playing();
        state.player.grid = GridPosition::new(4, 3);
        let x = state.viewport.column_center_x(4) + 60.0;
        let v = parked(&state, 5, 3, x);
        state.vehicles.push(v);

        let mut rng = quiet_rng();
        tick(&mut state, &mut rng, DT);
        tick(&mut state, &mut rng, 2.0 * DT);
        assert_eq!(state.score(), 25);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_pause_resume_has_no_time_jump() {
        let mut state = playing();
        let mut v = parked(&state, 1, 2, 100.0);
        v.speed = 100.0;
        state.vehicles.push(v);
        let mut rng = quiet_rng();

        tick(&mut state, &mut rng, DT);
        let before = state.vehicles[0].pos.x;

        assert!(pause(&mut state, 0.02));
        tick(&mut state, &mut rng, 2.0);
        assert_eq!(state.vehicles[0].pos.x, before);

        assert!(resume(&mut state, 5.02));
        tick(&mut state, &mut rng, 5.02 + DT);
        let moved = state.vehicles[0].pos.x - before;
        assert!(moved < 2.0, "moved {moved}");
    }

    #[test]
    fn test_pause_cancels_pending_unlock() {
        let mut state = playing();
        assert!(move_player(&mut state, Step::Forward, 0.0));
        pause(&mut state, 0.05);
        assert!(!state.player.moving);
        assert!(state.deferred.is_empty());
        resume(&mut state, 1.0);
        assert!(move_player(&mut state, Step::Forward, 1.0));
    }

    #[test]
    fn test_reset_drops_stale_unlock() {
        let mut state = playing();
        move_player(&mut state, Step::Forward, 0.0);
        pause(&mut state, 0.01);
        assert!(return_to_menu(&mut state));
        assert_eq!(state.phase, GamePhase::Menu);
        assert_eq!(state.score(), 0);
        assert!(state.vehicles.is_empty());
        assert_eq!(state.lanes.len() as u32, state.tuning.initial_lanes + 1);

        // An unlock scheduled under an old session never touches the new one
        start_game(&mut state, 10.0);
        state.deferred.schedule(0.0, state.session - 1, Deferred::FinishMove);
        state.player.moving = true;
        fire_deferred(&mut state, 20.0);
        assert!(state.player.moving);
    }

    #[test]
    fn test_transition_guards() {
        let mut state = new_state();
        assert!(!pause(&mut state, 0.0));
        assert!(!resume(&mut state, 0.0));
        assert!(start_game(&mut state, 0.0));
        assert!(!start_game(&mut state, 0.0));
        assert!(!return_to_menu(&mut state));
        assert!(pause(&mut state, 0.0));
        assert!(resume(&mut state, 0.0));
    }

    #[test]
    fn test_spawn_respects_cap() {
        let mut state = new_state();
        state.tuning.max_active_vehicles = 3;
        start_game(&mut state, 0.0);
        let mut rng = ScriptedRng::constant(0.0);
        tick(&mut state, &mut rng, 0.25);
        assert!(!state.vehicles.is_empty());
        assert!(state.vehicles.len() <= 3);
    }

    #[test]
    fn test_spawns_only_in_traffic_lanes() {
        let mut state = playing();
        let mut rng = ScriptedRng::constant(0.0);
        tick(&mut state, &mut rng, 0.25);
        assert!(!state.vehicles.is_empty());
        for v in &state.vehicles {
            assert!(state.lanes.get(v.lane).unwrap().is_traffic());
        }
    }

    #[test]
    fn test_rush_hour_lane_spawns_pair() {
        let mut state = playing();
        let lane = 35;
        state.player.grid = GridPosition::new(4, lane);
        state.max_reached_y = lane;
        let mut rng = ScriptedRng::constant(0.0);
        tick(&mut state, &mut rng, 0.25);
        let in_lane: Vec<&Vehicle> = state.vehicles.iter().filter(|v| v.lane == lane).collect();
        assert_eq!(in_lane.len(), 2);
        assert!((in_lane[0].pos.x - in_lane[1].pos.x).abs() > 100.0);
    }

    #[test]
    fn test_governor_sheds_load() {
        let mut state = playing();
        for id in 0..40 {
            let v = parked(&state, 1000 + id, 2, -1000.0);
            state.vehicles.push(v);
        }
        let mut rng = quiet_rng();
        for i in 1..=10 {
            tick(&mut state, &mut rng, i as f64 * 0.1);
        }
        assert_eq!(state.vehicles.len(), 30);
        // Oldest went first
        assert_eq!(state.vehicles[0].id, 1010);
        let events = state.drain_events();
        // Lanes 11..=15 sit beyond the lookahead from row 0
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::LoadShed {
                vehicles_dropped: 10,
                lanes_dropped: 5,
                ..
            }
        )));
        let lookahead = state.tuning.lookahead;
        assert!(state.lanes.iter().all(|l| l.index <= lookahead));
        assert_eq!(state.lanes.len(), lookahead as usize + 1);
    }

    #[test]
    fn test_offscreen_vehicles_removed() {
        let mut state = playing();
        let mut v = parked(&state, 1, 2, 399.0);
        v.speed = 1000.0;
        state.vehicles.push(v);
        tick(&mut state, &mut quiet_rng(), 0.5);
        assert!(state.vehicles.iter().all(|v| v.id != 1));
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed: u64| {
            let mut state = playing();
            let mut rng = seeded(seed);
            for i in 1..=600 {
                if i % 90 == 0 {
                    move_player(&mut state, Step::Forward, i as f64 * DT);
                }
                tick(&mut state, &mut rng, i as f64 * DT);
            }
            let snapshot: Vec<(u32, u32, f32)> =
                state.vehicles.iter().map(|v| (v.id, v.lane, v.pos.x)).collect();
            (snapshot, state.score(), state.phase)
        };
        assert_eq!(run(42), run(42));
    }
}
