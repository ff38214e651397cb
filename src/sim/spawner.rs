//! Vehicle spawning
//!
//! Spawn checks run on the slow spawn cadence, once per nearby traffic lane.
//! A rejected check (lane full, spawn edge crowded, or a failed roll) is
//! the common case and not an error.

use super::lane::{Difficulty, Direction, Lane};
use super::rng::RandomSource;
use super::spatial::Viewport;
use super::vehicle::{Vehicle, VehicleType};
use crate::consts::VEHICLE_WIDTH;
use crate::tuning::Tuning;

/// Rush hour lanes weight every vehicle type up
pub const RUSH_HOUR_WEIGHT: f32 = 1.5;
/// Easy lanes lean toward motorbikes and cars
pub const EASY_COMMON_WEIGHT: f32 = 1.2;
/// Expert lanes see more cyclos
pub const EXPERT_CYCLO_WEIGHT: f32 = 2.0;
/// Universal speed jitter applied once at spawn
pub const SPEED_JITTER: (f32, f32) = (0.85, 1.15);

/// Spawning rules for one session
#[derive(Debug, Clone)]
pub struct VehicleSpawner {
    /// Player's chosen difficulty (settings tier)
    pub speed_multiplier: f32,
    spacing_base: f32,
    spacing_speed_reference: f32,
    spacing_floor: f32,
    convoy_spacing: f32,
    next_id: u32,
}

impl VehicleSpawner {
    pub fn new(tuning: &Tuning, speed_multiplier: f32) -> Self {
        Self {
            speed_multiplier,
            spacing_base: tuning.spacing_base,
            spacing_speed_reference: tuning.spacing_speed_reference,
            spacing_floor: tuning.spacing_floor,
            convoy_spacing: tuning.convoy_spacing,
            next_id: 1,
        }
    }

    fn next_vehicle_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Gap a lane needs at its spawn edge; faster lanes need more
    pub fn required_spacing(&self, lane: &Lane) -> f32 {
        let factor = lane.speed() / self.spacing_speed_reference;
        self.spacing_base * factor.max(self.spacing_floor)
    }

    /// Whether a new vehicle may enter `lane` right now (excluding the roll)
    pub fn has_room(&self, lane: &Lane, vehicles: &[Vehicle], viewport: &Viewport) -> bool {
        let index = lane.index;
        let in_lane: Vec<&Vehicle> = vehicles
            .iter()
            .filter(|v| v.active && v.lane == index)
            .collect();

        if in_lane.len() >= lane.max_vehicles() {
            return false;
        }

        let edge = spawn_edge(lane.direction, viewport);
        let spacing = self.required_spacing(lane);
        in_lane.iter().all(|v| (v.pos.x - edge).abs() >= spacing)
    }

    /// Run one spawn check for `lane`
    pub fn try_spawn(
        &mut self,
        lane: &Lane,
        vehicles: &[Vehicle],
        viewport: &Viewport,
        rng: &mut dyn RandomSource,
    ) -> Option<Vehicle> {
        if !lane.is_traffic() || !self.has_room(lane, vehicles, viewport) {
            return None;
        }
        if rng.next_unit() >= lane.spawn_probability() {
            return None;
        }
        Some(self.create_vehicle(lane, viewport, rng))
    }

    /// Build a vehicle for `lane` without any admission checks
    pub fn create_vehicle(
        &mut self,
        lane: &Lane,
        viewport: &Viewport,
        rng: &mut dyn RandomSource,
    ) -> Vehicle {
        let kind = select_vehicle_type(lane, rng);
        let speed = self.compose_speed(lane, kind, rng);
        let id = self.next_vehicle_id();
        Vehicle::new(id, lane.index, kind, lane.direction, speed, viewport)
    }

    /// Lane pace x type modifier x settings multiplier, then jitter
    pub fn compose_speed(&self, lane: &Lane, kind: VehicleType, rng: &mut dyn RandomSource) -> f32 {
        let base = (lane.speed() * kind.speed_modifier() * self.speed_multiplier).abs();
        let (lo, hi) = kind.jitter_range();
        let type_jitter = rng.range(lo, hi);
        let jitter = rng.range(SPEED_JITTER.0, SPEED_JITTER.1);
        base * type_jitter * jitter
    }

    /// A convoy: `count` vehicles trailing each other at a fixed offset
    pub fn create_convoy(
        &mut self,
        lane: &Lane,
        count: usize,
        viewport: &Viewport,
        rng: &mut dyn RandomSource,
    ) -> Vec<Vehicle> {
        let mut convoy: Vec<Vehicle> = Vec::with_capacity(count);
        for _ in 0..count {
            let vehicle = match convoy.last() {
                Some(leader) => self.trail(lane, leader.pos.x, viewport, rng),
                None => self.create_vehicle(lane, viewport, rng),
            };
            convoy.push(vehicle);
        }
        convoy
    }

    /// A vehicle placed one convoy gap behind a leader at `leader_x`
    pub fn trail(
        &mut self,
        lane: &Lane,
        leader_x: f32,
        viewport: &Viewport,
        rng: &mut dyn RandomSource,
    ) -> Vehicle {
        let mut vehicle = self.create_vehicle(lane, viewport, rng);
        vehicle.pos.x = leader_x - self.convoy_spacing * lane.direction.sign();
        vehicle
    }
}

/// X coordinate where vehicles enter a lane
pub fn spawn_edge(direction: Direction, viewport: &Viewport) -> f32 {
    match direction {
        Direction::LeftToRight => -VEHICLE_WIDTH,
        Direction::RightToLeft => viewport.width + VEHICLE_WIDTH,
    }
}

/// Base distribution adjusted for lane conditions
pub fn lane_weights(lane: &Lane) -> Vec<(VehicleType, f32)> {
    lane.vehicle_types
        .iter()
        .map(|&kind| {
            let mut weight = kind.base_weight();
            if lane.has_rush_hour_pattern() {
                weight *= RUSH_HOUR_WEIGHT;
            }
            match (lane.difficulty, kind) {
                (Difficulty::Easy, VehicleType::Motorbike | VehicleType::Car) => {
                    weight *= EASY_COMMON_WEIGHT;
                }
                (Difficulty::Expert, VehicleType::Cyclo) => weight *= EXPERT_CYCLO_WEIGHT,
                _ => {}
            }
            (kind, weight)
        })
        .collect()
}

/// Cumulative-weight scan against one unit draw scaled to the total weight.
///
/// Returns the first type whose cumulative weight reaches the target. A
/// table whose weights sum to zero (or isn't finite) falls back to the first
/// candidate. `None` only for an empty table.
pub fn weighted_pick(weights: &[(VehicleType, f32)], draw: f32) -> Option<VehicleType> {
    let first = weights.first()?.0;
    let total: f32 = weights.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 || !total.is_finite() {
        return Some(first);
    }

    let target = draw * total;
    let mut cumulative = 0.0;
    for &(kind, weight) in weights {
        cumulative += weight.max(0.0);
        if target <= cumulative {
            return Some(kind);
        }
    }
    // Rounding left the target just above the final sum
    Some(weights[weights.len() - 1].0)
}

/// Pick a vehicle type for `lane` using its adjusted weights
pub fn select_vehicle_type(lane: &Lane, rng: &mut dyn RandomSource) -> VehicleType {
    let weights = lane_weights(lane);
    weighted_pick(&weights, rng.next_unit()).unwrap_or(VehicleType::Motorbike)
}
