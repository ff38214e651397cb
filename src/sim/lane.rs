//! Procedural lane generation
//!
//! A lane is a pure function of its index: no RNG, no external state. That
//! lets the active window drop lanes freely and rebuild them later.

use serde::{Deserialize, Serialize};

use super::vehicle::VehicleType;
use crate::consts::*;

/// What kind of row a lane is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneKind {
    /// Row 0, where the player spawns
    Start,
    /// Sidewalk, no traffic
    Safe,
    /// Road with vehicles
    Traffic,
}

impl LaneKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaneKind::Start => "Starting Position",
            LaneKind::Safe => "Safe Sidewalk",
            LaneKind::Traffic => "Traffic Lane",
        }
    }
}

/// Direction of travel along a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl Direction {
    /// +1 for left-to-right, -1 for right-to-left
    #[inline]
    pub fn sign(&self) -> f32 {
        match self {
            Direction::LeftToRight => 1.0,
            Direction::RightToLeft => -1.0,
        }
    }
}

/// Difficulty tiers, ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// Tier for a row index (thresholds at 11, 26 and 51)
    pub fn for_index(index: u32) -> Self {
        match index {
            0..=10 => Difficulty::Easy,
            11..=25 => Difficulty::Medium,
            26..=50 => Difficulty::Hard,
            _ => Difficulty::Expert,
        }
    }

    /// Chance that a spawn check places a vehicle
    pub fn spawn_probability(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.3,
            Difficulty::Medium => 0.8,
            Difficulty::Hard => 0.9,
            Difficulty::Expert => 1.0,
        }
    }

    /// Max vehicles alive in one lane
    pub fn max_vehicles(&self) -> usize {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Medium => 6,
            Difficulty::Hard => 7,
            Difficulty::Expert => 8,
        }
    }

    pub fn speed_multiplier(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 1.3,
            Difficulty::Expert => 1.6,
        }
    }

    /// Lowercase key used in run summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
        }
    }
}

/// One row of the world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub index: u32,
    pub kind: LaneKind,
    /// Meaningful only for traffic lanes
    pub direction: Direction,
    pub vehicle_types: Vec<VehicleType>,
    pub difficulty: Difficulty,
}

/// Build the lane at `index`
pub fn lane_for(index: u32) -> Lane {
    let kind = kind_for(index);
    Lane {
        index,
        kind,
        direction: direction_for(index, kind),
        vehicle_types: vehicle_types_for(index),
        difficulty: Difficulty::for_index(index),
    }
}

fn kind_for(index: u32) -> LaneKind {
    match index {
        0 => LaneKind::Start,
        1 => LaneKind::Safe,
        i if i % SAFE_ZONE_INTERVAL == 0 => LaneKind::Safe,
        _ => LaneKind::Traffic,
    }
}

fn direction_for(index: u32, kind: LaneKind) -> Direction {
    if kind != LaneKind::Traffic {
        return Direction::LeftToRight;
    }
    // Two out of three traffic lanes flow left-to-right
    match index % 3 {
        0 | 1 => Direction::LeftToRight,
        _ => Direction::RightToLeft,
    }
}

fn vehicle_types_for(index: u32) -> Vec<VehicleType> {
    use VehicleType::*;
    match index {
        0..=5 => vec![Motorbike, Car],
        6..=15 => vec![Motorbike, Car, Bus],
        16..=25 => vec![Motorbike, Car, Bus, Cyclo],
        _ => VehicleType::ALL.to_vec(),
    }
}

impl Lane {
    pub fn new(index: u32) -> Self {
        lane_for(index)
    }

    pub fn is_traffic(&self) -> bool {
        self.kind == LaneKind::Traffic
    }

    /// Sidewalks and the start row can't be hit by traffic
    pub fn is_player_safe(&self) -> bool {
        matches!(self.kind, LaneKind::Safe | LaneKind::Start)
    }

    pub fn requires_careful_crossing(&self) -> bool {
        self.is_traffic() && self.difficulty != Difficulty::Easy
    }

    pub fn spawn_probability(&self) -> f32 {
        self.difficulty.spawn_probability()
    }

    pub fn max_vehicles(&self) -> usize {
        self.difficulty.max_vehicles()
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.difficulty.speed_multiplier()
    }

    /// Rush hour rows carry denser traffic
    pub fn has_rush_hour_pattern(&self) -> bool {
        self.index % RUSH_HOUR_INTERVAL == 0 && self.index > RUSH_HOUR_MIN_LANE
    }

    /// Intrinsic pace of the lane (units/sec)
    pub fn speed(&self) -> f32 {
        let variation = LANE_SPEED_VARIATION[(self.index % 7) as usize];
        BASE_LANE_SPEED * self.speed_multiplier() * variation
    }

    /// Rough number of vehicles the lane carries at steady state
    pub fn expected_vehicle_count(&self) -> usize {
        (self.max_vehicles() as f32 * self.spawn_probability()) as usize
    }

    /// Flavor label for the street this lane represents
    pub fn scenario(&self) -> &'static str {
        match self.kind {
            LaneKind::Start => "Starting Position",
            LaneKind::Safe => "Safe Sidewalk",
            LaneKind::Traffic => match self.index % 10 {
                0 => "Quiet residential street",
                1 => "School zone - careful crossing",
                2 => "Market area - mixed traffic",
                3 => "Bus route - large vehicles",
                4 => "Motorbike alley - dense scooters",
                5 => "Main road - fast cars",
                6 => "Tourist area - cyclos present",
                7 => "Rush hour - heavy traffic",
                8 => "Industrial zone - trucks and buses",
                _ => "Traditional quarter - all vehicle types",
            },
        }
    }
}
