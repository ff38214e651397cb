//! Traffic vehicles
//!
//! Speed is stored unsigned; the lane direction decides which way it moves.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::lane::Direction;
use super::spatial::Viewport;
use crate::consts::*;

/// Vehicle kinds found on Saigon streets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    Motorbike,
    Car,
    Bus,
    Cyclo,
}

impl VehicleType {
    /// All kinds, in weighted-selection scan order
    pub const ALL: [VehicleType; 4] = [
        VehicleType::Motorbike,
        VehicleType::Car,
        VehicleType::Bus,
        VehicleType::Cyclo,
    ];

    /// Share of overall traffic
    pub fn base_weight(&self) -> f32 {
        match self {
            VehicleType::Motorbike => 0.70,
            VehicleType::Car => 0.20,
            VehicleType::Bus => 0.08,
            VehicleType::Cyclo => 0.02,
        }
    }

    /// Multiplier on lane speed
    pub fn speed_modifier(&self) -> f32 {
        match self {
            VehicleType::Motorbike => 1.05,
            VehicleType::Car => 1.0,
            VehicleType::Bus => 0.95,
            VehicleType::Cyclo => 0.9,
        }
    }

    /// Per-type speed jitter range applied once at spawn
    pub fn jitter_range(&self) -> (f32, f32) {
        match self {
            // Erratic
            VehicleType::Motorbike => (1.0, 1.3),
            VehicleType::Car => (0.9, 1.1),
            VehicleType::Bus => (0.7, 0.9),
            VehicleType::Cyclo => (0.6, 0.8),
        }
    }

    /// Footprint as a multiple of the grid tile
    pub fn size(&self, tile: f32) -> Vec2 {
        let (w, h) = match self {
            VehicleType::Motorbike => (1.8, 1.2),
            VehicleType::Car => (1.5, 0.8),
            VehicleType::Bus => (2.0, 1.0),
            VehicleType::Cyclo => (1.1, 0.8),
        };
        Vec2::new(w * tile, h * tile)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Motorbike => "motorbike",
            VehicleType::Car => "car",
            VehicleType::Bus => "bus",
            VehicleType::Cyclo => "cyclo",
        }
    }
}

/// A vehicle crossing the screen along one lane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u32,
    pub lane: u32,
    pub kind: VehicleType,
    pub direction: Direction,
    /// Center; y is fixed to the lane centerline
    pub pos: Vec2,
    pub size: Vec2,
    /// Unsigned speed (units/sec)
    pub speed: f32,
    pub active: bool,
    /// Near-miss bonus already paid for this vehicle
    #[serde(default)]
    pub near_miss_counted: bool,
}

impl Vehicle {
    /// Place a new vehicle just off-screen on the side it enters from
    pub fn new(
        id: u32,
        lane: u32,
        kind: VehicleType,
        direction: Direction,
        speed: f32,
        viewport: &Viewport,
    ) -> Self {
        let size = kind.size(viewport.tile_size());
        let x = match direction {
            Direction::LeftToRight => -size.x,
            Direction::RightToLeft => viewport.width + size.x,
        };
        Self {
            id,
            lane,
            kind,
            direction,
            pos: Vec2::new(x, viewport.lane_center_y(lane)),
            size,
            speed: speed.abs(),
            active: true,
            near_miss_counted: false,
        }
    }

    /// Move along the lane by `speed * dt`
    #[inline]
    pub fn advance(&mut self, dt: f32) {
        self.pos.x += self.speed * dt * self.direction.sign();
    }

    /// Deactivate once past the far edge by more than the vehicle's length.
    /// Returns true if this call deactivated it.
    pub fn leave_if_offscreen(&mut self, viewport: &Viewport) -> bool {
        if !self.active {
            return false;
        }
        let gone = match self.direction {
            Direction::LeftToRight => self.pos.x > viewport.width + self.size.x,
            Direction::RightToLeft => self.pos.x < -self.size.x,
        };
        if gone {
            self.active = false;
        }
        gone
    }

    /// Axis-aligned box as (min, max)
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let half = self.size / 2.0;
        (self.pos - half, self.pos + half)
    }

    /// Pseudo-3D scale for rows further up the screen
    pub fn perspective_scale(&self) -> f32 {
        let depth = self.lane.min(MAX_PERSPECTIVE_DISTANCE);
        1.0 - depth as f32 * PERSPECTIVE_SCALE
    }

    pub fn perspective_opacity(&self) -> f32 {
        let depth = self.lane.min(MAX_PERSPECTIVE_DISTANCE);
        1.0 - depth as f32 * PERSPECTIVE_OPACITY_STEP
    }

    /// Draw order: nearer rows on top
    pub fn z_index(&self) -> i32 {
        let lane = i32::try_from(self.lane).unwrap_or(i32::MAX);
        (MAX_PERSPECTIVE_DISTANCE as i32).saturating_sub(lane)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn viewport() -> Viewport {
        Viewport::new(400.0, 800.0, 8)
    }

    #[test]
    fn test_spawn_positions() {
        let vp = viewport();
        let ltr = Vehicle::new(1, 2, VehicleType::Car, Direction::LeftToRight, 100.0, &vp);
        assert_eq!(ltr.pos.x, -75.0); // 1.5 * 50
        assert_eq!(ltr.pos.y, vp.lane_center_y(2));

        let rtl = Vehicle::new(2, 5, VehicleType::Bus, Direction::RightToLeft, 100.0, &vp);
        assert_eq!(rtl.pos.x, 500.0); // 400 + 2.0 * 50
    }

    #[test]
    fn test_speed_stored_unsigned() {
        let v = Vehicle::new(1, 2, VehicleType::Car, Direction::RightToLeft, -120.0, &viewport());
        assert_eq!(v.speed, 120.0);
    }

    #[test]
    fn test_advance_direction_aware() {
        let vp = viewport();
        let mut ltr = Vehicle::new(1, 2, VehicleType::Car, Direction::LeftToRight, 100.0, &vp);
        let mut rtl = Vehicle::new(2, 2, VehicleType::Car, Direction::RightToLeft, 100.0, &vp);
        ltr.advance(0.5);
        rtl.advance(0.5);
        assert_eq!(ltr.pos.x, -25.0);
        assert_eq!(rtl.pos.x, 425.0);
    }

    #[test]
    fn test_leave_if_offscreen() {
        let vp = viewport();
        let mut v = Vehicle::new(1, 2, VehicleType::Car, Direction::LeftToRight, 100.0, &vp);
        v.pos.x = vp.width + v.size.x; // exactly at the margin: still visible
        assert!(!v.leave_if_offscreen(&vp));
        assert!(v.active);
        v.pos.x += 0.1;
        assert!(v.leave_if_offscreen(&vp));
        assert!(!v.active);
        // Already inactive: not reported twice
        assert!(!v.leave_if_offscreen(&vp));

        let mut r = Vehicle::new(2, 3, VehicleType::Cyclo, Direction::RightToLeft, 100.0, &vp);
        r.pos.x = -r.size.x - 1.0;
        assert!(r.leave_if_offscreen(&vp));
    }

    #[test]
    fn test_perspective_helpers() {
        let vp = viewport();
        let near = Vehicle::new(1, 0, VehicleType::Car, Direction::LeftToRight, 1.0, &vp);
        let far = Vehicle::new(2, 9, VehicleType::Car, Direction::LeftToRight, 1.0, &vp);
        assert_eq!(near.perspective_scale(), 1.0);
        assert!((far.perspective_scale() - 0.6).abs() < 1e-6);
        assert!(near.z_index() > far.z_index());
        let (min, max) = near.bounds();
        assert_eq!(max - min, near.size);
    }

    #[test]
    fn test_z_index_far_lanes_stay_ordered() {
        let vp = viewport();
        let far = Vehicle::new(1, 3_000_000_000, VehicleType::Car, Direction::LeftToRight, 1.0, &vp);
        let farthest = Vehicle::new(2, u32::MAX, VehicleType::Car, Direction::LeftToRight, 1.0, &vp);
        assert!(far.z_index() < 0);
        assert!(farthest.z_index() <= far.z_index());
    }

    proptest! {
        #[test]
        fn prop_advance_is_linear(speed in 0.0f32..500.0, dt in 0.0f32..2.0, rtl in any::<bool>()) {
            let direction = if rtl { Direction::RightToLeft } else { Direction::LeftToRight };
            let mut v = Vehicle::new(1, 2, VehicleType::Car, direction, speed, &viewport());
            let start = v.pos.x;
            v.advance(dt);
            prop_assert_eq!(v.pos.x, start + speed * dt * direction.sign());
        }
    }
}
