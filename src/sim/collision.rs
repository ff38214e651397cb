//! Player/vehicle hit testing
//!
//! Collisions compare centers along the lane axis only: the player occupies a
//! lane slot, and a vehicle in the same lane is a hit once its center is
//! within the tolerance of that slot. Near misses use the full world-space
//! distance so vehicles in neighbouring lanes count too.

use glam::Vec2;

use super::spatial::{GridPosition, Viewport};
use super::vehicle::{Vehicle, VehicleType};

/// A vehicle that reached the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub vehicle_id: u32,
    pub kind: VehicleType,
    pub distance: f32,
}

/// Center of the player's lane slot in world space
pub fn player_world_pos(grid: GridPosition, viewport: &Viewport) -> Vec2 {
    Vec2::new(viewport.column_center_x(grid.x), viewport.lane_center_y(grid.y))
}

/// Horizontal gap between a vehicle center and the player's slot center
#[inline]
pub fn horizontal_distance(vehicle: &Vehicle, player: GridPosition, viewport: &Viewport) -> f32 {
    (vehicle.pos.x - viewport.column_center_x(player.x)).abs()
}

/// First active same-lane vehicle closer than `tolerance`, in list order
pub fn first_collision(
    vehicles: &[Vehicle],
    player: GridPosition,
    viewport: &Viewport,
    tolerance: f32,
) -> Option<Hit> {
    vehicles
        .iter()
        .filter(|v| v.active && v.lane == player.y)
        .find_map(|v| {
            let distance = horizontal_distance(v, player, viewport);
            (distance < tolerance).then_some(Hit {
                vehicle_id: v.id,
                kind: v.kind,
                distance,
            })
        })
}

/// Flag vehicles passing within the `(min, max)` band and return
/// `(id, distance)` for each one flagged by this call. A vehicle is only
/// ever reported once.
pub fn collect_near_misses(
    vehicles: &mut [Vehicle],
    player: GridPosition,
    viewport: &Viewport,
    min: f32,
    max: f32,
) -> Vec<(u32, f32)> {
    let center = player_world_pos(player, viewport);
    let mut found = Vec::new();
    for v in vehicles.iter_mut().filter(|v| v.active && !v.near_miss_counted) {
        let distance = v.pos.distance(center);
        if distance > min && distance < max {
            v.near_miss_counted = true;
            found.push((v.id, distance));
        }
    }
    found
}
