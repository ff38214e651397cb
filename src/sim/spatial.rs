//! Grid coordinates and screen projection
//!
//! World rows grow away from the bottom of the screen. Projections are pure:
//! they read the viewport passed in and never cache it, so a resize takes
//! effect on the next call.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// A cell on the crossing grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPosition {
    /// Column, 0..tiles_per_row
    pub x: u32,
    /// Row (lane index)
    pub y: u32,
}

impl GridPosition {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Whether the cell lies on a grid `tiles_per_row` columns wide
    pub fn is_within(&self, tiles_per_row: u32) -> bool {
        self.x < tiles_per_row
    }

    /// Euclidean distance in cells
    pub fn distance_to(&self, other: GridPosition) -> f32 {
        distance(*self, other)
    }
}

/// Current screen size (points) and the grid laid over it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub tiles_per_row: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT, 8)
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32, tiles_per_row: u32) -> Self {
        Self {
            width,
            height,
            tiles_per_row: tiles_per_row.max(1),
        }
    }

    /// Side length of one grid tile
    #[inline]
    pub fn tile_size(&self) -> f32 {
        self.width / self.tiles_per_row as f32
    }

    /// Height of one lane row (tile size, capped for tablets)
    #[inline]
    pub fn lane_height(&self) -> f32 {
        self.tile_size().min(MAX_LANE_HEIGHT)
    }

    /// Horizontal center of a grid column
    #[inline]
    pub fn column_center_x(&self, column: u32) -> f32 {
        let tile = self.tile_size();
        column as f32 * tile + tile / 2.0
    }

    /// World y of a lane's centerline (fixed for every vehicle in that lane)
    #[inline]
    pub fn lane_center_y(&self, lane: u32) -> f32 {
        let h = self.lane_height();
        SIDEWALK_HEIGHT + lane as f32 * h + h / 2.0
    }
}

/// Project a grid cell to screen space (y flipped, row 0 at the bottom)
pub fn grid_to_screen(pos: GridPosition, viewport: &Viewport) -> Vec2 {
    let tile = viewport.tile_size();
    Vec2::new(
        pos.x as f32 * tile + tile / 2.0,
        viewport.height - pos.y as f32 * tile - tile / 2.0,
    )
}

/// Alternate isometric projection (diamond tiles, anchored near the bottom)
pub fn grid_to_isometric(pos: GridPosition, viewport: &Viewport) -> Vec2 {
    let (x, y) = (pos.x as f32, pos.y as f32);
    let iso_x = (x - y) * ISO_TILE_WIDTH / 2.0;
    let iso_y = (x + y) * ISO_TILE_HEIGHT / 2.0;
    Vec2::new(
        viewport.width / 2.0 + iso_x,
        viewport.height - ISO_BOTTOM_OFFSET - iso_y,
    )
}

/// Euclidean distance between two cells
pub fn distance(a: GridPosition, b: GridPosition) -> f32 {
    let dx = a.x as f32 - b.x as f32;
    let dy = a.y as f32 - b.y as f32;
    (dx * dx + dy * dy).sqrt()
}
