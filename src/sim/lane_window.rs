//! Active lane set around the player
//!
//! Lanes are materialized ahead of the player and dropped once they fall far
//! enough behind. Because `lane_for` is pure, any lane can be rebuilt on
//! demand, so a lookup never fails.

use std::collections::BTreeMap;

use super::lane::{Lane, LaneKind, lane_for};

/// Window extents, in rows relative to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowExtent {
    /// Rows behind the player that must be present
    pub behind: u32,
    /// Rows ahead of the player that must be present
    pub lookahead: u32,
    /// Lanes further behind than this are purged
    pub cleanup: u32,
}

/// Materialized lanes, ordered by index
#[derive(Debug, Clone)]
pub struct LaneWindow {
    lanes: BTreeMap<u32, Lane>,
    extent: WindowExtent,
    initial_lanes: u32,
}

impl LaneWindow {
    /// Create a window seeded with lanes `0..=initial_lanes`
    pub fn new(extent: WindowExtent, initial_lanes: u32) -> Self {
        let mut window = Self {
            lanes: BTreeMap::new(),
            extent,
            initial_lanes,
        };
        window.reset();
        window
    }

    /// Drop everything and regenerate from index 0
    pub fn reset(&mut self) {
        self.lanes.clear();
        for index in 0..=self.initial_lanes {
            self.lanes.insert(index, lane_for(index));
        }
    }

    /// Materialize `[y - behind, y + lookahead]` and purge lanes more than
    /// `cleanup` rows behind `y`. Idempotent.
    pub fn advance_to(&mut self, player_y: u32) {
        let low = player_y.saturating_sub(self.extent.behind);
        let high = player_y.saturating_add(self.extent.lookahead);
        for index in low..=high {
            self.lanes.entry(index).or_insert_with(|| lane_for(index));
        }

        if let Some(threshold) = player_y.checked_sub(self.extent.cleanup) {
            // split_off keeps keys >= threshold
            self.lanes = self.lanes.split_off(&threshold);
        }
    }

    /// Look up a lane, synthesizing (and caching) it if absent
    pub fn lane(&mut self, index: u32) -> &Lane {
        self.lanes.entry(index).or_insert_with(|| lane_for(index))
    }

    pub fn get(&self, index: u32) -> Option<&Lane> {
        self.lanes.get(&index)
    }

    pub fn contains(&self, index: u32) -> bool {
        self.lanes.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    pub fn traffic_lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values().filter(|l| l.kind == LaneKind::Traffic)
    }

    pub fn safe_lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values().filter(|l| l.is_player_safe())
    }

    /// Lanes within `range` rows of the player, ascending
    pub fn lanes_around(&self, player_y: u32, range: u32) -> Vec<&Lane> {
        let low = player_y.saturating_sub(range);
        let high = player_y.saturating_add(range);
        self.lanes.range(low..=high).map(|(_, lane)| lane).collect()
    }

    /// Load shedding: keep only lanes within `lookahead` rows of the player
    pub fn shrink_around(&mut self, player_y: u32) -> usize {
        let before = self.lanes.len();
        let range = self.extent.lookahead;
        self.lanes.retain(|&index, _| index.abs_diff(player_y) <= range);
        before - self.lanes.len()
    }

    pub fn extent(&self) -> WindowExtent {
        self.extent
    }
}
