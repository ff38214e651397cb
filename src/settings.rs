//! Game settings and preferences
//!
//! Read once at session start. Only the difficulty tier reaches the
//! simulation; volumes are for the audio sink.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::persistence::{self, PersistenceError};

/// Player-facing difficulty tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyTier {
    Relaxed,
    #[default]
    Normal,
    Frantic,
}

impl DifficultyTier {
    /// Map the stored integer; unknown values read as `Normal`
    pub fn from_index(index: i64) -> Self {
        match index {
            0 => DifficultyTier::Relaxed,
            2 => DifficultyTier::Frantic,
            _ => DifficultyTier::Normal,
        }
    }

    pub fn index(&self) -> i64 {
        match self {
            DifficultyTier::Relaxed => 0,
            DifficultyTier::Normal => 1,
            DifficultyTier::Frantic => 2,
        }
    }

    /// Traffic speed multiplier
    pub fn speed_multiplier(&self) -> f32 {
        match self {
            DifficultyTier::Relaxed => 0.8,
            DifficultyTier::Normal => 1.0,
            DifficultyTier::Frantic => 1.3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyTier::Relaxed => "Relaxed",
            DifficultyTier::Normal => "Normal",
            DifficultyTier::Frantic => "Frantic",
        }
    }
}

/// User settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Stored as an integer (0/1/2) for compatibility with older saves
    pub difficulty_tier: i64,

    // === Audio ===
    /// Background music volume (0.0 - 1.0)
    pub background_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    /// Identifier attached to submitted scores
    pub player_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty_tier: 1,
            background_volume: 0.3,
            sfx_volume: 0.8,
            player_id: String::from("guest"),
        }
    }
}

impl Settings {
    const KIND: &'static str = "settings";

    pub fn tier(&self) -> DifficultyTier {
        DifficultyTier::from_index(self.difficulty_tier)
    }

    /// Multiplier applied to every spawned vehicle's speed
    pub fn speed_multiplier(&self) -> f32 {
        self.tier().speed_multiplier()
    }

    /// Volumes clamped to 0..=1
    pub fn clamped(mut self) -> Self {
        self.background_volume = self.background_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self
    }

    /// Load from disk, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        persistence::load_or_default::<Self>(path, Self::KIND).clamped()
    }

    pub fn save_to(&self, path: &Path) -> Result<(), PersistenceError> {
        persistence::save_json(path, Self::KIND, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}
