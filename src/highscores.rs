//! Best score on this device
//!
//! A single persisted integer. The engine exposes the live score; comparing
//! it against the best and saving happens once, at game over.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::persistence::{self, PersistenceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighScore {
    pub best: u64,
}

impl HighScore {
    const KIND: &'static str = "highscore";

    pub fn new(best: u64) -> Self {
        Self { best }
    }

    /// Whether `score` would set a new record
    pub fn beaten_by(&self, score: u64) -> bool {
        score > self.best
    }

    /// Record `score` if it beats the current best. Returns true on a new
    /// record.
    pub fn submit(&mut self, score: u64) -> bool {
        if !self.beaten_by(score) {
            return false;
        }
        log::info!("New high score: {} (was {})", score, self.best);
        self.best = score;
        true
    }

    pub fn load_from(path: &Path) -> Self {
        persistence::load_or_default(path, Self::KIND)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), PersistenceError> {
        persistence::save_json(path, Self::KIND, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::test_support::scratch_path;

    #[test]
    fn test_submit_only_raises() {
        let mut hs = HighScore::new(100);
        assert!(!hs.submit(50));
        assert!(!hs.submit(100));
        assert_eq!(hs.best, 100);
        assert!(hs.submit(150));
        assert_eq!(hs.best, 150);
    }

    #[test]
    fn test_zero_is_not_a_record() {
        let mut hs = HighScore::default();
        assert!(!hs.submit(0));
    }

    #[test]
    fn test_persisted() {
        let path = scratch_path("best.json");
        assert_eq!(HighScore::load_from(&path), HighScore::default());
        HighScore::new(420).save_to(&path).unwrap();
        assert_eq!(HighScore::load_from(&path).best, 420);
    }
}
