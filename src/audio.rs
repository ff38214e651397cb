//! Sound effect routing
//!
//! The game only decides *what* to play and how loud; a backend behind
//! `AudioSink` does the playing. Native builds ship a silent and a logging
//! backend.

use std::sync::{Arc, Mutex};

use crate::settings::Settings;
use crate::sim::VehicleType;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Player hops a cell
    Hop,
    /// Vehicle brushed past
    NearMiss,
    /// Hit by a vehicle (horn/crash varies by type)
    Crash(VehicleType),
    /// Run ended
    GameOver,
    /// New high score
    HighScore,
}

impl SoundEffect {
    /// Asset name a backend can map to a file
    pub fn asset(&self) -> &'static str {
        match self {
            SoundEffect::Hop => "jump",
            SoundEffect::NearMiss => "whoosh",
            SoundEffect::Crash(VehicleType::Motorbike) => "crash_motorbike",
            SoundEffect::Crash(VehicleType::Car) => "crash_car",
            SoundEffect::Crash(VehicleType::Bus) => "crash_bus",
            SoundEffect::Crash(VehicleType::Cyclo) => "crash_cyclo",
            SoundEffect::GameOver => "game_over",
            SoundEffect::HighScore => "high_score",
        }
    }
}

/// Background music state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicCue {
    Start,
    Pause,
    Stop,
}

/// Audio backend
pub trait AudioSink: Send {
    fn play(&mut self, effect: SoundEffect, volume: f32);
    fn music(&mut self, cue: MusicCue, volume: f32);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _effect: SoundEffect, _volume: f32) {}
    fn music(&mut self, _cue: MusicCue, _volume: f32) {}
}

/// Logs each request at debug level
#[derive(Debug, Default)]
pub struct LoggingAudio;

impl AudioSink for LoggingAudio {
    fn play(&mut self, effect: SoundEffect, volume: f32) {
        log::debug!("sfx {} @ {:.2}", effect.asset(), volume);
    }

    fn music(&mut self, cue: MusicCue, volume: f32) {
        log::debug!("music {:?} @ {:.2}", cue, volume);
    }
}

/// Everything played, for inspection
#[derive(Debug, Default)]
pub struct AudioLog {
    pub effects: Vec<SoundEffect>,
    pub cues: Vec<MusicCue>,
}

/// Records into a shared `AudioLog`
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    log: Arc<Mutex<AudioLog>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effects(&self) -> Vec<SoundEffect> {
        self.log.lock().map(|l| l.effects.clone()).unwrap_or_default()
    }

    pub fn cues(&self) -> Vec<MusicCue> {
        self.log.lock().map(|l| l.cues.clone()).unwrap_or_default()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, effect: SoundEffect, _volume: f32) {
        if let Ok(mut log) = self.log.lock() {
            log.effects.push(effect);
        }
    }

    fn music(&mut self, cue: MusicCue, _volume: f32) {
        if let Ok(mut log) = self.log.lock() {
            log.cues.push(cue);
        }
    }
}

/// Volume-aware front end over a backend
pub struct AudioManager {
    sink: Box<dyn AudioSink>,
    background_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl AudioManager {
    pub fn new(sink: Box<dyn AudioSink>, settings: &Settings) -> Self {
        Self {
            sink,
            background_volume: settings.background_volume.clamp(0.0, 1.0),
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            muted: false,
        }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(SilentAudio), &Settings::default())
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn play(&mut self, effect: SoundEffect) {
        if self.muted || self.sfx_volume <= 0.0 {
            return;
        }
        self.sink.play(effect, self.sfx_volume);
    }

    pub fn music(&mut self, cue: MusicCue) {
        let volume = if self.muted { 0.0 } else { self.background_volume };
        self.sink.music(cue, volume);
    }
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("background_volume", &self.background_volume)
            .field("sfx_volume", &self.sfx_volume)
            .field("muted", &self.muted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muted_skips_effects() {
        let rec = RecordingAudio::new();
        let mut audio = AudioManager::new(Box::new(rec.clone()), &Settings::default());
        audio.play(SoundEffect::Hop);
        audio.set_muted(true);
        audio.play(SoundEffect::Hop);
        audio.music(MusicCue::Stop);
        assert_eq!(rec.effects(), vec![SoundEffect::Hop]);
        assert_eq!(rec.cues(), vec![MusicCue::Stop]);
    }

    #[test]
    fn test_zero_sfx_volume_is_silent() {
        let rec = RecordingAudio::new();
        let settings = Settings {
            sfx_volume: 0.0,
            ..Default::default()
        };
        let mut audio = AudioManager::new(Box::new(rec.clone()), &settings);
        audio.play(SoundEffect::GameOver);
        assert!(rec.effects().is_empty());
    }

    #[test]
    fn test_crash_assets_per_type() {
        assert_eq!(SoundEffect::Crash(VehicleType::Bus).asset(), "crash_bus");
        assert_ne!(
            SoundEffect::Crash(VehicleType::Car).asset(),
            SoundEffect::Crash(VehicleType::Cyclo).asset()
        );
    }
}
