//! Save/load persistence
//!
//! Features:
//! - Versioned JSON envelope tagged with what it holds
//! - Atomic replace (write tmp, then rename over the target)
//! - Missing or unreadable files fall back to defaults with a warning

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current on-disk format
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported format version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("file holds '{found}', expected '{expected}'")]
    WrongKind { found: String, expected: String },
}

impl PersistenceError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The file simply doesn't exist yet
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == ErrorKind::NotFound)
    }
}

/// Wrapper written around every saved value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u32,
    pub kind: String,
    pub payload: T,
}

/// Serialize `value` into an envelope and atomically replace `path`
pub fn save_json<T: Serialize>(path: &Path, kind: &str, value: &T) -> Result<(), PersistenceError> {
    let envelope = Envelope {
        version: FORMAT_VERSION,
        kind: kind.to_string(),
        payload: value,
    };
    let json = serde_json::to_string_pretty(&envelope)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| PersistenceError::io(dir, e))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json).map_err(|e| PersistenceError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| PersistenceError::io(path, e))?;
    log::debug!("Saved {} to {}", kind, path.display());
    Ok(())
}

/// Read an envelope from `path`, checking version and kind
pub fn load_json<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<T, PersistenceError> {
    let json = fs::read_to_string(path).map_err(|e| PersistenceError::io(path, e))?;
    let envelope: Envelope<T> = serde_json::from_str(&json)?;
    if envelope.version != FORMAT_VERSION {
        return Err(PersistenceError::Version {
            found: envelope.version,
            expected: FORMAT_VERSION,
        });
    }
    if envelope.kind != kind {
        return Err(PersistenceError::WrongKind {
            found: envelope.kind,
            expected: kind.to_string(),
        });
    }
    Ok(envelope.payload)
}

/// Like `load_json`, but any failure yields `T::default()`
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path, kind: &str) -> T {
    match load_json(path, kind) {
        Ok(value) => {
            log::info!("Loaded {} from {}", kind, path.display());
            value
        }
        Err(e) if e.is_not_found() => {
            log::info!("No saved {}, using defaults", kind);
            T::default()
        }
        Err(e) => {
            log::warn!("Ignoring saved {}: {}", kind, e);
            T::default()
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::scratch_path;
    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        a: u32,
        b: String,
    }

    #[test]
    fn test_save_then_load() {
        let path = scratch_path("sample.json");
        let value = Sample {
            a: 7,
            b: "x".into(),
        };
        save_json(&path, "sample", &value).unwrap();
        assert!(!path.with_extension("tmp").exists());
        let back: Sample = load_json(&path, "sample").unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let path = scratch_path("missing.json");
        let err = load_json::<Sample>(&path, "sample").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(load_or_default::<Sample>(&path, "sample"), Sample::default());
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let path = scratch_path("kind.json");
        save_json(&path, "settings", &Sample::default()).unwrap();
        assert!(matches!(
            load_json::<Sample>(&path, "highscore"),
            Err(PersistenceError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_future_version_rejected() {
        let path = scratch_path("version.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"version": 99, "kind": "sample", "payload": {"a": 1, "b": ""}}"#)
            .unwrap();
        assert!(matches!(
            load_json::<Sample>(&path, "sample"),
            Err(PersistenceError::Version { found: 99, .. })
        ));
    }

    #[test]
    fn test_corrupt_falls_back_to_default() {
        let path = scratch_path("corrupt.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_json::<Sample>(&path, "sample"), Err(PersistenceError::Json(_))));
        assert_eq!(load_or_default::<Sample>(&path, "sample"), Sample::default());
    }
}
