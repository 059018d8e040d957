/// Viewer configuration
///
/// Stored as JSON in the user's config directory:
/// - Linux: ~/.config/book-of-animals/config.json
/// - macOS: ~/Library/Application Support/book-of-animals/config.json
/// - Windows: %APPDATA%\book-of-animals\config.json
///
/// Every field has a default, so a partial (or missing) file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::quality::Quality;
use crate::error::{BookError, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BookConfig {
    /// Quality tier used at start-up
    pub quality: Quality,

    /// Directory searched (recursively) for entry photographs.
    /// None = `images/` next to the working directory
    pub photo_dir: Option<PathBuf>,

    /// Draw paper grain under page content (med/high tiers only)
    pub paper_grain: bool,

    /// Minimum time between two wheel-triggered page turns
    pub wheel_throttle_ms: u64,

    /// Frame clock period for the animation loop
    pub frame_interval_ms: u64,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            quality: Quality::Med,
            photo_dir: None,
            paper_grain: true,
            wheel_throttle_ms: 400,
            frame_interval_ms: 16,
        }
    }
}

impl BookConfig {
    /// Convert to JSON string for saving
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Where the config file lives, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("book-of-animals");
        path.push("config.json");
        Some(path)
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(BookError::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::from_json(&json).map_err(|source| BookError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the default location, falling back to defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(config) => {
                log::info!("⚙️  Config loaded from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("⚠️  {}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Resolved photo directory
    pub fn photo_dir(&self) -> PathBuf {
        self.photo_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("images"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = BookConfig::from_json(r#"{ "quality": "high" }"#).unwrap();
        assert_eq!(config.quality, Quality::High);
        assert!(config.paper_grain);
        assert_eq!(config.wheel_throttle_ms, 400);
        assert_eq!(config.photo_dir(), PathBuf::from("images"));
    }

    #[test]
    fn test_serialization() {
        let mut config = BookConfig::default();
        config.quality = Quality::Low;
        config.photo_dir = Some(PathBuf::from("/tmp/photos"));

        let json = config.to_json().unwrap();
        let restored = BookConfig::from_json(&json).unwrap();

        assert_eq!(config, restored);
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir().join("book-of-animals-no-such-config.json");
        let config = BookConfig::load_from(&path).unwrap();
        assert_eq!(config, BookConfig::default());
    }

    #[test]
    fn test_bad_json_reports_path() {
        let path = std::env::temp_dir().join(format!(
            "book-of-animals-bad-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ quality: ").unwrap();

        let err = BookConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, BookError::ConfigParse { .. }));

        let _ = std::fs::remove_file(&path);
    }
}
