use crate::error::{CoreError, Result};
use crate::lyrics::DEFAULT_WINDOW_RADIUS;
use crate::playlist::{DEFAULT_VOLUME, MAX_VOLUME};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const TICK_INTERVAL_RANGE: RangeInclusive<u64> = 50..=5000;
const WINDOW_RADIUS_RANGE: RangeInclusive<usize> = 0..=10;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// How often the playback position is polled
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Volume for entries added without one
    #[serde(default = "default_volume")]
    pub default_volume: u8,
    /// Lines shown on each side of the current lyric line
    #[serde(default = "default_window_radius")]
    pub lyric_window_radius: usize,
}

const fn default_tick_interval() -> u64 {
    250
}

const fn default_volume() -> u8 {
    DEFAULT_VOLUME
}

const fn default_window_radius() -> usize {
    DEFAULT_WINDOW_RADIUS
}

impl PlaybackConfig {
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            default_volume: default_volume(),
            lyric_window_radius: default_window_radius(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Music directory; the platform audio directory when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub watch: bool,
    #[serde(default = "default_rescan_debounce")]
    pub rescan_debounce_ms: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_rescan_debounce() -> u64 {
    500
}

impl LibraryConfig {
    /// The configured directory, or the platform default
    #[must_use]
    pub fn directory(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(crate::paths::default_library_dir)
    }

    #[must_use]
    pub const fn rescan_debounce(&self) -> Duration {
        Duration::from_millis(self.rescan_debounce_ms)
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            directory: None,
            watch: default_true(),
            rescan_debounce_ms: default_rescan_debounce(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to ~/.config/tuneline/tuneline.log
    #[serde(default)]
    pub enabled: bool,
}

impl PlayerConfig {
    /// Get the configuration directory path (~/.config/tuneline/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/tuneline/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Parse and validate config text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or a value is out of range.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from an explicit path
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be read, or is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load config from the default location, writing the template on first run
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be created, read, or parsed.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(&config_path, CONFIG_TEMPLATE)?;
            info!("Created default config at {:?}", config_path);
        }

        Self::load_from(&config_path)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] naming the first out-of-range field.
    pub fn validate(&self) -> Result<()> {
        let playback = &self.playback;

        if !TICK_INTERVAL_RANGE.contains(&playback.tick_interval_ms) {
            return Err(invalid(format!(
                "playback.tick_interval_ms must be between {} and {}, got {}",
                TICK_INTERVAL_RANGE.start(),
                TICK_INTERVAL_RANGE.end(),
                playback.tick_interval_ms
            )));
        }
        if playback.default_volume > MAX_VOLUME {
            return Err(invalid(format!(
                "playback.default_volume must be at most {MAX_VOLUME}, got {}",
                playback.default_volume
            )));
        }
        if !WINDOW_RADIUS_RANGE.contains(&playback.lyric_window_radius) {
            return Err(invalid(format!(
                "playback.lyric_window_radius must be between {} and {}, got {}",
                WINDOW_RADIUS_RANGE.start(),
                WINDOW_RADIUS_RANGE.end(),
                playback.lyric_window_radius
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> CoreError {
    CoreError::ConfigInvalid { message }
}

const CONFIG_TEMPLATE: &str = r#"# Tuneline Configuration
# ~/.config/tuneline/config.toml

[playback]
# How often the playback position is polled (50 - 5000)
tick_interval_ms = 250
# Volume for newly added playlist entries (0 - 100)
default_volume = 50
# Lyric lines shown above and below the current one (0 - 10)
lyric_window_radius = 2

[library]
# Music directory (defaults to the platform audio directory)
# directory = "/home/me/Music"
watch = true
rescan_debounce_ms = 500

[logging]
# Also write logs to ~/.config/tuneline/tuneline.log
enabled = false
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_matches_defaults() {
        let config = PlayerConfig::parse(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = PlayerConfig::parse("").unwrap();
        assert_eq!(config.playback.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.playback.default_volume, 50);
        assert_eq!(config.playback.lyric_window_radius, 2);
        assert!(config.library.watch);
        assert_eq!(config.library.rescan_debounce(), Duration::from_millis(500));
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_partial_sections() {
        let config = PlayerConfig::parse(
            r#"
            [playback]
            lyric_window_radius = 4

            [library]
            directory = "/srv/music"
            watch = false
            "#,
        )
        .unwrap();

        assert_eq!(config.playback.lyric_window_radius, 4);
        assert_eq!(config.playback.tick_interval_ms, 250);
        assert_eq!(config.library.directory(), PathBuf::from("/srv/music"));
        assert!(!config.library.watch);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for content in [
            "[playback]\ntick_interval_ms = 10",
            "[playback]\ntick_interval_ms = 6000",
            "[playback]\ndefault_volume = 101",
            "[playback]\nlyric_window_radius = 11",
        ] {
            let err = PlayerConfig::parse(content).unwrap_err();
            assert!(matches!(err, CoreError::ConfigInvalid { .. }), "{content}");
        }
    }

    #[test]
    fn test_malformed_toml() {
        let err = PlayerConfig::parse("[playback\n").unwrap_err();
        assert!(matches!(err, CoreError::ConfigParseError(_)));
    }

    #[test]
    fn test_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(matches!(
            PlayerConfig::load_from(&path),
            Err(CoreError::ConfigNotFound { .. })
        ));

        fs::write(&path, "[logging]\nenabled = true\n").unwrap();
        let config = PlayerConfig::load_from(&path).unwrap();
        assert!(config.logging.enabled);
    }
}
