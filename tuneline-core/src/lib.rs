pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod events;
pub mod format;
pub mod library;
pub mod lyrics;
pub mod lyrics_source;
pub mod paths;
pub mod playlist;
pub mod playlist_file;
pub mod runtime;
pub mod time;

pub use config::{LibraryConfig, LoggingConfig, PlaybackConfig, PlayerConfig};
pub use coordinator::{PlaybackCoordinator, PlaybackSession};
pub use engine::{AudioEngine, EngineError, EngineErrorKind, EngineEvent, EngineEventKind};
pub use error::{CoreError, PlaybackError};
pub use events::{PlayState, PlayerEvent};
pub use library::LibraryWatcher;
pub use lyrics::{LineChange, LrcMetadata, LyricLine, LyricWindow, LyricsCursor, LyricsIndex};
pub use lyrics_source::{LocalLyricsSource, LyricsRequest, LyricsSource};
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use playlist::{PlaylistEntry, PlaylistStore};
pub use runtime::{PlayerCommand, PlayerHandle, PlayerRuntime};
pub use time::DurationExt;

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
