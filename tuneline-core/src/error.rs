use crate::engine::EngineError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Playback errors
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    // Library errors
    #[error("Failed to watch music directory: {0}")]
    WatcherError(#[from] notify::Error),

    #[error("Player runtime is not running")]
    RuntimeStopped,

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors surfaced when a playlist entry cannot be committed to playback.
///
/// None of these leave the coordinator in a half-updated state: the checks
/// run before anything is mutated, and engine failures stop playback cleanly.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Unsupported audio format: {extension} (file: {path})")]
    FormatUnsupported { path: PathBuf, extension: String },

    #[error("File does not exist: {path}")]
    FileMissing { path: PathBuf },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
