//! Boundary to the audio decode/output engine.
//!
//! The core never decodes audio. It drives an [`AudioEngine`] and consumes
//! the [`EngineEvent`]s the engine reports back through the runtime.

use std::path::Path;
use thiserror::Error;

/// Failure categories reported by an audio engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// The media resource could not be resolved or opened
    Resource,
    /// The media format could not be decoded
    Format,
    /// A network stream failed
    Network,
    /// The file or device refused access
    AccessDenied,
    Unknown,
}

impl EngineErrorKind {
    /// Human-readable description shown to the user
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Resource => "Media resource could not be resolved",
            Self::Format => "Media format is not supported",
            Self::Network => "Network error",
            Self::AccessDenied => "Access denied",
            Self::Unknown => "Unknown media error",
        }
    }
}

impl std::fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub detail: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// What an engine notification is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEventKind {
    /// Playback reached the end of the media
    Finished,
    /// The media's length became known
    DurationChanged(u64),
    /// Decoding or output failed mid-playback
    Error(EngineError),
}

/// Notification from the engine, tagged with the load generation it belongs to.
///
/// Events whose generation no longer matches the session are stale and are
/// dropped by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub generation: u64,
    pub kind: EngineEventKind,
}

impl EngineEvent {
    #[must_use]
    pub const fn new(generation: u64, kind: EngineEventKind) -> Self {
        Self { generation, kind }
    }
}

/// Audio engine driven by the playback coordinator.
///
/// Implementations report completion, duration, and mid-playback errors as
/// [`EngineEvent`]s carrying the `generation` passed to the last
/// [`load`](Self::load).
pub trait AudioEngine {
    /// Load a media file, replacing whatever was loaded before.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot open the media.
    fn load(&mut self, path: &Path, generation: u64) -> Result<(), EngineError>;

    fn play(&mut self);

    fn pause(&mut self);

    /// Stop playback and rewind to the start
    fn stop(&mut self);

    fn seek(&mut self, position_ms: u64);

    /// Set output volume, 0 to 100
    fn set_volume(&mut self, volume: u8);

    /// Current playback position in milliseconds
    fn position_ms(&self) -> u64;

    /// Length of the loaded media in milliseconds, 0 when unknown
    fn duration_ms(&self) -> u64;
}
