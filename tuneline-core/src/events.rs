use crate::lyrics::LyricWindow;
use std::path::PathBuf;
use tokio::sync::broadcast;

/// Capacity of the player event channel. Slow subscribers see `Lagged`.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Playback state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl std::fmt::Display for PlayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused => "paused",
        })
    }
}

/// Events published to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The playlist's structure changed (append, remove, move, clear, import)
    PlaylistChanged,
    /// A single entry's volume changed
    ItemVolumeChanged { index: usize, volume: u8 },
    /// Playback position moved
    PositionChanged { position_ms: u64 },
    /// The loaded track reported its length
    DurationChanged { duration_ms: u64 },
    /// Stopped / Playing / Paused transition
    StateChanged { state: PlayState },
    /// A new playlist entry became the current track
    CurrentTrackChanged {
        index: usize,
        title: String,
        path: PathBuf,
    },
    /// Playback of an entry failed or was refused
    TrackError { message: String },
    /// The engine reached the end of the current track
    TrackFinished,
    /// Lyrics were loaded for the current track
    LyricsLoaded { line_count: usize },
    /// No lyrics exist for the current track
    LyricsNotFound,
    /// The highlighted lyric line changed
    LyricLineChanged {
        index: Option<usize>,
        window: LyricWindow,
    },
    /// The local music directory listing changed
    LibraryUpdated { songs: Vec<String> },
}

/// Create the broadcast channel shared by the playlist store and the coordinator
#[must_use]
pub fn event_channel() -> broadcast::Sender<PlayerEvent> {
    let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    tx
}
