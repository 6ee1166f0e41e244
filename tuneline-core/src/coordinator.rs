//! Playback state machine binding the playlist, the audio engine, and the lyric index.

use crate::engine::{AudioEngine, EngineEvent, EngineEventKind};
use crate::error::PlaybackError;
use crate::events::{event_channel, PlayState, PlayerEvent};
use crate::format;
use crate::lyrics::{LyricWindow, LyricsCursor, LyricsIndex, DEFAULT_WINDOW_RADIUS};
use crate::lyrics_source::LyricsRequest;
use crate::playlist::{PlaylistEntry, PlaylistStore};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// What the coordinator considers "now playing".
///
/// `current_index` is a position in the playlist, renumbered on every
/// structural mutation; it never points past the end of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackSession {
    pub current_index: Option<usize>,
    pub state: PlayState,
    pub position_ms: u64,
    pub duration_ms: u64,
    /// Bumped on every load and stop; engine events and lyric loads from older generations are stale
    pub generation: u64,
}

/// Drives an [`AudioEngine`] from playlist navigation and keeps the lyric line in sync.
pub struct PlaybackCoordinator<E: AudioEngine> {
    engine: E,
    playlist: PlaylistStore,
    lyrics: LyricsIndex,
    cursor: LyricsCursor,
    session: PlaybackSession,
    window_radius: usize,
    pending_lyrics: Option<LyricsRequest>,
    library: Vec<String>,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl<E: AudioEngine> PlaybackCoordinator<E> {
    /// Create a coordinator with an empty playlist
    pub fn new(engine: E) -> Self {
        let event_tx = event_channel();
        Self {
            engine,
            playlist: PlaylistStore::new(event_tx.clone()),
            lyrics: LyricsIndex::new(),
            cursor: LyricsCursor::new(),
            session: PlaybackSession::default(),
            window_radius: DEFAULT_WINDOW_RADIUS,
            pending_lyrics: None,
            library: Vec::new(),
            event_tx,
        }
    }

    /// Set how many lines on each side of the current one go into lyric windows
    #[must_use]
    pub fn with_window_radius(mut self, radius: usize) -> Self {
        self.window_radius = radius;
        self
    }

    /// Subscribe to player events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }

    #[must_use]
    pub const fn session(&self) -> &PlaybackSession {
        &self.session
    }

    #[must_use]
    pub const fn playlist(&self) -> &PlaylistStore {
        &self.playlist
    }

    #[must_use]
    pub const fn lyrics(&self) -> &LyricsIndex {
        &self.lyrics
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Last library listing received from the directory scanner
    #[must_use]
    pub fn library(&self) -> &[String] {
        &self.library
    }

    /// The entry currently selected for playback
    #[must_use]
    pub fn current_entry(&self) -> Option<&PlaylistEntry> {
        self.session.current_index.and_then(|i| self.playlist.at(i))
    }

    /// Lyric window around the currently highlighted line
    #[must_use]
    pub fn current_window(&self) -> LyricWindow {
        self.cursor
            .current()
            .map(|i| self.lyrics.window_around(i, self.window_radius))
            .unwrap_or_default()
    }

    /// Take the outstanding lyric load for the current track, if any
    pub fn take_lyrics_request(&mut self) -> Option<LyricsRequest> {
        self.pending_lyrics.take()
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    /// Load and play the entry at `index`.
    ///
    /// An out-of-range index is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, its format isn't supported,
    /// or the engine fails to load it. The first two leave playback untouched;
    /// an engine failure stops playback.
    pub fn select_and_play(&mut self, index: usize) -> Result<(), PlaybackError> {
        let Some(entry) = self.playlist.at(index).cloned() else {
            debug!("Ignoring selection of playlist index {index} (count {})", self.playlist.count());
            return Ok(());
        };

        if !entry.path.exists() {
            return Err(self.reject(PlaybackError::FileMissing { path: entry.path }));
        }

        if !format::is_supported(&entry.path) {
            let extension = format::extension_of(&entry.path).unwrap_or_default();
            return Err(self.reject(PlaybackError::FormatUnsupported {
                path: entry.path,
                extension,
            }));
        }

        let generation = self.session.generation + 1;
        self.session.generation = generation;

        if let Err(e) = self.engine.load(&entry.path, generation) {
            error!("Engine failed to load {:?}: {}", entry.path, e);
            self.session.current_index = Some(index);
            self.halt();
            self.forget_track();
            let _ = self.event_tx.send(PlayerEvent::TrackError {
                message: e.to_string(),
            });
            return Err(e.into());
        }

        self.engine.set_volume(entry.volume);
        self.engine.play();

        self.session.current_index = Some(index);
        self.session.position_ms = 0;
        self.session.duration_ms = self.engine.duration_ms();
        self.lyrics.clear();
        self.cursor.reset();
        self.pending_lyrics = Some(LyricsRequest {
            generation,
            track_path: entry.path.clone(),
        });

        let title = entry.title();
        info!("Playing #{index}: {title} (volume {})", entry.volume);

        let _ = self.event_tx.send(PlayerEvent::CurrentTrackChanged {
            index,
            title,
            path: entry.path,
        });
        if self.session.duration_ms > 0 {
            let _ = self.event_tx.send(PlayerEvent::DurationChanged {
                duration_ms: self.session.duration_ms,
            });
        }
        self.set_state(PlayState::Playing);
        Ok(())
    }

    /// Pause when playing, otherwise resume or start playback.
    ///
    /// # Errors
    ///
    /// Returns an error if starting playback of an entry fails.
    pub fn toggle_play_pause(&mut self) -> Result<(), PlaybackError> {
        match (self.session.state, self.session.current_index) {
            (PlayState::Playing, _) => {
                self.engine.pause();
                self.set_state(PlayState::Paused);
                Ok(())
            }
            (PlayState::Paused, Some(_)) => {
                self.engine.play();
                self.set_state(PlayState::Playing);
                Ok(())
            }
            (PlayState::Stopped, Some(index)) => self.select_and_play(index),
            (_, None) if !self.playlist.is_empty() => self.select_and_play(0),
            _ => Ok(()),
        }
    }

    /// Play the next entry, wrapping to the first.
    ///
    /// # Errors
    ///
    /// Returns an error if the next entry cannot be played.
    pub fn next(&mut self) -> Result<(), PlaybackError> {
        let count = self.playlist.count();
        if count == 0 {
            return Ok(());
        }

        let next = self.session.current_index.map_or(0, |i| (i + 1) % count);
        self.select_and_play(next)
    }

    /// Play the previous entry, wrapping to the last.
    ///
    /// # Errors
    ///
    /// Returns an error if the previous entry cannot be played.
    pub fn previous(&mut self) -> Result<(), PlaybackError> {
        let count = self.playlist.count();
        if count == 0 {
            return Ok(());
        }

        let previous = self
            .session
            .current_index
            .map_or(count - 1, |i| (i + count - 1) % count);
        self.select_and_play(previous)
    }

    /// Stop playback, keeping the current entry selected
    pub fn stop(&mut self) {
        if self.session.state != PlayState::Stopped {
            self.halt();
        }
    }

    /// Jump to a position within the current track
    pub fn seek(&mut self, position_ms: u64) {
        if self.session.state == PlayState::Stopped {
            debug!("Ignoring seek while stopped");
            return;
        }

        let position_ms = if self.session.duration_ms > 0 {
            position_ms.min(self.session.duration_ms)
        } else {
            position_ms
        };

        self.engine.seek(position_ms);
        self.session.position_ms = position_ms;
        let _ = self.event_tx.send(PlayerEvent::PositionChanged { position_ms });
        self.refresh_lyric_line();
    }

    // ---------------------------------------------------------------------
    // Engine and timer input
    // ---------------------------------------------------------------------

    /// Poll the engine position and advance the lyric line.
    ///
    /// Cheap when nothing moved: no events are published unless the position
    /// or the resolved lyric line changed.
    pub fn tick(&mut self) {
        if self.session.state == PlayState::Stopped {
            return;
        }

        let duration_ms = self.engine.duration_ms();
        if duration_ms != self.session.duration_ms && duration_ms > 0 {
            self.session.duration_ms = duration_ms;
            let _ = self.event_tx.send(PlayerEvent::DurationChanged { duration_ms });
        }

        let position_ms = self.engine.position_ms();
        if position_ms != self.session.position_ms {
            self.session.position_ms = position_ms;
            let _ = self.event_tx.send(PlayerEvent::PositionChanged { position_ms });
        }

        self.refresh_lyric_line();
    }

    /// Apply a notification from the engine, ignoring stale generations
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        if event.generation != self.session.generation {
            debug!(
                "Discarding stale engine event {:?} (generation {} != {})",
                event.kind, event.generation, self.session.generation
            );
            return;
        }

        match event.kind {
            EngineEventKind::Finished => {
                info!("Track finished");
                let _ = self.event_tx.send(PlayerEvent::TrackFinished);
                if let Err(e) = self.next() {
                    warn!("Could not advance after track finished: {}", e);
                    self.halt();
                }
            }
            EngineEventKind::DurationChanged(duration_ms) => {
                self.session.duration_ms = duration_ms;
                let _ = self.event_tx.send(PlayerEvent::DurationChanged { duration_ms });
            }
            EngineEventKind::Error(e) => {
                error!("Engine error: {}", e);
                self.halt();
                let _ = self.event_tx.send(PlayerEvent::TrackError {
                    message: e.to_string(),
                });
            }
        }
    }

    /// Install lyrics loaded for `generation`. Returns `false` if the result is stale.
    pub fn apply_lyrics(&mut self, generation: u64, source: Option<&str>) -> bool {
        if generation != self.session.generation {
            debug!(
                "Discarding stale lyrics (generation {generation} != {})",
                self.session.generation
            );
            return false;
        }

        self.cursor.reset();
        match source {
            Some(text) => self.lyrics.parse(text),
            None => self.lyrics.clear(),
        }

        if self.lyrics.is_empty() {
            info!("No lyrics for current track");
            let _ = self.event_tx.send(PlayerEvent::LyricsNotFound);
        } else {
            info!("Lyrics loaded: {} lines", self.lyrics.len());
            let _ = self.event_tx.send(PlayerEvent::LyricsLoaded {
                line_count: self.lyrics.len(),
            });
            self.refresh_lyric_line();
        }
        true
    }

    /// Record the latest local library listing
    pub fn set_library(&mut self, songs: Vec<String>) {
        if songs == self.library {
            return;
        }
        self.library.clone_from(&songs);
        let _ = self.event_tx.send(PlayerEvent::LibraryUpdated { songs });
    }

    // ---------------------------------------------------------------------
    // Playlist mutation with index reconciliation
    // ---------------------------------------------------------------------

    /// Append an entry to the playlist
    pub fn append_entry(&mut self, path: impl Into<PathBuf>, volume: u8) {
        self.playlist.append(path, volume);
    }

    /// Append several entries (e.g. an imported playlist)
    pub fn extend_entries(&mut self, entries: impl IntoIterator<Item = PlaylistEntry>) {
        self.playlist.extend(entries);
    }

    /// Remove an entry. Removing the playing entry stops playback.
    pub fn remove_entry(&mut self, index: usize) -> bool {
        if !self.playlist.remove_at(index) {
            return false;
        }

        match self.session.current_index {
            Some(current) if current == index => self.drop_current(),
            Some(current) if index < current => self.session.current_index = Some(current - 1),
            _ => {}
        }
        true
    }

    /// Move an entry, keeping the current index on the same logical entry
    pub fn move_entry(&mut self, from: usize, to: usize) -> bool {
        if !self.playlist.move_item(from, to) {
            return false;
        }

        self.session.current_index = self
            .session
            .current_index
            .map(|current| index_after_move(current, from, to));
        true
    }

    /// Change an entry's volume, pushing it to the engine if that entry is playing
    pub fn set_entry_volume(&mut self, index: usize, volume: u8) -> bool {
        if !self.playlist.set_volume(index, volume) {
            return false;
        }

        if self.session.current_index == Some(index) {
            if let Some(entry) = self.playlist.at(index) {
                self.engine.set_volume(entry.volume);
            }
        }
        true
    }

    /// Empty the playlist, stopping playback if something was selected
    pub fn clear_playlist(&mut self) {
        self.playlist.clear();
        if self.session.current_index.is_some() {
            self.drop_current();
        }
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn reject(&self, err: PlaybackError) -> PlaybackError {
        warn!("{}", err);
        let _ = self.event_tx.send(PlayerEvent::TrackError {
            message: err.to_string(),
        });
        err
    }

    fn set_state(&mut self, state: PlayState) {
        if self.session.state != state {
            self.session.state = state;
            let _ = self.event_tx.send(PlayerEvent::StateChanged { state });
        }
    }

    /// Stop the engine and invalidate in-flight completions of the current generation
    fn halt(&mut self) {
        self.engine.stop();
        self.session.generation += 1;
        self.session.position_ms = 0;
        self.pending_lyrics = None;
        self.set_state(PlayState::Stopped);
    }

    /// The current entry left the playlist
    fn drop_current(&mut self) {
        info!("Current entry removed from playlist, stopping");
        self.halt();
        self.session.current_index = None;
        self.forget_track();
    }

    /// Drop the duration and lyrics of the track that was loaded
    fn forget_track(&mut self) {
        self.session.duration_ms = 0;
        self.lyrics.clear();
        if self.cursor.current().is_some() {
            let _ = self.event_tx.send(PlayerEvent::LyricLineChanged {
                index: None,
                window: LyricWindow::default(),
            });
        }
        self.cursor.reset();
    }

    fn refresh_lyric_line(&mut self) {
        let Some(change) = self.cursor.advance(&self.lyrics, self.session.position_ms) else {
            return;
        };

        debug!("Lyric line {:?} -> {:?}", change.previous, change.current);
        let window = change
            .current
            .map(|i| self.lyrics.window_around(i, self.window_radius))
            .unwrap_or_default();
        let _ = self.event_tx.send(PlayerEvent::LyricLineChanged {
            index: change.current,
            window,
        });
    }
}

/// Where the entry at `current` ends up after moving `from` to `to`
const fn index_after_move(current: usize, from: usize, to: usize) -> usize {
    if current == from {
        to
    } else if from < current && current <= to {
        current - 1
    } else if to <= current && current < from {
        current + 1
    } else {
        current
    }
}
