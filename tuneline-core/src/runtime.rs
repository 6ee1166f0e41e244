//! Async driver for the playback coordinator.
//!
//! All mutation goes through a single task: commands arrive on an mpsc queue,
//! engine notifications on another, and a periodic tick polls the playback
//! position. Lyric loads run as spawned tasks whose results come back tagged
//! with the generation they were requested for.

use crate::coordinator::PlaybackCoordinator;
use crate::engine::{AudioEngine, EngineEvent};
use crate::error::{CoreError, Result};
use crate::lyrics_source::LyricsSource;
use crate::playlist::PlaylistEntry;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Capacity of the command queue
pub const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Requests accepted by the player runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    SelectAndPlay(usize),
    TogglePlayPause,
    Next,
    Previous,
    Stop,
    Seek(u64),
    Append { path: PathBuf, volume: u8 },
    Import(Vec<PlaylistEntry>),
    Remove(usize),
    Move { from: usize, to: usize },
    SetVolume { index: usize, volume: u8 },
    Clear,
    /// New listing from the library scanner
    LibraryUpdated(Vec<String>),
}

/// Cloneable sender for [`PlayerCommand`]s
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    tx: mpsc::Sender<PlayerCommand>,
}

impl PlayerHandle {
    pub(crate) const fn from_sender(tx: mpsc::Sender<PlayerCommand>) -> Self {
        Self { tx }
    }

    /// Queue a command
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime has shut down.
    pub async fn send(&self, command: PlayerCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| CoreError::RuntimeStopped)
    }
}

/// Lyrics delivered by a load task
#[derive(Debug)]
struct LoadedLyrics {
    generation: u64,
    source: Option<String>,
}

/// Owns the coordinator and serializes every input to it
pub struct PlayerRuntime<E: AudioEngine> {
    coordinator: PlaybackCoordinator<E>,
    commands: mpsc::Receiver<PlayerCommand>,
    engine_events: mpsc::UnboundedReceiver<EngineEvent>,
    lyrics_source: Arc<dyn LyricsSource>,
    lyrics_tx: mpsc::Sender<LoadedLyrics>,
    lyrics_rx: mpsc::Receiver<LoadedLyrics>,
    lyrics_task: Option<JoinHandle<()>>,
    tick_interval: Duration,
    cancel_token: CancellationToken,
}

impl<E: AudioEngine> PlayerRuntime<E> {
    /// Create a runtime and the handle used to command it
    ///
    /// # Arguments
    /// * `coordinator` - Coordinator to drive
    /// * `engine_events` - Notifications from the audio engine
    /// * `lyrics_source` - Where lyrics for the current track come from
    /// * `tick_interval` - How often the playback position is polled
    /// * `cancel_token` - Stops the run loop when cancelled
    pub fn new(
        coordinator: PlaybackCoordinator<E>,
        engine_events: mpsc::UnboundedReceiver<EngineEvent>,
        lyrics_source: Arc<dyn LyricsSource>,
        tick_interval: Duration,
        cancel_token: CancellationToken,
    ) -> (Self, PlayerHandle) {
        let (tx, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (lyrics_tx, lyrics_rx) = mpsc::channel(1);

        let runtime = Self {
            coordinator,
            commands,
            engine_events,
            lyrics_source,
            lyrics_tx,
            lyrics_rx,
            lyrics_task: None,
            tick_interval,
            cancel_token,
        };
        (runtime, PlayerHandle::from_sender(tx))
    }

    /// Run until cancelled or every handle is dropped, then hand the coordinator back
    pub async fn run(mut self) -> PlaybackCoordinator<E> {
        info!(
            "Player runtime started (tick {} ms, lyrics source: {})",
            self.tick_interval.as_millis(),
            self.lyrics_source.name()
        );

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            self.spawn_pending_lyrics();

            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!("Player runtime shutting down");
                    break;
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        info!("All player handles dropped, stopping runtime");
                        break;
                    };
                    self.dispatch(command);
                }
                Some(event) = self.engine_events.recv() => {
                    self.coordinator.handle_engine_event(event);
                }
                Some(loaded) = self.lyrics_rx.recv() => {
                    self.coordinator.apply_lyrics(loaded.generation, loaded.source.as_deref());
                }
                _ = ticker.tick() => {
                    self.coordinator.tick();
                }
            }
        }

        if let Some(task) = self.lyrics_task.take() {
            task.abort();
        }
        self.coordinator
    }

    fn dispatch(&mut self, command: PlayerCommand) {
        debug!("Player command: {:?}", command);

        let result = match command {
            PlayerCommand::SelectAndPlay(index) => self.coordinator.select_and_play(index),
            PlayerCommand::TogglePlayPause => self.coordinator.toggle_play_pause(),
            PlayerCommand::Next => self.coordinator.next(),
            PlayerCommand::Previous => self.coordinator.previous(),
            PlayerCommand::Stop => {
                self.coordinator.stop();
                Ok(())
            }
            PlayerCommand::Seek(position_ms) => {
                self.coordinator.seek(position_ms);
                Ok(())
            }
            PlayerCommand::Append { path, volume } => {
                self.coordinator.append_entry(path, volume);
                Ok(())
            }
            PlayerCommand::Import(entries) => {
                self.coordinator.extend_entries(entries);
                Ok(())
            }
            PlayerCommand::Remove(index) => {
                self.coordinator.remove_entry(index);
                Ok(())
            }
            PlayerCommand::Move { from, to } => {
                self.coordinator.move_entry(from, to);
                Ok(())
            }
            PlayerCommand::SetVolume { index, volume } => {
                self.coordinator.set_entry_volume(index, volume);
                Ok(())
            }
            PlayerCommand::Clear => {
                self.coordinator.clear_playlist();
                Ok(())
            }
            PlayerCommand::LibraryUpdated(songs) => {
                self.coordinator.set_library(songs);
                Ok(())
            }
        };

        // Already published as TrackError by the coordinator
        if let Err(e) = result {
            debug!("Player command failed: {}", e);
        }
    }

    /// Start loading lyrics for a newly selected track, abandoning any older load
    fn spawn_pending_lyrics(&mut self) {
        let Some(request) = self.coordinator.take_lyrics_request() else {
            return;
        };

        if let Some(task) = self.lyrics_task.take() {
            task.abort();
        }

        let source = Arc::clone(&self.lyrics_source);
        let tx = self.lyrics_tx.clone();

        self.lyrics_task = Some(tokio::spawn(async move {
            let lyrics = match source.fetch(&request.track_path).await {
                Ok(lyrics) => lyrics,
                Err(e) => {
                    warn!(
                        "Lyrics source {} failed for {:?}: {}",
                        source.name(),
                        request.track_path,
                        e
                    );
                    None
                }
            };

            let _ = tx
                .send(LoadedLyrics {
                    generation: request.generation,
                    source: lyrics,
                })
                .await;
        }));
    }
}
