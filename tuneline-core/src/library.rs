//! Local music directory: scanning, search, and change watching.

use crate::error::Result;
use crate::format;
use crate::runtime::{PlayerCommand, PlayerHandle};
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// List the supported audio files directly inside `dir`, sorted by name.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn scan(dir: &Path) -> Result<Vec<String>> {
    let mut songs: Vec<String> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.path())
        .filter(|path| format::is_supported(path))
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();

    songs.sort();
    debug!("Scanned {} songs in {:?}", songs.len(), dir);
    Ok(songs)
}

/// Songs whose name contains `query`, ignoring case. An empty query matches everything.
#[must_use]
pub fn search<'a>(songs: &'a [String], query: &str) -> Vec<&'a String> {
    let query = query.trim().to_lowercase();
    songs
        .iter()
        .filter(|song| song.to_lowercase().contains(&query))
        .collect()
}

/// Watches a music directory and posts [`PlayerCommand::LibraryUpdated`] when its listing changes
pub struct LibraryWatcher {
    directory: PathBuf,
    debounce: Duration,
    handle: PlayerHandle,
    cancel_token: CancellationToken,
}

impl LibraryWatcher {
    pub fn new(
        directory: impl Into<PathBuf>,
        debounce: Duration,
        handle: PlayerHandle,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            directory: directory.into(),
            debounce,
            handle,
            cancel_token,
        }
    }

    /// Start watching in a background task
    #[must_use]
    pub fn start(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    /// Publish the initial listing, then rescan after each debounced burst of changes
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be scanned or watched, or the
    /// player runtime is gone.
    pub async fn run(self) -> Result<()> {
        let mut songs = scan(&self.directory)?;
        info!("Library: {} songs in {:?}", songs.len(), self.directory);
        self.handle
            .send(PlayerCommand::LibraryUpdated(songs.clone()))
            .await?;

        let (tx, mut rx) = mpsc::channel::<()>(1);
        let mut debouncer = new_debouncer(self.debounce, move |res: DebounceEventResult| {
            match res {
                Ok(events) if !events.is_empty() => {
                    // A full queue already holds a pending rescan
                    let _ = tx.try_send(());
                }
                Ok(_) => {}
                Err(e) => warn!("Library watch error: {}", e),
            }
        })?;
        debouncer
            .watcher()
            .watch(&self.directory, RecursiveMode::NonRecursive)?;

        info!("Watching library directory for changes: {:?}", self.directory);

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!("Library watcher shutting down");
                    break;
                }
                Some(()) = rx.recv() => {
                    match scan(&self.directory) {
                        Ok(rescanned) if rescanned != songs => {
                            info!("Library changed: {} songs", rescanned.len());
                            songs = rescanned;
                            self.handle
                                .send(PlayerCommand::LibraryUpdated(songs.clone()))
                                .await?;
                        }
                        Ok(_) => debug!("Library listing unchanged"),
                        Err(e) => warn!("Failed to rescan library: {}", e),
                    }
                }
            }
        }

        // Keep debouncer alive until we exit the loop
        drop(debouncer);
        Ok(())
    }
}
