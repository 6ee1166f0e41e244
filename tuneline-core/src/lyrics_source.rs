//! Lyric lookup for the current track.

use crate::error::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of sidecar lyric files
pub const LYRICS_EXTENSION: &str = "lrc";

/// Request to load lyrics for the track of a given generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsRequest {
    pub generation: u64,
    pub track_path: PathBuf,
}

/// Trait for lyric sources
#[async_trait]
pub trait LyricsSource: Send + Sync {
    /// Get the source name
    fn name(&self) -> &'static str;

    /// Fetch raw LRC text for a track. `Ok(None)` means the track has no lyrics.
    async fn fetch(&self, track_path: &Path) -> Result<Option<String>>;
}

/// Path of the sidecar lyric file: same directory, same stem, `.lrc` extension
#[must_use]
pub fn sidecar_path(track_path: &Path) -> PathBuf {
    track_path.with_extension(LYRICS_EXTENSION)
}

/// Reads `<stem>.lrc` next to the audio file
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalLyricsSource;

#[async_trait]
impl LyricsSource for LocalLyricsSource {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch(&self, track_path: &Path) -> Result<Option<String>> {
        let lyrics_path = sidecar_path(track_path);

        match tokio::fs::read(&lyrics_path).await {
            Ok(bytes) => {
                debug!("Read {} bytes of lyrics from {:?}", bytes.len(), lyrics_path);
                Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
