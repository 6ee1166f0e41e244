//! Ordered playlist of playable entries.

use crate::events::{event_channel, PlayerEvent};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::debug;

/// Volume given to entries added without an explicit one
pub const DEFAULT_VOLUME: u8 = 50;

/// Highest accepted entry volume
pub const MAX_VOLUME: u8 = 100;

/// A playlist entry. Identity is positional: duplicate paths are distinct entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub path: PathBuf,
    /// Playback volume, 0 to 100
    pub volume: u8,
}

impl PlaylistEntry {
    /// Create an entry, clamping `volume` to 100
    pub fn new(path: impl Into<PathBuf>, volume: u8) -> Self {
        Self {
            path: path.into(),
            volume: volume.min(MAX_VOLUME),
        }
    }

    /// Display title: the file name without its last extension
    #[must_use]
    pub fn title(&self) -> String {
        title_of(&self.path)
    }
}

/// Display title for a media path
#[must_use]
pub fn title_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Ordered collection of entries.
///
/// Every mutation validates its indices before touching the list, so a
/// rejected call leaves the playlist untouched and publishes nothing.
pub struct PlaylistStore {
    entries: Vec<PlaylistEntry>,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl PlaylistStore {
    /// Create an empty playlist publishing on `event_tx`
    #[must_use]
    pub const fn new(event_tx: broadcast::Sender<PlayerEvent>) -> Self {
        Self {
            entries: Vec::new(),
            event_tx,
        }
    }

    /// Subscribe to playlist events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }

    /// Add an entry at the end
    pub fn append(&mut self, path: impl Into<PathBuf>, volume: u8) {
        self.entries.push(PlaylistEntry::new(path, volume));
        self.notify_changed();
    }

    /// Add several entries at the end with a single notification
    pub fn extend(&mut self, entries: impl IntoIterator<Item = PlaylistEntry>) {
        let before = self.entries.len();
        self.entries.extend(
            entries
                .into_iter()
                .map(|entry| PlaylistEntry::new(entry.path, entry.volume)),
        );
        if self.entries.len() != before {
            self.notify_changed();
        }
    }

    /// Remove the entry at `index`. Returns `false` if out of range.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            debug!("Ignoring removal of playlist index {index} (count {})", self.entries.len());
            return false;
        }

        self.entries.remove(index);
        self.notify_changed();
        true
    }

    /// Move the entry at `from` so it ends up at `to`, keeping the relative order of the rest.
    ///
    /// Returns `false` if either index is out of range.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        let count = self.entries.len();
        if from >= count || to >= count {
            debug!("Ignoring move {from} -> {to} (count {count})");
            return false;
        }

        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        self.notify_changed();
        true
    }

    /// Set an entry's volume, clamping to 100. Returns `false` if `index` is out of range.
    pub fn set_volume(&mut self, index: usize, volume: u8) -> bool {
        let Some(entry) = self.entries.get_mut(index) else {
            debug!("Ignoring volume change for playlist index {index}");
            return false;
        };

        entry.volume = volume.min(MAX_VOLUME);
        let _ = self.event_tx.send(PlayerEvent::ItemVolumeChanged {
            index,
            volume: entry.volume,
        });
        true
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.notify_changed();
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn at(&self, index: usize) -> Option<&PlaylistEntry> {
        self.entries.get(index)
    }

    /// Snapshot of all entries
    #[must_use]
    pub fn all(&self) -> Vec<PlaylistEntry> {
        self.entries.clone()
    }

    fn notify_changed(&self) {
        let _ = self.event_tx.send(PlayerEvent::PlaylistChanged);
    }
}

impl Default for PlaylistStore {
    fn default() -> Self {
        Self::new(event_channel())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn paths(store: &PlaylistStore) -> Vec<String> {
        store
            .all()
            .iter()
            .map(|e| e.path.to_string_lossy().into_owned())
            .collect()
    }

    fn store_with(names: &[&str]) -> PlaylistStore {
        let mut store = PlaylistStore::default();
        for name in names {
            store.append(*name, DEFAULT_VOLUME);
        }
        store
    }

    #[test]
    fn test_append_and_read() {
        let store = store_with(&["a.mp3", "b.mp3", "a.mp3"]);
        assert_eq!(store.count(), 3);
        assert_eq!(store.at(1).map(|e| e.volume), Some(DEFAULT_VOLUME));
        // Duplicates remain distinct entries
        assert_eq!(paths(&store), vec!["a.mp3", "b.mp3", "a.mp3"]);
        assert!(store.at(3).is_none());
    }

    #[test]
    fn test_every_mutation_notifies() {
        let mut store = PlaylistStore::default();
        let mut rx = store.subscribe();

        store.append("a.mp3", 10);
        store.append("b.mp3", 20);
        assert!(store.move_item(0, 1));
        assert!(store.remove_at(0));
        store.clear();

        for _ in 0..5 {
            assert_eq!(rx.try_recv(), Ok(PlayerEvent::PlaylistChanged));
        }
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut store = store_with(&["a.mp3"]);
        let mut rx = store.subscribe();

        assert!(!store.remove_at(1));
        assert_eq!(store.count(), 1);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_move_item() {
        let mut store = store_with(&["a", "b", "c", "d"]);

        assert!(store.move_item(0, 2));
        assert_eq!(paths(&store), vec!["b", "c", "a", "d"]);

        assert!(store.move_item(3, 0));
        assert_eq!(paths(&store), vec!["d", "b", "c", "a"]);

        assert!(store.move_item(1, 1));
        assert_eq!(paths(&store), vec!["d", "b", "c", "a"]);

        assert!(!store.move_item(0, 4));
        assert!(!store.move_item(4, 0));
        assert_eq!(paths(&store), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_set_volume_emits_volume_event() {
        let mut store = store_with(&["a.mp3", "b.mp3"]);
        let mut rx = store.subscribe();

        assert!(store.set_volume(1, 80));
        assert_eq!(
            rx.try_recv(),
            Ok(PlayerEvent::ItemVolumeChanged { index: 1, volume: 80 })
        );
        assert_eq!(store.at(1).map(|e| e.volume), Some(80));
    }

    #[test]
    fn test_set_volume_clamps_and_rejects_bad_index() {
        let mut store = store_with(&["a.mp3"]);

        assert!(store.set_volume(0, 250));
        assert_eq!(store.at(0).map(|e| e.volume), Some(MAX_VOLUME));
        assert!(!store.set_volume(5, 10));
    }

    #[test]
    fn test_append_clamps_volume() {
        let mut store = PlaylistStore::default();
        store.append("loud.mp3", 200);
        assert_eq!(store.at(0).map(|e| e.volume), Some(100));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = store_with(&["a.mp3"]);
        let snapshot = store.all();
        store.clear();
        assert_eq!(snapshot.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_extend_single_notification() {
        let mut store = PlaylistStore::default();
        let mut rx = store.subscribe();

        store.extend(vec![
            PlaylistEntry::new("a.mp3", 30),
            PlaylistEntry::new("b.mp3", 40),
        ]);
        store.extend(Vec::new());

        assert_eq!(store.count(), 2);
        assert_eq!(rx.try_recv(), Ok(PlayerEvent::PlaylistChanged));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_title() {
        let entry = PlaylistEntry::new("/music/Artist - Song.live.mp3", 50);
        assert_eq!(entry.title(), "Artist - Song.live");
    }
}
