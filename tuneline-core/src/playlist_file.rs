//! Flat text playlist format: one `file_name|volume` entry per line.

use crate::error::Result;
use crate::playlist::{PlaylistEntry, DEFAULT_VOLUME, MAX_VOLUME};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Field separator between file name and volume
pub const FIELD_SEPARATOR: char = '|';

/// A parsed playlist line, not yet resolved against a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRecord {
    pub file_name: String,
    pub volume: u8,
}

/// Parse playlist text into records.
///
/// Lines with fewer than two `|`-separated fields are skipped. A volume that
/// isn't a number in `0..=100` falls back to [`DEFAULT_VOLUME`].
#[must_use]
pub fn parse_records(content: &str) -> Vec<PlaylistRecord> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split(FIELD_SEPARATOR);
            let file_name = fields.next()?;
            let Some(volume) = fields.next() else {
                debug!("Skipping playlist line without volume: {line:?}");
                return None;
            };

            Some(PlaylistRecord {
                file_name: file_name.to_string(),
                volume: parse_volume(volume),
            })
        })
        .collect()
}

fn parse_volume(field: &str) -> u8 {
    field
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|v| *v <= MAX_VOLUME)
        .unwrap_or(DEFAULT_VOLUME)
}

/// Resolve records against the library directory, dropping files that don't exist
#[must_use]
pub fn resolve(records: Vec<PlaylistRecord>, library_dir: &Path) -> Vec<PlaylistEntry> {
    records
        .into_iter()
        .filter_map(|record| {
            let path = library_dir.join(&record.file_name);
            if path.exists() {
                Some(PlaylistEntry::new(path, record.volume))
            } else {
                debug!("Skipping missing playlist file {:?}", path);
                None
            }
        })
        .collect()
}

/// Serialize entries. Only the file name of each path is written.
#[must_use]
pub fn export(entries: &[PlaylistEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let file_name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let _ = writeln!(out, "{file_name}{FIELD_SEPARATOR}{}", entry.volume);
    }
    out
}

/// Read a playlist file and resolve its entries against `library_dir`
///
/// # Errors
///
/// Returns an error if the playlist file cannot be read.
pub fn load_playlist(path: &Path, library_dir: &Path) -> Result<Vec<PlaylistEntry>> {
    let content = fs::read_to_string(path)?;
    let entries = resolve(parse_records(&content), library_dir);
    info!("Imported {} playlist entries from {:?}", entries.len(), path);
    Ok(entries)
}

/// Write entries to a playlist file
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_playlist(path: &Path, entries: &[PlaylistEntry]) -> Result<()> {
    fs::write(path, export(entries))?;
    info!("Exported {} playlist entries to {:?}", entries.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records() {
        let records = parse_records("a.mp3|80\nb.flac|0\nc.ogg|100\n");
        assert_eq!(
            records,
            vec![
                PlaylistRecord { file_name: "a.mp3".into(), volume: 80 },
                PlaylistRecord { file_name: "b.flac".into(), volume: 0 },
                PlaylistRecord { file_name: "c.ogg".into(), volume: 100 },
            ]
        );
    }

    #[test]
    fn test_invalid_volume_defaults() {
        let records = parse_records("track.mp3|150\ntrack.mp3|abc\ntrack.mp3|-5\ntrack.mp3|");
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.volume == DEFAULT_VOLUME));
    }

    #[test]
    fn test_short_lines_skipped() {
        let records = parse_records("no-separator.mp3\n\nok.mp3|70|extra\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_name, "ok.mp3");
        assert_eq!(records[0].volume, 70);
    }

    #[test]
    fn test_export_writes_file_names() {
        let entries = vec![
            PlaylistEntry::new("/music/a.mp3", 80),
            PlaylistEntry::new("/music/sub/b.flac", 50),
        ];
        assert_eq!(export(&entries), "a.mp3|80\nb.flac|50\n");
    }

    #[test]
    fn test_resolve_drops_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("here.mp3"), b"").unwrap();

        let entries = resolve(parse_records("here.mp3|30\ngone.mp3|40"), dir.path());
        assert_eq!(entries, vec![PlaylistEntry::new(dir.path().join("here.mp3"), 30)]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.mp3", "b.wav"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let entries = vec![
            PlaylistEntry::new(dir.path().join("a.mp3"), 65),
            PlaylistEntry::new(dir.path().join("b.wav"), 20),
        ];

        let playlist_path = dir.path().join("playlist.txt");
        save_playlist(&playlist_path, &entries).unwrap();
        let loaded = load_playlist(&playlist_path, dir.path()).unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_playlist(&dir.path().join("nope.txt"), dir.path()).is_err());
    }
}
