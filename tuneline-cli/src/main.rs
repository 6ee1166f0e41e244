//! Command line front end for the tuneline playback core.
//!
//! Inspects lyric and playlist files, lists the music library, and can
//! "play" files against a silent clock engine to follow their lyrics.

mod clock;

use crate::clock::ClockEngine;
use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tuneline_core::error::Result;
use tuneline_core::time::{format_clock, parse_clock};
use tuneline_core::{
    format, library, playlist_file, LibraryWatcher, LocalLyricsSource, LyricWindow, LyricsIndex,
    PlaybackCoordinator, PlayerCommand, PlayerConfig, PlayerEvent, PlayerRuntime, PlaylistEntry,
};

#[derive(Parser)]
#[command(name = "tuneline", version)]
#[command(about = "Playlist and synchronized lyrics tools")]
struct Cli {
    /// Config file (default: ~/.config/tuneline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse an LRC file and print its timeline
    Lyrics {
        /// LRC file to read
        file: PathBuf,

        /// Show the lines around this position (mm:ss, mm:ss.fff, or milliseconds)
        #[arg(long)]
        at: Option<String>,

        /// Lines shown on each side of the current one
        #[arg(long)]
        radius: Option<usize>,
    },

    /// Import a playlist file and report the status of each entry
    Playlist {
        /// Playlist file (`file_name|volume` per line)
        file: PathBuf,

        /// Directory entries are resolved against (default: the library directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Write the resolved entries back out to this file
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// List supported songs in the music directory and follow changes
    Library {
        /// Music directory (default: from config)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Only show songs containing this text
        #[arg(short, long)]
        search: Option<String>,

        /// Print the listing once instead of watching for changes
        #[arg(long)]
        once: bool,
    },

    /// List the audio formats the player accepts
    Formats,

    /// Play files silently, following their sidecar lyrics
    Play {
        /// Audio files, played in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Seconds each track plays for
        #[arg(long, default_value_t = 30)]
        length: u64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Check config for logging.enabled before full config load
    let config_path = cli.config.clone().unwrap_or_else(PlayerConfig::config_path);
    init_tracing(check_file_logging_enabled(&config_path));

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Lyrics { file, at, radius } => show_lyrics(
            &file,
            at.as_deref(),
            radius.unwrap_or(config.playback.lyric_window_radius),
        ),
        Command::Playlist { file, dir, export } => {
            let dir = dir.unwrap_or_else(|| config.library.directory());
            show_playlist(&file, &dir, export.as_deref())
        }
        Command::Library { dir, search, once } => {
            let dir = dir.unwrap_or_else(|| config.library.directory());
            if once || !config.library.watch {
                list_library(&dir, search.as_deref())
            } else {
                watch_library(&config, dir, search)
            }
        }
        Command::Formats => {
            show_formats();
            Ok(())
        }
        Command::Play { files, length } => play(&config, files, length.saturating_mul(1000)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PlayerConfig> {
    match path {
        Some(path) => PlayerConfig::load_from(path),
        None => PlayerConfig::load_or_create(),
    }
}

fn show_lyrics(file: &Path, at: Option<&str>, radius: usize) -> Result<()> {
    let source = fs::read(file)?;
    let lyrics = LyricsIndex::from_source(&String::from_utf8_lossy(&source));

    let metadata = lyrics.metadata();
    for (label, value) in [
        ("Title", &metadata.title),
        ("Artist", &metadata.artist),
        ("Album", &metadata.album),
        ("By", &metadata.author),
    ] {
        if let Some(value) = value {
            println!("{label}: {value}");
        }
    }
    if metadata.offset_ms != 0 {
        println!("Offset: {} ms", metadata.offset_ms);
    }

    if lyrics.is_empty() {
        println!("No timed lyric lines in {}", file.display());
        return Ok(());
    }

    let Some(at) = at else {
        for line in lyrics.lines() {
            println!("[{}] {}", format_timestamp(line.timestamp_ms), line.text);
        }
        return Ok(());
    };

    let Some(position_ms) = parse_clock(at) else {
        warn!("Could not parse position {at:?}");
        return Ok(());
    };

    match lyrics.current_index_for(position_ms) {
        Some(index) => print_window(&lyrics.window_around(index, radius)),
        None => println!("({} is before the first line)", format_clock(position_ms)),
    }
    Ok(())
}

fn show_playlist(file: &Path, dir: &Path, export: Option<&Path>) -> Result<()> {
    let content = fs::read_to_string(file)?;
    let records = playlist_file::parse_records(&content);
    let listed = records.len();

    for record in &records {
        let path = dir.join(&record.file_name);
        let status = if path.exists() {
            format::describe(&path).unwrap_or("unsupported format")
        } else {
            "missing"
        };
        println!("{:>3}  {}  ({status})", record.volume, record.file_name);
    }

    let entries = playlist_file::resolve(records, dir);
    println!("{} of {listed} entries found in {}", entries.len(), dir.display());

    if let Some(export) = export {
        playlist_file::save_playlist(export, &entries)?;
    }
    Ok(())
}

fn show_formats() {
    for (extension, description) in format::supported_formats() {
        println!("{extension:<6} {description}");
    }
}

fn list_library(dir: &Path, search: Option<&str>) -> Result<()> {
    let songs = library::scan(dir)?;
    print_songs(&songs, search);
    Ok(())
}

fn watch_library(config: &PlayerConfig, dir: PathBuf, search: Option<String>) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let cancel_token = CancellationToken::new();
        install_ctrlc_handler(&cancel_token);

        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let coordinator = PlaybackCoordinator::new(ClockEngine::new(0, engine_tx));
        let events = coordinator.subscribe();

        let (player, handle) = PlayerRuntime::new(
            coordinator,
            engine_rx,
            Arc::new(LocalLyricsSource),
            config.playback.tick_interval(),
            cancel_token.clone(),
        );

        let watcher = LibraryWatcher::new(
            dir,
            config.library.rescan_debounce(),
            handle,
            cancel_token.clone(),
        )
        .start();
        let printer = tokio::spawn(print_player_events(events, search));

        player.run().await;
        printer.abort();

        watcher.await.unwrap_or_else(|e| {
            warn!("Library watcher task failed: {e}");
            Ok(())
        })
    })
}

fn play(config: &PlayerConfig, files: Vec<PathBuf>, track_length_ms: u64) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let cancel_token = CancellationToken::new();
        install_ctrlc_handler(&cancel_token);

        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let mut coordinator = PlaybackCoordinator::new(ClockEngine::new(track_length_ms, engine_tx))
            .with_window_radius(config.playback.lyric_window_radius);
        coordinator.extend_entries(
            files
                .into_iter()
                .map(|path| PlaylistEntry::new(path, config.playback.default_volume)),
        );
        let events = coordinator.subscribe();

        let (player, handle) = PlayerRuntime::new(
            coordinator,
            engine_rx,
            Arc::new(LocalLyricsSource),
            config.playback.tick_interval(),
            cancel_token.clone(),
        );
        let printer = tokio::spawn(print_player_events(events, None));

        handle.send(PlayerCommand::SelectAndPlay(0)).await?;
        player.run().await;
        printer.abort();
        Ok(())
    })
}

/// Cancel `cancel_token` on Ctrl+C
fn install_ctrlc_handler(cancel_token: &CancellationToken) {
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }
}

/// Render player events for the terminal
async fn print_player_events(mut rx: broadcast::Receiver<PlayerEvent>, search: Option<String>) {
    loop {
        match rx.recv().await {
            Ok(event) => match event {
                PlayerEvent::CurrentTrackChanged { index, title, .. } => {
                    println!("== #{} {title} ==", index + 1);
                }
                PlayerEvent::StateChanged { state } => {
                    info!("Playback {state}");
                }
                PlayerEvent::LyricsNotFound => {
                    println!("(no lyrics)");
                }
                PlayerEvent::LyricLineChanged { window, .. } => {
                    print_window(&window);
                }
                PlayerEvent::TrackError { message } => {
                    println!("Error: {message}");
                }
                PlayerEvent::LibraryUpdated { songs } => {
                    print_songs(&songs, search.as_deref());
                }
                other => debug!("{:?}", other),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!("Event printer lagged, skipped {skipped} events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_window(window: &LyricWindow) {
    if window.is_empty() {
        return;
    }

    for (_, line, highlighted) in window.iter() {
        let marker = if highlighted { '>' } else { ' ' };
        println!("{marker} {}", line.text);
    }
    println!();
}

fn print_songs(songs: &[String], search: Option<&str>) {
    let shown = library::search(songs, search.unwrap_or_default());
    for song in &shown {
        println!("{song}");
    }
    println!("{} of {} songs", shown.len(), songs.len());
}

/// `mm:ss.cc` as written in LRC files
fn format_timestamp(position_ms: u64) -> String {
    format!("{}.{:02}", format_clock(position_ms), (position_ms % 1000) / 10)
}

fn check_file_logging_enabled(config_path: &Path) -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let Ok(content) = fs::read_to_string(config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with stderr output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = tuneline_core::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(62_500), "01:02.50");
        assert_eq!(format_timestamp(0), "00:00.00");
        assert_eq!(format_timestamp(1_005), "00:01.00");
    }

    #[test]
    fn test_parse_play_args() {
        let cli = Cli::try_parse_from(["tuneline", "play", "a.mp3", "b.mp3", "--length", "5"]).unwrap();
        let Command::Play { files, length } = cli.command else {
            panic!("expected play command");
        };
        assert_eq!(files.len(), 2);
        assert_eq!(length, 5);

        assert!(Cli::try_parse_from(["tuneline", "play"]).is_err());
    }

    #[test]
    fn test_file_logging_enabled_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(!check_file_logging_enabled(&path));
        fs::write(&path, "[logging]\nenabled = true\n").unwrap();
        assert!(check_file_logging_enabled(&path));
        fs::write(&path, "not toml [").unwrap();
        assert!(!check_file_logging_enabled(&path));
    }
}
