//! Silent engine that advances playback position with wall-clock time.
//!
//! Lets the lyric display run without an audio backend: every loaded track
//! "plays" for a fixed length and then reports that it finished.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;
use tuneline_core::time::DurationExt;
use tuneline_core::{AudioEngine, EngineError, EngineEvent, EngineEventKind};

pub struct ClockEngine {
    /// When the current run of playback started, `None` while paused or stopped
    started: Option<Instant>,
    /// Position accumulated before `started`
    offset_ms: u64,
    track_length_ms: u64,
    generation: u64,
    finished_sent: AtomicBool,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl ClockEngine {
    pub const fn new(track_length_ms: u64, events: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self {
            started: None,
            offset_ms: 0,
            track_length_ms,
            generation: 0,
            finished_sent: AtomicBool::new(false),
            events,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started
            .map_or(0, |started| started.elapsed().as_millis_u64())
    }
}

impl AudioEngine for ClockEngine {
    fn load(&mut self, path: &Path, generation: u64) -> Result<(), EngineError> {
        debug!("Clock engine loaded {:?} (generation {generation})", path);
        self.started = None;
        self.offset_ms = 0;
        self.generation = generation;
        self.finished_sent.store(false, Ordering::Relaxed);
        let _ = self.events.send(EngineEvent::new(
            generation,
            EngineEventKind::DurationChanged(self.track_length_ms),
        ));
        Ok(())
    }

    fn play(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.offset_ms = self.position_ms();
        self.started = None;
    }

    fn stop(&mut self) {
        self.started = None;
        self.offset_ms = 0;
    }

    fn seek(&mut self, position_ms: u64) {
        self.offset_ms = position_ms.min(self.track_length_ms);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn set_volume(&mut self, _volume: u8) {}

    fn position_ms(&self) -> u64 {
        let position = self.offset_ms.saturating_add(self.elapsed_ms());
        if position < self.track_length_ms {
            return position;
        }

        if !self.finished_sent.swap(true, Ordering::Relaxed) {
            let _ = self
                .events
                .send(EngineEvent::new(self.generation, EngineEventKind::Finished));
        }
        self.track_length_ms
    }

    fn duration_ms(&self) -> u64 {
        self.track_length_ms
    }
}
