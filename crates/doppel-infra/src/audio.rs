//! Raw-PCM file adapters for the live engine's audio seams.
//!
//! [`PcmFileSource`] replays a 16 kHz mono little-endian PCM file as a
//! paced capture stream; [`PcmFileSink`] renders scheduled 24 kHz frames
//! onto a timeline that can be written back out as raw PCM. Together they
//! let a live session run end to end without audio hardware.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use tokio::time::{Duration, Interval, MissedTickBehavior};

use doppel_core::live::{AudioSink, AudioSource};
use doppel_types::live::{AudioFrame, CAPTURE_SAMPLE_RATE, PLAYBACK_SAMPLE_RATE};

/// Capture frame length in milliseconds.
const FRAME_MILLIS: u64 = 40;

/// Replays a raw PCM file as real-time paced capture frames.
///
/// Frames are pre-split at load time; `next_frame` waits one frame
/// interval per frame so the stream arrives at microphone speed. The
/// interval tick is the only await point and popping happens after it
/// completes, which keeps `next_frame` cancel safe.
pub struct PcmFileSource {
    frames: VecDeque<AudioFrame>,
    ticker: Interval,
}

impl PcmFileSource {
    /// Load a 16 kHz mono signed-16-bit little-endian PCM file.
    pub async fn load(path: &Path) -> Result<Self, std::io::Error> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Build a source from raw little-endian PCM bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let samples: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        let frame_len = (u64::from(CAPTURE_SAMPLE_RATE) * FRAME_MILLIS / 1000) as usize;
        let frames = samples
            .chunks(frame_len)
            .map(|chunk| AudioFrame::capture(chunk.to_vec()))
            .collect();

        let mut ticker = tokio::time::interval(Duration::from_millis(FRAME_MILLIS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self { frames, ticker }
    }

    /// Total audio remaining, in seconds.
    pub fn remaining_secs(&self) -> f64 {
        self.frames.iter().map(AudioFrame::duration_secs).sum()
    }
}

impl AudioSource for PcmFileSource {
    async fn next_frame(&mut self) -> Option<AudioFrame> {
        if self.frames.is_empty() {
            return None;
        }
        self.ticker.tick().await;
        self.frames.pop_front()
    }
}

/// Collects scheduled playback frames onto a 24 kHz timeline.
///
/// The clock is wall time since construction, matching how a real output
/// device reports its position. `stop_all` truncates the timeline at the
/// current clock, discarding everything not yet played.
pub struct PcmFileSink {
    started: Instant,
    state: Mutex<SinkState>,
}

#[derive(Default)]
struct SinkState {
    /// Rendered samples, indexed from clock zero.
    timeline: Vec<i16>,
}

impl Default for PcmFileSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PcmFileSink {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            state: Mutex::new(SinkState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SinkState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Length of the rendered timeline, in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.lock().timeline.len() as f64 / f64::from(PLAYBACK_SAMPLE_RATE)
    }

    /// A copy of the rendered timeline.
    pub fn samples(&self) -> Vec<i16> {
        self.lock().timeline.clone()
    }

    /// Write the rendered timeline to a raw little-endian PCM file.
    pub async fn write_to(&self, path: &Path) -> Result<(), std::io::Error> {
        let samples = self.samples();
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        tokio::fs::write(path, bytes).await
    }
}

impl AudioSink for PcmFileSink {
    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn play_at(&self, frame: AudioFrame, start_secs: f64) {
        if frame.is_empty() {
            return;
        }
        let start_index = (start_secs * f64::from(frame.sample_rate)).round() as usize;
        let end_index = start_index + frame.samples.len();

        let mut state = self.lock();
        if state.timeline.len() < end_index {
            state.timeline.resize(end_index, 0);
        }
        state.timeline[start_index..end_index].copy_from_slice(&frame.samples);
    }

    fn stop_all(&self) {
        let cut = (self.now() * f64::from(PLAYBACK_SAMPLE_RATE)).round() as usize;
        let mut state = self.lock();
        if cut < state.timeline.len() {
            state.timeline.truncate(cut);
        }
    }
}
