//! Audio I/O seams for the live engine.
//!
//! The engine is device-agnostic: capture comes from an [`AudioSource`]
//! and playback goes to an [`AudioSink`]. The file-backed adapters used
//! by the CLI live in doppel-infra.

use doppel_types::live::AudioFrame;

/// Produces capture frames (16 kHz mono PCM).
pub trait AudioSource: Send {
    /// The next captured frame, or `None` when capture is exhausted.
    ///
    /// The engine races this future in a `select!` loop, so it must be
    /// cancel safe: dropping it before completion must not lose a frame.
    fn next_frame(&mut self) -> impl std::future::Future<Output = Option<AudioFrame>> + Send;
}

/// Plays scheduled frames (24 kHz mono PCM) on its own clock.
pub trait AudioSink: Send + Sync {
    /// Current position of the playback clock, in seconds.
    fn now(&self) -> f64;

    /// Schedule a frame to start at `start_secs` on the playback clock.
    fn play_at(&self, frame: AudioFrame, start_secs: f64);

    /// Stop and discard everything scheduled or playing.
    fn stop_all(&self);
}
