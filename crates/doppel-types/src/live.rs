//! Live voice session types: phases, events, frames, transcripts.
//!
//! The live engine in `doppel-core` drives a duplex audio channel; these are
//! the shared shapes on both sides of it. Capture audio is 16 kHz mono PCM,
//! model audio arrives at 24 kHz mono.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sample rate of captured microphone frames.
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Sample rate of model playback frames.
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// Phase of a live session's state machine.
///
/// `Interrupted` is a transient sub-state reachable only from `Open`
/// (user barge-in); it recovers to `Open` when model audio resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivePhase {
    Idle,
    Connecting,
    Open,
    Interrupted,
    Closed,
}

impl fmt::Display for LivePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LivePhase::Idle => "idle",
            LivePhase::Connecting => "connecting",
            LivePhase::Open => "open",
            LivePhase::Interrupted => "interrupted",
            LivePhase::Closed => "closed",
        };
        write!(f, "{name}")
    }
}

/// Who produced a piece of transcript text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Model,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "user"),
            Speaker::Model => write!(f, "model"),
        }
    }
}

/// A chunk of mono PCM audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl AudioFrame {
    /// A capture-side frame (16 kHz).
    pub fn capture(samples: Vec<i16>) -> Self {
        Self {
            samples,
            sample_rate: CAPTURE_SAMPLE_RATE,
        }
    }

    /// A playback-side frame (24 kHz).
    pub fn playback(samples: Vec<i16>) -> Self {
        Self {
            samples,
            sample_rate: PLAYBACK_SAMPLE_RATE,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Events arriving from the live channel.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// Model audio to schedule for playback.
    Audio(AudioFrame),
    /// Incremental transcription text for one speaker.
    TranscriptDelta { speaker: Speaker, text: String },
    /// The current exchange finished; accumulated transcript buffers flush.
    TurnComplete,
    /// User barge-in: discard scheduled output and reset the clock.
    Interrupted,
    /// The stream failed; the session transitions to closed.
    Error(String),
    /// The server closed the channel.
    Closed,
}

/// Configuration for opening a live channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveConfig {
    /// Concrete live model id.
    pub model: String,
    /// System instruction for the voice persona.
    pub system: Option<String>,
}

/// One flushed transcript entry: a speaker and their accumulated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub speaker: Speaker,
    pub text: String,
}

/// The durable record of a finished live session.
///
/// Created only when at least one transcript turn accumulated; never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveRecord {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub turns: Vec<TranscriptTurn>,
}

impl LiveRecord {
    pub fn new(started_at: DateTime<Utc>, duration_secs: f64, turns: Vec<TranscriptTurn>) -> Self {
        Self {
            id: Uuid::now_v7(),
            started_at,
            duration_secs,
            turns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_duration() {
        let frame = AudioFrame::capture(vec![0; 16_000]);
        assert!((frame.duration_secs() - 1.0).abs() < f64::EPSILON);

        let frame = AudioFrame::playback(vec![0; 12_000]);
        assert!((frame.duration_secs() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(LivePhase::Connecting.to_string(), "connecting");
        assert_eq!(LivePhase::Interrupted.to_string(), "interrupted");
    }

    #[test]
    fn test_transcript_turn_serde_roundtrip() {
        let turn = TranscriptTurn {
            speaker: Speaker::Model,
            text: "of course".to_string(),
        };
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains("\"model\""));
        let parsed: TranscriptTurn = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, turn);
    }

    #[test]
    fn test_live_record_serde_roundtrip() {
        let record = LiveRecord::new(
            Utc::now(),
            12.5,
            vec![TranscriptTurn {
                speaker: Speaker::User,
                text: "hello there".to_string(),
            }],
        );
        let json = serde_json::to_string(&record).unwrap();
        let parsed: LiveRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.turns.len(), 1);
        assert!((parsed.duration_secs - 12.5).abs() < f64::EPSILON);
    }
}
