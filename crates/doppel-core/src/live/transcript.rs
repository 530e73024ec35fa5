//! Per-speaker transcript accumulation.
//!
//! Deltas arrive interleaved for both speakers and are buffered
//! separately. On a turn boundary the buffers flush to finished turns,
//! user first, then model. Whitespace-only buffers flush to nothing.

use doppel_types::live::{Speaker, TranscriptTurn};

#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    user: String,
    model: String,
    turns: Vec<TranscriptTurn>,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transcription delta to the speaker's buffer.
    pub fn push(&mut self, speaker: Speaker, text: &str) {
        match speaker {
            Speaker::User => self.user.push_str(text),
            Speaker::Model => self.model.push_str(text),
        }
    }

    /// Flush both buffers into finished turns, user before model.
    pub fn complete_turn(&mut self) {
        let user = std::mem::take(&mut self.user);
        if !user.trim().is_empty() {
            self.turns.push(TranscriptTurn {
                speaker: Speaker::User,
                text: user.trim().to_string(),
            });
        }
        let model = std::mem::take(&mut self.model);
        if !model.trim().is_empty() {
            self.turns.push(TranscriptTurn {
                speaker: Speaker::Model,
                text: model.trim().to_string(),
            });
        }
    }

    /// True when nothing was transcribed at all.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty() && self.user.trim().is_empty() && self.model.trim().is_empty()
    }

    /// Flush any leftover partial turn and return the transcript.
    pub fn finish(mut self) -> Vec<TranscriptTurn> {
        self.complete_turn();
        self.turns
    }
}
