//! Profile synthesis from conversation transcripts.

pub mod synthesizer;

pub use synthesizer::ProfileSynthesizer;
