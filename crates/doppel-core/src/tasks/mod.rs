//! Task extraction from free-form text.

pub mod extractor;

pub use extractor::TaskExtractor;
