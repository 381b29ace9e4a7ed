//! Sentiment, emotion and sarcasm scoring.

pub mod engine;
pub mod lexicon;

pub use engine::{EmotionalMoment, SarcasmAnalysis, SentimentEngine};
