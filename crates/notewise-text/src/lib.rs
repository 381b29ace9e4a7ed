//! # notewise-text
//!
//! Text intelligence for notewise notes.
//!
//! This crate provides:
//! - Text statistics and a Flesch readability approximation
//! - Unicode script detection
//! - Language detection blending script hypotheses with a statistical scorer
//! - Lexicon-based sentiment, emotion and sarcasm scoring
//! - A cancellable pipeline running all of the above off the caller's thread
//!
//! ## Example
//!
//! ```ignore
//! use notewise_text::{TextAnalyzer, CancellationToken};
//!
//! let analyzer = TextAnalyzer::default();
//! let insights = analyzer
//!     .analyze(None, "Das ist fantastisch und großartig", &CancellationToken::new())
//!     .await?;
//! assert_eq!(insights.language.code, "de");
//! ```

pub mod language;
pub mod pipeline;
pub mod script_detection;
pub mod sentiment;
pub mod statistics;
pub mod tokenize;

pub use tokio_util::sync::CancellationToken;

pub use language::{
    LanguageClassifier, LanguageMixingAnalysis, LanguageSegment, ScriptHypothesisSource,
};
pub use pipeline::{AnalysisOptions, NoteInsights, TextAnalyzer};
pub use script_detection::{detect_script, has_cjk, has_emoji, DetectedScript, ScriptDetection};
pub use sentiment::{EmotionalMoment, SarcasmAnalysis, SentimentEngine};
pub use statistics::{analyze as analyze_statistics, reading_level, ReadingLevel, TextAnalysis};
