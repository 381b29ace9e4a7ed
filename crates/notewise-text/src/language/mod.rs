//! Language detection.
//!
//! [`LanguageClassifier`] blends a [`HypothesisSource`](notewise_core::HypothesisSource)
//! with a statistical scorer over the candidate languages in
//! [`characteristics`].

pub mod characteristics;
pub mod classifier;
pub mod hypothesis;

pub use characteristics::{localized_name, LanguageCharacteristics, SentenceStructure};
pub use classifier::{
    combine, statistical_result, statistical_scores, LanguageClassifier, LanguageMixingAnalysis,
    LanguageScore, LanguageSegment,
};
pub use hypothesis::ScriptHypothesisSource;
