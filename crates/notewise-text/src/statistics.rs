//! Counts, averages and a readability index for a piece of text.
//!
//! Everything here is a pure function over `&str`; there are no failure
//! modes. Degenerate input (empty or whitespace-only) yields zeroed
//! statistics.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use notewise_core::defaults::{AVG_SYLLABLES_PER_WORD, READING_WORDS_PER_MINUTE};

use crate::tokenize;

/// Statistics for one text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextAnalysis {
    /// Unicode scalar values, whitespace included.
    pub char_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub avg_words_per_sentence: f64,
    /// Whole minutes at 200 words per minute, at least 1 for non-empty text.
    pub estimated_reading_time: usize,
    /// Flesch Reading Ease approximation, clamped to [0, 100].
    pub readability_score: f64,
}

impl TextAnalysis {
    /// Reading time as a [`Duration`].
    pub fn reading_time(&self) -> Duration {
        Duration::from_secs(self.estimated_reading_time as u64 * 60)
    }

    /// Label for the readability score.
    pub fn reading_level(&self) -> ReadingLevel {
        reading_level(self.readability_score)
    }
}

/// Compute statistics for `text`.
///
/// # Examples
///
/// ```
/// use notewise_text::statistics::analyze;
///
/// let stats = analyze("The cat sat. The dog ran!");
/// assert_eq!(stats.word_count, 6);
/// assert_eq!(stats.sentence_count, 2);
/// assert_eq!(stats.estimated_reading_time, 1);
/// ```
pub fn analyze(text: &str) -> TextAnalysis {
    if text.trim().is_empty() {
        return TextAnalysis::default();
    }

    let char_count = text.chars().count();
    let word_count = tokenize::words(text).count();
    // Non-blank text without a terminator still holds one sentence
    let sentence_count = tokenize::sentences(text).len().max(1);
    let paragraph_count = tokenize::paragraphs(text).len().max(1);

    let avg_words_per_sentence = word_count as f64 / sentence_count as f64;

    TextAnalysis {
        char_count,
        word_count,
        sentence_count,
        paragraph_count,
        avg_words_per_sentence,
        estimated_reading_time: (word_count / READING_WORDS_PER_MINUTE).max(1),
        readability_score: readability_score(avg_words_per_sentence),
    }
}

/// Flesch Reading Ease with a fixed syllables-per-word average.
pub fn readability_score(avg_words_per_sentence: f64) -> f64 {
    let score =
        206.835 - 1.015 * avg_words_per_sentence - 84.6 * AVG_SYLLABLES_PER_WORD;
    score.clamp(0.0, 100.0)
}

/// Flesch reading-ease band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingLevel {
    VeryEasy,
    Easy,
    FairlyEasy,
    Standard,
    FairlyDifficult,
    Difficult,
    VeryDifficult,
}

impl fmt::Display for ReadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReadingLevel::VeryEasy => "very easy",
            ReadingLevel::Easy => "easy",
            ReadingLevel::FairlyEasy => "fairly easy",
            ReadingLevel::Standard => "standard",
            ReadingLevel::FairlyDifficult => "fairly difficult",
            ReadingLevel::Difficult => "difficult",
            ReadingLevel::VeryDifficult => "very difficult",
        };
        f.write_str(s)
    }
}

/// Map a Flesch score onto its band.
pub fn reading_level(score: f64) -> ReadingLevel {
    match score {
        s if s >= 90.0 => ReadingLevel::VeryEasy,
        s if s >= 80.0 => ReadingLevel::Easy,
        s if s >= 70.0 => ReadingLevel::FairlyEasy,
        s if s >= 60.0 => ReadingLevel::Standard,
        s if s >= 50.0 => ReadingLevel::FairlyDifficult,
        s if s >= 30.0 => ReadingLevel::Difficult,
        _ => ReadingLevel::VeryDifficult,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_whitespace_are_zeroed() {
        for text in ["", "   ", "\n\n\t "] {
            let stats = analyze(text);
            assert_eq!(stats, TextAnalysis::default(), "input {:?}", text);
            assert_eq!(stats.readability_score, 0.0);
            assert_eq!(stats.estimated_reading_time, 0);
        }
    }

    #[test]
    fn test_basic_counts() {
        let stats = analyze("Hello world. How are you?\n\nFine, thanks!");
        assert_eq!(stats.word_count, 7);
        assert_eq!(stats.sentence_count, 3);
        assert_eq!(stats.paragraph_count, 2);
        assert!((stats.avg_words_per_sentence - 7.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.char_count, 40);
    }

    #[test]
    fn test_no_terminal_punctuation_is_one_sentence() {
        let stats = analyze("just some words without an ending");
        assert_eq!(stats.sentence_count, 1);
        assert_eq!(stats.avg_words_per_sentence, 6.0);
    }

    #[test]
    fn test_punctuation_only_text() {
        let stats = analyze("...");
        assert_eq!(stats.word_count, 1);
        assert_eq!(stats.sentence_count, 1);
        assert_eq!(stats.estimated_reading_time, 1);
    }

    #[test]
    fn test_reading_time_uses_integer_minutes() {
        let text = "word ".repeat(450);
        let stats = analyze(&text);
        assert_eq!(stats.word_count, 450);
        assert_eq!(stats.estimated_reading_time, 2);
        assert_eq!(stats.reading_time(), Duration::from_secs(120));
    }

    #[test]
    fn test_readability_formula() {
        let stats = analyze("The cat sat on the mat.");
        let expected = 206.835 - 1.015 * 6.0 - 84.6 * 1.5;
        assert!((stats.readability_score - expected).abs() < 1e-9);
        assert_eq!(stats.reading_level(), ReadingLevel::FairlyEasy);
    }

    #[test]
    fn test_readability_is_clamped() {
        assert_eq!(readability_score(500.0), 0.0);
        assert!(readability_score(0.0) <= 100.0);
    }

    #[test]
    fn test_reading_level_bands() {
        assert_eq!(reading_level(95.0), ReadingLevel::VeryEasy);
        assert_eq!(reading_level(85.0), ReadingLevel::Easy);
        assert_eq!(reading_level(70.0), ReadingLevel::FairlyEasy);
        assert_eq!(reading_level(65.0), ReadingLevel::Standard);
        assert_eq!(reading_level(55.0), ReadingLevel::FairlyDifficult);
        assert_eq!(reading_level(30.0), ReadingLevel::Difficult);
        assert_eq!(reading_level(10.0), ReadingLevel::VeryDifficult);
        assert_eq!(ReadingLevel::FairlyDifficult.to_string(), "fairly difficult");
    }
}
