//! Lexicon-based polarity, intensity and emotion scoring.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, instrument};

use notewise_core::defaults::{
    CONFIDENCE_WORD_SATURATION, INTENSITY_SCALE, SARCASM_INDICATOR_WEIGHT, SARCASM_THRESHOLD,
};
use notewise_core::{Emotion, EmotionType, Polarity, Result, SentimentAnalysis};

use super::lexicon::{lexicon, EMOTION_KEYWORDS, SARCASM_INDICATORS};
use crate::language::classifier::run_blocking;
use crate::tokenize;

/// Sentiment of one punctuation-delimited segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionalMoment {
    /// Byte offset of the segment in the analyzed text.
    pub position: usize,
    pub text: String,
    pub polarity: Polarity,
    pub score: f64,
    pub intensity: f64,
    pub emotions: Vec<Emotion>,
}

/// Result of sarcasm indicator matching.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SarcasmAnalysis {
    pub has_sarcasm: bool,
    /// `0.2` per distinct indicator, capped at 1.
    pub score: f64,
    /// Matched indicator phrases, in list order.
    pub indicators: Vec<String>,
}

/// Scores sentiment against the static lexicons.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentEngine;

impl SentimentEngine {
    pub fn new() -> Self {
        Self
    }

    /// Score `text` written in `language` on the blocking pool.
    #[instrument(skip(self, text), fields(
        subsystem = "text",
        component = "sentiment",
        op = "analyze",
        text_len = text.len(),
    ))]
    pub async fn analyze(&self, text: &str, language: &str) -> Result<SentimentAnalysis> {
        let text = text.to_owned();
        let language = language.to_owned();
        run_blocking(move || SentimentEngine.analyze_sync(&text, &language)).await
    }

    pub fn analyze_sync(&self, text: &str, language: &str) -> SentimentAnalysis {
        let words = tokenize::normalized_words(text);
        if words.is_empty() {
            return SentimentAnalysis::neutral();
        }

        let lex = lexicon(language);
        let word_count = words.len() as f64;
        let positive = words
            .iter()
            .filter(|w| lex.positive.contains(w.as_str()))
            .count();
        let negative = words
            .iter()
            .filter(|w| lex.negative.contains(w.as_str()))
            .count();
        let intensifiers = words
            .iter()
            .filter(|w| lex.intensifiers.contains(w.as_str()))
            .count();

        let score = ((positive as f64 - negative as f64) / word_count).clamp(-1.0, 1.0);
        let intensity = (intensifiers as f64 / word_count * INTENSITY_SCALE).min(1.0);

        let length_confidence = (word_count / CONFIDENCE_WORD_SATURATION as f64).min(1.0);
        let indicator_density = ((positive + negative) as f64 / word_count).min(1.0);
        let confidence = (length_confidence + indicator_density) / 2.0;

        let emotions = detect_emotions(text, words.len());

        debug!(
            lexicon = lex.code,
            positive,
            negative,
            intensifiers,
            score,
            emotion_count = emotions.len(),
            "Sentiment scored"
        );

        SentimentAnalysis {
            polarity: Polarity::from_score(score),
            score,
            confidence,
            intensity,
            emotions,
        }
    }

    /// Score each sentence of `text` in order.
    #[instrument(skip(self, text), fields(
        subsystem = "text",
        component = "sentiment",
        op = "emotional_journey",
        text_len = text.len(),
    ))]
    pub async fn emotional_journey(
        &self,
        text: &str,
        language: &str,
    ) -> Result<Vec<EmotionalMoment>> {
        let text = text.to_owned();
        let language = language.to_owned();
        run_blocking(move || SentimentEngine.emotional_journey_sync(&text, &language)).await
    }

    pub fn emotional_journey_sync(&self, text: &str, language: &str) -> Vec<EmotionalMoment> {
        tokenize::sentences(text)
            .into_iter()
            .map(|seg| {
                let analysis = self.analyze_sync(seg.text, language);
                EmotionalMoment {
                    position: seg.offset,
                    text: seg.text.to_string(),
                    polarity: analysis.polarity,
                    score: analysis.score,
                    intensity: analysis.intensity,
                    emotions: analysis.emotions,
                }
            })
            .collect()
    }

    /// Match `text` against the sarcasm indicator phrases.
    pub fn detect_sarcasm(&self, text: &str) -> SarcasmAnalysis {
        let lowered = text.to_lowercase();
        let indicators: Vec<String> = SARCASM_INDICATORS
            .iter()
            .filter(|phrase| lowered.contains(*phrase))
            .map(|phrase| phrase.to_string())
            .collect();

        let score = (indicators.len() as f64 * SARCASM_INDICATOR_WEIGHT).min(1.0);
        SarcasmAnalysis {
            has_sarcasm: score > SARCASM_THRESHOLD,
            score,
            indicators,
        }
    }
}

/// Substring-match the emotion table against `text`.
///
/// Confidence is occurrences per hundred characters, intensity is five
/// times occurrences per word; both cap at 1.
fn detect_emotions(text: &str, word_count: usize) -> Vec<Emotion> {
    let lowered = text.to_lowercase();
    let per_hundred_chars = text.chars().count() as f64 / 100.0;

    let mut emotions: Vec<Emotion> = EmotionType::ALL
        .iter()
        .filter_map(|emotion| {
            let occurrences: usize = EMOTION_KEYWORDS
                .iter()
                .filter(|(_, e)| e == emotion)
                .map(|(keyword, _)| lowered.matches(keyword).count())
                .sum();
            if occurrences == 0 {
                return None;
            }
            Some(Emotion {
                emotion_type: *emotion,
                confidence: (occurrences as f64 / per_hundred_chars).min(1.0),
                intensity: (occurrences as f64 / word_count as f64 * INTENSITY_SCALE).min(1.0),
            })
        })
        .collect();

    emotions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then(a.emotion_type.cmp(&b.emotion_type))
    });
    emotions
}
