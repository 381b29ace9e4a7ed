//! Language classification combining external hypotheses with a
//! statistical word/character scorer.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, instrument, trace};

use notewise_core::defaults::{
    MAX_HYPOTHESES, MIXING_SATURATION, MIXING_THRESHOLD, NLP_WEIGHT, STATISTICAL_WEIGHT,
};
use notewise_core::{
    DetectedLanguage, Error, HypothesisSource, LanguageHypothesis, NoHypotheses, Result,
};

use super::characteristics::{candidates, localized_name};
use super::hypothesis::ScriptHypothesisSource;
use crate::tokenize;

const COMMON_WORD_WEIGHT: f64 = 2.0;
const SPECIAL_CHAR_WEIGHT: f64 = 3.0;
const TRIGRAM_WEIGHT: f64 = 1.0;
const STOP_WORD_WEIGHT: f64 = 1.5;

/// A sentence-like unit tagged with its language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageSegment {
    /// Byte offset of the segment in the analyzed text.
    pub position: usize,
    pub text: String,
    pub language: String,
    pub confidence: f64,
}

/// How many languages a text switches between.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageMixingAnalysis {
    /// `min(distinct languages / 5, 1)`.
    pub mixing_score: f64,
    pub is_mixed_language: bool,
    /// Most frequent segment language; earliest wins ties.
    pub primary_language: String,
    pub language_counts: BTreeMap<String, usize>,
}

/// Raw score of one candidate language.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanguageScore {
    pub code: &'static str,
    pub score: f64,
}

/// Score every candidate language, in candidate order.
///
/// Each score is `(2·common + 3·special + 1·trigram + 1.5·stop) / words`,
/// where `trigram` counts distinct text trigrams found in the profile.
pub fn statistical_scores(text: &str) -> Vec<LanguageScore> {
    let words = tokenize::normalized_words(text);
    if words.is_empty() {
        return candidates()
            .iter()
            .map(|c| LanguageScore {
                code: c.code,
                score: 0.0,
            })
            .collect();
    }

    let lowered = text.to_lowercase();
    let grams = tokenize::trigrams(&words);
    let word_count = words.len() as f64;

    candidates()
        .iter()
        .map(|lang| {
            let common = words
                .iter()
                .filter(|w| lang.common_words.contains(w.as_str()))
                .count();
            let stop = words
                .iter()
                .filter(|w| lang.stop_words.contains(w.as_str()))
                .count();
            let special = lowered
                .chars()
                .filter(|c| lang.special_chars.contains(c))
                .count();
            let trigram = grams
                .iter()
                .filter(|g| lang.trigrams.contains(g.as_str()))
                .count();

            let raw = COMMON_WORD_WEIGHT * common as f64
                + SPECIAL_CHAR_WEIGHT * special as f64
                + TRIGRAM_WEIGHT * trigram as f64
                + STOP_WORD_WEIGHT * stop as f64;
            LanguageScore {
                code: lang.code,
                score: raw / word_count,
            }
        })
        .collect()
}

/// Winning candidate and its share of the total score.
///
/// Confidence is the winner's score divided by the sum over all candidates,
/// not by the maximum score: dividing the argmax by the maximum would always
/// yield 1.0. The first-listed language wins ties; all-zero scores give
/// confidence 0.
pub fn statistical_result(text: &str) -> LanguageHypothesis {
    let scores = statistical_scores(text);
    let total: f64 = scores.iter().map(|s| s.score).sum();

    let mut best = scores[0];
    for s in &scores[1..] {
        if s.score > best.score {
            best = *s;
        }
    }

    let confidence = if total > 0.0 { best.score / total } else { 0.0 };
    LanguageHypothesis::new(best.code, confidence)
}

/// Blend the top external hypothesis with the statistical winner.
///
/// Confidence is `0.6·nlp + 0.4·statistical`; the code comes from whichever
/// side is individually more confident, external on ties. Without an
/// external hypothesis the statistical result stands alone.
pub fn combine(nlp: Option<&LanguageHypothesis>, statistical: &LanguageHypothesis) -> DetectedLanguage {
    match nlp {
        Some(nlp) => {
            let confidence =
                (NLP_WEIGHT * nlp.probability + STATISTICAL_WEIGHT * statistical.probability)
                    .clamp(0.0, 1.0);
            let code = if nlp.probability >= statistical.probability {
                &nlp.code
            } else {
                &statistical.code
            };
            DetectedLanguage::new(code.clone(), confidence, localized_name(code))
        }
        None => DetectedLanguage::new(
            statistical.code.clone(),
            statistical.probability,
            localized_name(&statistical.code),
        ),
    }
}

/// Detects the language of note text.
///
/// With the default [`ScriptHypothesisSource`], text written mostly in Latin
/// script gets no external hypothesis, so its result is the statistical
/// scorer's alone and the 0.6/0.4 blend applies only to non-Latin text or to
/// sources that rank Latin-script languages.
///
/// Cheap to clone; clones share the hypothesis source.
#[derive(Clone)]
pub struct LanguageClassifier {
    source: Arc<dyn HypothesisSource>,
}

impl Default for LanguageClassifier {
    fn default() -> Self {
        Self::new(Arc::new(ScriptHypothesisSource))
    }
}

impl std::fmt::Debug for LanguageClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageClassifier")
            .field("source", &self.source.name())
            .finish()
    }
}

impl LanguageClassifier {
    pub fn new(source: Arc<dyn HypothesisSource>) -> Self {
        Self { source }
    }

    /// Classifier that relies on the statistical scorer alone.
    pub fn statistical_only() -> Self {
        Self::new(Arc::new(NoHypotheses))
    }

    /// Detect the language of `text` on the blocking pool.
    #[instrument(skip(self, text), fields(
        subsystem = "text",
        component = "language",
        op = "detect",
        text_len = text.len(),
    ))]
    pub async fn detect(&self, text: &str) -> Result<DetectedLanguage> {
        let this = self.clone();
        let text = text.to_owned();
        run_blocking(move || this.detect_sync(&text)).await
    }

    /// Single-pass detection on the current thread.
    pub fn detect_sync(&self, text: &str) -> DetectedLanguage {
        if text.trim().is_empty() {
            return DetectedLanguage::fallback();
        }

        let start = Instant::now();
        let hypotheses = self.source.rank(text, MAX_HYPOTHESES);
        let statistical = statistical_result(text);
        let detected = combine(hypotheses.first(), &statistical);

        trace!(
            source = self.source.name(),
            nlp = ?hypotheses.first().map(|h| (&h.code, h.probability)),
            statistical = %statistical.code,
            statistical_confidence = statistical.probability,
            language = %detected.code,
            confidence = detected.confidence,
            duration_us = start.elapsed().as_micros() as u64,
            "Language detected"
        );
        detected
    }

    /// Split `text` into sentence-like units and detect each one.
    #[instrument(skip(self, text), fields(
        subsystem = "text",
        component = "language",
        op = "detect_language_change",
        text_len = text.len(),
    ))]
    pub async fn detect_language_change(&self, text: &str) -> Result<Vec<LanguageSegment>> {
        let this = self.clone();
        let text = text.to_owned();
        run_blocking(move || this.detect_language_change_sync(&text)).await
    }

    pub fn detect_language_change_sync(&self, text: &str) -> Vec<LanguageSegment> {
        tokenize::segments(text)
            .into_iter()
            .map(|seg| {
                let detected = self.detect_sync(seg.text);
                LanguageSegment {
                    position: seg.offset,
                    text: seg.text.to_string(),
                    language: detected.code,
                    confidence: detected.confidence,
                }
            })
            .collect()
    }

    /// Tally segment languages and score how mixed the text is.
    #[instrument(skip(self, text), fields(
        subsystem = "text",
        component = "language",
        op = "analyze_mixing",
        text_len = text.len(),
    ))]
    pub async fn analyze_mixing(&self, text: &str) -> Result<LanguageMixingAnalysis> {
        let this = self.clone();
        let text = text.to_owned();
        run_blocking(move || this.analyze_mixing_sync(&text)).await
    }

    pub fn analyze_mixing_sync(&self, text: &str) -> LanguageMixingAnalysis {
        let segments = self.detect_language_change_sync(text);

        let mut order: Vec<String> = Vec::new();
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for seg in &segments {
            let entry = counts.entry(seg.language.clone()).or_insert(0);
            if *entry == 0 {
                order.push(seg.language.clone());
            }
            *entry += 1;
        }

        let mut primary = notewise_core::defaults::FALLBACK_LANGUAGE.to_string();
        let mut primary_count = 0;
        for code in &order {
            let count = counts.get(code).copied().unwrap_or(0);
            if count > primary_count {
                primary = code.clone();
                primary_count = count;
            }
        }

        let mixing_score = (counts.len() as f64 / MIXING_SATURATION as f64).min(1.0);
        debug!(
            segments = segments.len(),
            distinct = counts.len(),
            mixing_score,
            primary = %primary,
            "Language mixing analyzed"
        );

        LanguageMixingAnalysis {
            mixing_score,
            is_mixed_language: mixing_score > MIXING_THRESHOLD,
            primary_language: primary,
            language_counts: counts,
        }
    }
}

/// Run CPU-bound analysis on the blocking pool.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(format!("analysis task failed: {}", e)))
}
