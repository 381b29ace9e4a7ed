//! Property and end-to-end tests for the text analysis crate.
//!
//! Covers:
//! - Statistics invariants over randomly generated text
//! - Language detection across scripts and Latin-script candidates
//! - Sentiment scoring across languages
//! - The cancellable analysis pipeline

use rand::seq::SliceRandom;
use rand::Rng;

use notewise_text::{
    analyze_statistics, CancellationToken, DetectedScript, LanguageClassifier, SentimentEngine,
    TextAnalyzer,
};

const ALPHABET: &[char] = &[
    'a', 'b', 'e', 'k', 'z', 'ä', 'ß', 'é', 'ж', '日', '.', '!', '?', '…', ',', ' ', ' ', '\n',
    '\t',
];

fn random_text(rng: &mut impl Rng) -> String {
    let len = rng.gen_range(0..80);
    (0..len)
        .map(|_| *ALPHABET.choose(rng).unwrap_or(&' '))
        .collect()
}

// ========== STATISTICS PROPERTIES ==========

#[test]
fn test_zero_counts_iff_blank() {
    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        let text = random_text(&mut rng);
        let stats = analyze_statistics(&text);
        let blank = text.trim().is_empty();
        assert_eq!(stats.word_count == 0, blank, "text {:?}", text);
        assert_eq!(stats.char_count == 0, blank, "text {:?}", text);
    }
}

#[test]
fn test_reading_time_at_least_one_minute() {
    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        let text = random_text(&mut rng);
        if text.trim().is_empty() {
            continue;
        }
        let stats = analyze_statistics(&text);
        assert!(stats.estimated_reading_time >= 1, "text {:?}", text);
        assert!(stats.sentence_count >= 1);
        assert!((0.0..=100.0).contains(&stats.readability_score));
    }
}

// ========== LANGUAGE DETECTION ==========

#[tokio::test]
async fn test_detect_empty_is_english_fallback() {
    let detected = LanguageClassifier::default().detect("").await.unwrap();
    assert_eq!(detected.code, "en");
    assert_eq!(detected.confidence, 0.5);
    assert!(!detected.is_reliable);
}

#[tokio::test]
async fn test_detect_german_stop_words() {
    let detected = LanguageClassifier::default()
        .detect("der die das und ist")
        .await
        .unwrap();
    assert_eq!(detected.code, "de");
    assert!(detected.confidence > 0.5);
}

#[tokio::test]
async fn test_detect_non_latin_scripts() {
    let classifier = LanguageClassifier::default();
    let cases = [
        ("Это очень хороший день", "ru"),
        ("Καλημέρα σε όλους", "el"),
        ("مرحبا بكم في البيت", "ar"),
        ("שלום לכולם", "he"),
        ("आज मौसम अच्छा है", "hi"),
        ("วันนี้อากาศดี", "th"),
        ("오늘 날씨가 좋아요", "ko"),
        ("今日はいい天気です", "ja"),
        ("今天天气很好", "zh"),
    ];
    for (text, expected) in cases {
        let detected = classifier.detect(text).await.unwrap();
        assert_eq!(detected.code, expected, "text {}", text);
        assert!(detected.confidence > 0.5);
        assert_eq!(detected.is_reliable, detected.confidence > 0.7);
    }
}

#[test]
fn test_reliability_matches_confidence_on_random_text() {
    let classifier = LanguageClassifier::default();
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let text = random_text(&mut rng);
        let detected = classifier.detect_sync(&text);
        assert!((0.0..=1.0).contains(&detected.confidence));
        assert_eq!(detected.is_reliable, detected.confidence > 0.7);
    }
}

#[tokio::test]
async fn test_mixed_note_segments() {
    let classifier = LanguageClassifier::default();
    let text = "Meeting notes for today.\nDas Wetter ist heute sehr schön.\nПривет из Москвы";
    let segments = classifier.detect_language_change(text).await.unwrap();
    let codes: Vec<&str> = segments.iter().map(|s| s.language.as_str()).collect();
    assert_eq!(codes, vec!["en", "de", "ru"]);

    let mixing = classifier.analyze_mixing(text).await.unwrap();
    assert!(mixing.is_mixed_language);
    assert_eq!(mixing.primary_language, "en");
}

#[test]
fn test_script_detection_reexport() {
    assert_eq!(
        notewise_text::detect_script("안녕").primary,
        DetectedScript::Hangul
    );
}

// ========== SENTIMENT ==========

#[tokio::test]
async fn test_german_positive_sentence() {
    let analysis = SentimentEngine::new()
        .analyze("Das ist fantastisch und großartig", "de")
        .await
        .unwrap();
    assert!(analysis.polarity.is_positive());
}

#[tokio::test]
async fn test_sentiment_bounds_on_random_text() {
    let engine = SentimentEngine::new();
    let mut rng = rand::thread_rng();
    let words = ["good", "bad", "very", "happy", "sad", "the", "gut", "schlecht"];
    for _ in 0..300 {
        let count = rng.gen_range(0..20);
        let text: Vec<&str> = (0..count)
            .map(|_| *words.choose(&mut rng).unwrap_or(&"the"))
            .collect();
        let analysis = engine.analyze_sync(&text.join(" "), "en");
        assert!((-1.0..=1.0).contains(&analysis.score));
        assert!((0.0..=1.0).contains(&analysis.confidence));
        assert!((0.0..=1.0).contains(&analysis.intensity));
        assert!(analysis
            .emotions
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
    }
}

// ========== PIPELINE ==========

#[tokio::test]
async fn test_pipeline_serializes_insights() {
    let insights = TextAnalyzer::default()
        .analyze(None, "What a wonderful morning.", &CancellationToken::new())
        .await
        .unwrap();
    let json = serde_json::to_value(&insights).unwrap();
    assert_eq!(json["language"]["code"], "en");
    assert_eq!(json["statistics"]["word_count"], 4);
    assert!(json.get("sarcasm").is_none());
}
