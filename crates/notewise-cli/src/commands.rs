//! Command implementations behind the `notewise` binary.
//!
//! Each command returns a serializable report; the binary prints it as
//! pretty JSON.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use notewise_autosave::{
    AutoSaveBuilder, AutoSaveConfiguration, MemoryPersistence, NoteRef, ProcessReport,
    QueueMetrics, SavePriority,
};
use notewise_core::{
    DetectedLanguage, FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, Preferences,
    PreferencesManager, SentimentAnalysis,
};
use notewise_inference::{GenerateResponse, LlmConfig, OllamaClient};
use notewise_text::{
    AnalysisOptions, CancellationToken, EmotionalMoment, LanguageClassifier,
    LanguageMixingAnalysis, LanguageSegment, NoteInsights, SarcasmAnalysis, SentimentEngine,
    TextAnalyzer,
};

// =============================================================================
// ANALYSIS
// =============================================================================

/// Full pipeline over one note, honoring the analysis preferences.
#[instrument(skip_all, fields(subsystem = "cli", op = "analyze"))]
pub async fn analyze(
    text: &str,
    prefs: &Preferences,
    cancel: &CancellationToken,
) -> Result<NoteInsights> {
    let analyzer = TextAnalyzer::default().with_options(AnalysisOptions::new(
        prefs.language.clone(),
        prefs.analysis.clone(),
    ));
    Ok(analyzer.analyze(None, text, cancel).await?)
}

#[derive(Debug, Serialize)]
pub struct DetectReport {
    pub language: DetectedLanguage,
    pub segments: Vec<LanguageSegment>,
    pub mixing: LanguageMixingAnalysis,
}

/// Language of the whole text plus per-segment detection.
pub async fn detect(text: &str) -> Result<DetectReport> {
    let classifier = LanguageClassifier::default();
    Ok(DetectReport {
        language: classifier.detect(text).await?,
        segments: classifier.detect_language_change(text).await?,
        mixing: classifier.analyze_mixing(text).await?,
    })
}

#[derive(Debug, Serialize)]
pub struct SentimentReport {
    pub language: String,
    pub analysis: SentimentAnalysis,
    pub journey: Vec<EmotionalMoment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sarcasm: Option<SarcasmAnalysis>,
}

/// Sentiment, per-sentence journey, and optionally sarcasm.
///
/// Without an explicit `language`, the detected one is used.
pub async fn sentiment(
    text: &str,
    language: Option<&str>,
    with_sarcasm: bool,
) -> Result<SentimentReport> {
    let language = match language {
        Some(code) => code.to_string(),
        None => LanguageClassifier::default().detect(text).await?.code,
    };
    let engine = SentimentEngine::new();
    Ok(SentimentReport {
        analysis: engine.analyze(text, &language).await?,
        journey: engine.emotional_journey(text, &language).await?,
        sarcasm: with_sarcasm.then(|| engine.detect_sarcasm(text)),
        language,
    })
}

// =============================================================================
// GENERATION
// =============================================================================

/// Run one prompt against the local LLM.
///
/// When streaming, fragments are written to `out` as they arrive and the
/// returned response carries the concatenated text.
#[instrument(skip_all, fields(subsystem = "cli", op = "generate", stream = stream))]
pub async fn generate(
    config: LlmConfig,
    prompt: &str,
    stream: bool,
    out: &mut (dyn Write + Send),
) -> Result<GenerateResponse> {
    let client = OllamaClient::new(config)?;

    if !stream {
        let response = client.generate(prompt).await?;
        writeln!(out, "{}", response.response)?;
        return Ok(response);
    }

    let mut fragments = client.generate_stream(prompt).await?;
    let mut text = String::new();
    let mut last = GenerateResponse::default();
    while let Some(fragment) = fragments.next().await {
        let fragment = fragment?;
        write!(out, "{}", fragment.response)?;
        out.flush()?;
        text.push_str(&fragment.response);
        last = fragment;
    }
    writeln!(out)?;
    last.response = text;
    Ok(last)
}

// =============================================================================
// AUTO-SAVE DEMO
// =============================================================================

/// Options for [`save_demo`].
#[derive(Debug, Clone)]
pub struct SaveDemoOptions {
    pub notes: usize,
    /// Every n-th note fails this many times before it saves.
    pub flaky_every: Option<usize>,
    pub flaky_failures: u32,
    pub save_delay: Duration,
    pub config: AutoSaveConfiguration,
}

impl Default for SaveDemoOptions {
    fn default() -> Self {
        Self {
            notes: 8,
            flaky_every: Some(3),
            flaky_failures: 1,
            save_delay: Duration::from_millis(20),
            config: AutoSaveConfiguration::default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveDemoReport {
    pub report: ProcessReport,
    pub metrics: QueueMetrics,
}

/// Queue notes with mixed priorities into an in-memory store and force a
/// full save, showing order, retries, and statistics.
#[instrument(skip_all, fields(subsystem = "cli", op = "save_demo", notes = options.notes))]
pub async fn save_demo(options: SaveDemoOptions) -> Result<SaveDemoReport> {
    const PRIORITIES: [SavePriority; 4] = [
        SavePriority::Low,
        SavePriority::Normal,
        SavePriority::High,
        SavePriority::Critical,
    ];

    let store = MemoryPersistence::new().with_delay(options.save_delay);
    let handle = AutoSaveBuilder::new(Arc::new(store.clone()))
        .with_config(options.config.clone())
        .start()
        .context("invalid auto-save configuration")?;

    for i in 0..options.notes {
        let note_id = Uuid::new_v4();
        if options.flaky_every.is_some_and(|n| n > 0 && (i + 1) % n == 0) {
            store.fail_note(note_id, options.flaky_failures);
        }
        let priority = PRIORITIES[i % PRIORITIES.len()];
        handle
            .enqueue(
                NoteRef::new(note_id, format!("Draft {}", i + 1))
                    .with_title(format!("Note {}", i + 1)),
                priority,
            )
            .await?;
    }

    let report = handle.force_save_all().await?;
    let metrics = handle.metrics().await?;
    handle.shutdown().await?;

    info!(
        completed = report.completed(),
        failed = report.failed(),
        "Save demo finished"
    );
    Ok(SaveDemoReport { report, metrics })
}

// =============================================================================
// PREFERENCES
// =============================================================================

/// Open the preference store in `dir`, or an in-memory one when `None`.
pub async fn open_preferences(dir: Option<&Path>) -> PreferencesManager {
    let store: Arc<dyn PreferenceStore> = match dir {
        Some(dir) => Arc::new(FilePreferenceStore::new(dir)),
        None => Arc::new(MemoryPreferenceStore::new()),
    };
    PreferencesManager::load(store, None).await
}

/// Write the current preferences to `path`, or return them for stdout.
pub async fn export_preferences(
    manager: &PreferencesManager,
    path: Option<&Path>,
) -> Result<Preferences> {
    let prefs = manager.current().await;
    if let Some(path) = path {
        let bytes = manager.export().await?;
        std::fs::write(path, bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "Exported preferences");
    }
    Ok(prefs)
}

/// Replace the stored preferences with the contents of `path`.
pub async fn import_preferences(manager: &PreferencesManager, path: &Path) -> Result<Preferences> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    manager
        .import(&bytes)
        .await
        .with_context(|| format!("invalid preferences in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sentiment_uses_detected_language() {
        let report = sentiment(
            "Das ist fantastisch und großartig. Ich bin sehr glücklich!",
            None,
            false,
        )
            .await
            .unwrap();
        assert_eq!(report.language, "de");
        assert!(report.analysis.polarity.is_positive());
        assert!(report.sarcasm.is_none());
    }

    #[tokio::test]
    async fn test_detect_report() {
        let report = detect("der die das und ist").await.unwrap();
        assert_eq!(report.language.code, "de");
        assert_eq!(report.segments.len(), 1);
        assert!(!report.mixing.is_mixed_language);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_demo_saves_everything() {
        let report = save_demo(SaveDemoOptions::default()).await.unwrap();
        assert_eq!(report.report.completed(), 8);
        assert_eq!(report.report.retried(), 2);
        assert_eq!(report.metrics.queue_length, 0);
        assert_eq!(report.metrics.statistics.successful_saves, 8);
    }
}
