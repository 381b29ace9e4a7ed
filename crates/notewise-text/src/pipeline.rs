//! One-call analysis of a note: statistics, then language, then sentiment.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use notewise_core::{
    AnalysisPreferences, CoreEvent, DetectedLanguage, Error, EventBus, LanguagePreferences,
    Result, SentimentAnalysis,
};

use crate::language::{localized_name, LanguageClassifier};
use crate::sentiment::{SarcasmAnalysis, SentimentEngine};
use crate::statistics::{self, ReadingLevel, TextAnalysis};

/// Which stages run and how the language is chosen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisOptions {
    pub language: LanguagePreferences,
    pub analysis: AnalysisPreferences,
}

impl AnalysisOptions {
    pub fn new(language: LanguagePreferences, analysis: AnalysisPreferences) -> Self {
        Self { language, analysis }
    }
}

/// Everything the UI shows about one note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteInsights {
    pub statistics: TextAnalysis,
    pub reading_level: ReadingLevel,
    pub language: DetectedLanguage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sarcasm: Option<SarcasmAnalysis>,
}

/// Runs the analysis stages off the caller's thread.
#[derive(Debug, Clone, Default)]
pub struct TextAnalyzer {
    classifier: LanguageClassifier,
    sentiment: SentimentEngine,
    options: AnalysisOptions,
    events: Option<EventBus>,
}

impl TextAnalyzer {
    pub fn new(classifier: LanguageClassifier, sentiment: SentimentEngine) -> Self {
        Self {
            classifier,
            sentiment,
            options: AnalysisOptions::default(),
            events: None,
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    /// Emit [`CoreEvent::NoteAnalyzed`] after each successful run.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Analyze `text`, giving up with [`Error::Cancelled`] if `cancel` fires first.
    ///
    /// Cancellation is checked between stages on the worker as well, so an
    /// abandoned run stops early instead of finishing in the background.
    #[instrument(skip(self, text, cancel), fields(
        subsystem = "text",
        component = "pipeline",
        op = "analyze",
        text_len = text.len(),
    ))]
    pub async fn analyze(
        &self,
        note_id: Option<Uuid>,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<NoteInsights> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled("analysis cancelled before start".to_string()));
        }

        let start = std::time::Instant::now();
        let this = self.clone();
        let owned = text.to_owned();
        let worker_token = cancel.child_token();
        let task = tokio::task::spawn_blocking(move || this.run_stages(&owned, &worker_token));

        let insights = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Analysis cancelled");
                return Err(Error::Cancelled("analysis cancelled".to_string()));
            }
            joined = task => joined
                .map_err(|e| Error::Internal(format!("analysis task failed: {}", e)))??,
        };

        info!(
            language = %insights.language.code,
            word_count = insights.statistics.word_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Note analyzed"
        );

        if let Some(events) = &self.events {
            events.emit(CoreEvent::NoteAnalyzed {
                note_id,
                language: insights.language.code.clone(),
                polarity: insights
                    .sentiment
                    .as_ref()
                    .map(|s| s.polarity)
                    .unwrap_or(notewise_core::Polarity::Neutral),
            });
        }

        Ok(insights)
    }

    /// All stages on the current thread.
    pub fn run_stages(&self, text: &str, cancel: &CancellationToken) -> Result<NoteInsights> {
        let check = || {
            if cancel.is_cancelled() {
                Err(Error::Cancelled("analysis cancelled".to_string()))
            } else {
                Ok(())
            }
        };

        let stats = statistics::analyze(text);
        check()?;

        let language = if self.options.language.auto_detect {
            self.classifier.detect_sync(text)
        } else {
            let code = self.options.language.preferred_language.clone();
            let name = localized_name(&code);
            DetectedLanguage::new(code, 1.0, name)
        };
        check()?;

        let sentiment = if self.options.analysis.sentiment_enabled {
            let mut analysis = self.sentiment.analyze_sync(text, &language.code);
            if !self.options.analysis.emotion_detection {
                analysis.emotions.clear();
            }
            Some(analysis)
        } else {
            None
        };

        let sarcasm = self
            .options
            .analysis
            .sarcasm_detection
            .then(|| self.sentiment.detect_sarcasm(text));

        Ok(NoteInsights {
            reading_level: stats.reading_level(),
            statistics: stats,
            language,
            sentiment,
            sarcasm,
        })
    }
}
