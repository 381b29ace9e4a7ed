//! Core data models for notewise.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;
use crate::error::{Error, Result};

// =============================================================================
// NOTES
// =============================================================================

/// Snapshot of a note draft handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRef {
    pub note_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    pub modified_at: DateTime<Utc>,
}

impl NoteRef {
    /// Snapshot `content` of note `note_id`, stamped now.
    pub fn new(note_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            note_id,
            title: None,
            content: content.into(),
            modified_at: Utc::now(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

// =============================================================================
// LANGUAGE
// =============================================================================

/// One ranked guess from a hypothesis source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageHypothesis {
    /// ISO 639-1 code.
    pub code: String,
    /// Probability in [0, 1].
    pub probability: f64,
}

impl LanguageHypothesis {
    pub fn new(code: impl Into<String>, probability: f64) -> Self {
        Self {
            code: code.into(),
            probability: probability.clamp(0.0, 1.0),
        }
    }
}

/// Result of a language detection call.
///
/// `is_reliable` is always `confidence > 0.7`; construct through
/// [`DetectedLanguage::new`] to keep that invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedLanguage {
    /// ISO 639-1 code.
    pub code: String,
    /// Combined confidence in [0, 1].
    pub confidence: f64,
    pub is_reliable: bool,
    /// Endonym of the language, e.g. "Deutsch".
    pub localized_name: String,
}

impl DetectedLanguage {
    pub fn new(
        code: impl Into<String>,
        confidence: f64,
        localized_name: impl Into<String>,
    ) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        Self {
            code: code.into(),
            confidence,
            is_reliable: confidence > defaults::RELIABLE_CONFIDENCE,
            localized_name: localized_name.into(),
        }
    }

    /// Default answer for empty or whitespace-only input.
    pub fn fallback() -> Self {
        Self::new(
            defaults::FALLBACK_LANGUAGE,
            defaults::FALLBACK_CONFIDENCE,
            "English",
        )
    }
}

// =============================================================================
// SENTIMENT
// =============================================================================

/// Categorical sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    VeryNegative,
    Negative,
    Neutral,
    Positive,
    VeryPositive,
}

impl Polarity {
    /// Map a lexicon score in [-1, 1] onto a label.
    pub fn from_score(score: f64) -> Self {
        if score > 0.3 {
            Polarity::VeryPositive
        } else if score > 0.1 {
            Polarity::Positive
        } else if score < -0.3 {
            Polarity::VeryNegative
        } else if score < -0.1 {
            Polarity::Negative
        } else {
            Polarity::Neutral
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Polarity::Positive | Polarity::VeryPositive)
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, Polarity::Negative | Polarity::VeryNegative)
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Polarity::VeryNegative => "very_negative",
            Polarity::Negative => "negative",
            Polarity::Neutral => "neutral",
            Polarity::Positive => "positive",
            Polarity::VeryPositive => "very_positive",
        };
        f.write_str(s)
    }
}

/// Plutchik's eight basic emotions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionType {
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Disgust,
    Trust,
    Anticipation,
}

impl EmotionType {
    pub const ALL: [EmotionType; 8] = [
        EmotionType::Joy,
        EmotionType::Sadness,
        EmotionType::Anger,
        EmotionType::Fear,
        EmotionType::Surprise,
        EmotionType::Disgust,
        EmotionType::Trust,
        EmotionType::Anticipation,
    ];
}

/// One detected emotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    #[serde(rename = "type")]
    pub emotion_type: EmotionType,
    pub confidence: f64,
    pub intensity: f64,
}

/// Result of sentiment scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub polarity: Polarity,
    /// Raw lexicon score in [-1, 1].
    pub score: f64,
    pub confidence: f64,
    pub intensity: f64,
    pub emotions: Vec<Emotion>,
}

impl SentimentAnalysis {
    /// Zero-signal analysis returned for empty text.
    pub fn neutral() -> Self {
        Self {
            polarity: Polarity::Neutral,
            score: 0.0,
            confidence: 0.0,
            intensity: 0.0,
            emotions: Vec::new(),
        }
    }

    /// Strongest emotion, if any was detected.
    pub fn dominant_emotion(&self) -> Option<&Emotion> {
        self.emotions.first()
    }
}

// =============================================================================
// AUTO-SAVE
// =============================================================================

/// Priority tier of a queued save. Ordered `Low < Normal < High < Critical`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SavePriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl fmt::Display for SavePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SavePriority::Low => "low",
            SavePriority::Normal => "normal",
            SavePriority::High => "high",
            SavePriority::Critical => "critical",
        };
        f.write_str(s)
    }
}

impl FromStr for SavePriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(Error::InvalidInput(format!("unknown priority: {other}"))),
        }
    }
}

/// Lifecycle state of a queued save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl SaveStatus {
    /// States after which the item leaves the live queue.
    pub fn is_removed(&self) -> bool {
        matches!(self, SaveStatus::Completed | SaveStatus::Cancelled)
    }
}

/// Auto-save behavior. Process-wide, changed only through an explicit update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfiguration {
    /// Periodic drain interval, also the fixed retry delay (seconds).
    pub interval_secs: f64,
    /// Inactivity before an idle drain fires (seconds).
    pub idle_threshold_secs: f64,
    pub max_items_per_batch: usize,
    /// Total persistence attempts per item.
    pub retry_attempts: u32,
    pub exponential_backoff: bool,
    pub preserve_drafts: bool,
    /// Base for exponential backoff (seconds).
    pub retry_base_delay_secs: f64,
}

impl Default for AutoSaveConfiguration {
    fn default() -> Self {
        Self {
            interval_secs: defaults::AUTOSAVE_INTERVAL_SECS,
            idle_threshold_secs: defaults::AUTOSAVE_IDLE_THRESHOLD_SECS,
            max_items_per_batch: defaults::AUTOSAVE_MAX_ITEMS_PER_BATCH,
            retry_attempts: defaults::AUTOSAVE_RETRY_ATTEMPTS,
            exponential_backoff: true,
            preserve_drafts: true,
            retry_base_delay_secs: defaults::AUTOSAVE_RETRY_BASE_DELAY_SECS,
        }
    }
}

impl AutoSaveConfiguration {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `AUTOSAVE_INTERVAL_SECS` | `30` | Periodic drain interval |
    /// | `AUTOSAVE_IDLE_THRESHOLD_SECS` | `2` | Idle trigger delay |
    /// | `AUTOSAVE_MAX_ITEMS_PER_BATCH` | `10` | Items per drain |
    /// | `AUTOSAVE_RETRY_ATTEMPTS` | `3` | Attempts before failing |
    /// | `AUTOSAVE_EXPONENTIAL_BACKOFF` | `true` | Double delay per attempt |
    pub fn from_env() -> Self {
        fn parse<T: FromStr>(key: &str) -> Option<T> {
            std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
        }

        let base = Self::default();
        Self {
            interval_secs: parse("AUTOSAVE_INTERVAL_SECS").unwrap_or(base.interval_secs),
            idle_threshold_secs: parse("AUTOSAVE_IDLE_THRESHOLD_SECS")
                .unwrap_or(base.idle_threshold_secs),
            max_items_per_batch: parse::<usize>("AUTOSAVE_MAX_ITEMS_PER_BATCH")
                .unwrap_or(base.max_items_per_batch)
                .max(1),
            retry_attempts: parse::<u32>("AUTOSAVE_RETRY_ATTEMPTS")
                .unwrap_or(base.retry_attempts)
                .clamp(1, defaults::AUTOSAVE_MAX_RETRY_ATTEMPTS),
            exponential_backoff: std::env::var("AUTOSAVE_EXPONENTIAL_BACKOFF")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(base.exponential_backoff),
            preserve_drafts: base.preserve_drafts,
            retry_base_delay_secs: base.retry_base_delay_secs,
        }
    }

    pub fn with_interval_secs(mut self, secs: f64) -> Self {
        self.interval_secs = secs;
        self
    }

    pub fn with_idle_threshold_secs(mut self, secs: f64) -> Self {
        self.idle_threshold_secs = secs;
        self
    }

    pub fn with_max_items_per_batch(mut self, max: usize) -> Self {
        self.max_items_per_batch = max;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn with_exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    pub fn with_retry_base_delay_secs(mut self, secs: f64) -> Self {
        self.retry_base_delay_secs = secs;
        self
    }

    pub fn with_preserve_drafts(mut self, preserve: bool) -> Self {
        self.preserve_drafts = preserve;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.interval_secs > 0.0 && self.interval_secs <= defaults::AUTOSAVE_MAX_INTERVAL_SECS)
        {
            return Err(Error::Config(format!(
                "interval must be in (0, {}] seconds, got {}",
                defaults::AUTOSAVE_MAX_INTERVAL_SECS,
                self.interval_secs
            )));
        }
        if !(self.idle_threshold_secs >= 0.0
            && self.idle_threshold_secs <= defaults::AUTOSAVE_MAX_IDLE_THRESHOLD_SECS)
        {
            return Err(Error::Config(format!(
                "idle threshold must be in [0, {}] seconds, got {}",
                defaults::AUTOSAVE_MAX_IDLE_THRESHOLD_SECS,
                self.idle_threshold_secs
            )));
        }
        if self.max_items_per_batch == 0 {
            return Err(Error::Config(
                "max_items_per_batch must be at least 1".to_string(),
            ));
        }
        if self.retry_attempts == 0 || self.retry_attempts > defaults::AUTOSAVE_MAX_RETRY_ATTEMPTS
        {
            return Err(Error::Config(format!(
                "retry_attempts must be between 1 and {}, got {}",
                defaults::AUTOSAVE_MAX_RETRY_ATTEMPTS,
                self.retry_attempts
            )));
        }
        if !(self.retry_base_delay_secs >= 0.0
            && self.retry_base_delay_secs <= defaults::AUTOSAVE_MAX_BACKOFF_SECS)
        {
            return Err(Error::Config(format!(
                "retry_base_delay must be in [0, {}] seconds, got {}",
                defaults::AUTOSAVE_MAX_BACKOFF_SECS,
                self.retry_base_delay_secs
            )));
        }
        Ok(())
    }

    /// Interval clamped to `(0, AUTOSAVE_MAX_INTERVAL_SECS]`, so values that
    /// skipped validation (e.g. from the environment) never panic.
    pub fn interval(&self) -> Duration {
        clamped_secs(self.interval_secs, 0.0, defaults::AUTOSAVE_MAX_INTERVAL_SECS)
    }

    pub fn idle_threshold(&self) -> Duration {
        clamped_secs(
            self.idle_threshold_secs,
            0.0,
            defaults::AUTOSAVE_MAX_IDLE_THRESHOLD_SECS,
        )
    }

    /// Time budget for one persistence attempt.
    pub fn save_timeout(&self) -> Duration {
        clamped_secs(
            self.interval_secs,
            defaults::SAVE_TIMEOUT_FLOOR_SECS,
            defaults::SAVE_TIMEOUT_CEILING_SECS,
        )
    }

    /// Delay before retry number `retry_count` (1-based) becomes pending again.
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        let secs = if self.exponential_backoff {
            let exponent = retry_count.saturating_sub(1).min(30) as i32;
            self.retry_base_delay_secs * 2f64.powi(exponent)
        } else {
            self.interval_secs
        };
        clamped_secs(secs, 0.0, defaults::AUTOSAVE_MAX_BACKOFF_SECS)
    }
}

/// Seconds to a `Duration`, clamped to `[min, max]`. NaN maps to `min`.
fn clamped_secs(secs: f64, min: f64, max: f64) -> Duration {
    let secs = if secs.is_nan() { min } else { secs.clamp(min, max) };
    Duration::from_secs_f64(secs)
}

/// Running save statistics. Only reset explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveStatistics {
    pub total_saves: u64,
    pub successful_saves: u64,
    pub failed_saves: u64,
    pub average_save_time_ms: f64,
    pub longest_pending_time_ms: u64,
}

impl SaveStatistics {
    /// Record a successful save that took `duration` after waiting `pending`.
    pub fn record_success(&mut self, duration: Duration, pending: Duration) {
        self.total_saves += 1;
        self.successful_saves += 1;
        let n = self.successful_saves as f64;
        let ms = duration.as_secs_f64() * 1000.0;
        self.average_save_time_ms += (ms - self.average_save_time_ms) / n;
        self.observe_pending(pending);
    }

    /// Record a terminal failure after waiting `pending`.
    pub fn record_failure(&mut self, pending: Duration) {
        self.total_saves += 1;
        self.failed_saves += 1;
        self.observe_pending(pending);
    }

    fn observe_pending(&mut self, pending: Duration) {
        let ms = pending.as_millis().min(u64::MAX as u128) as u64;
        self.longest_pending_time_ms = self.longest_pending_time_ms.max(ms);
    }

    pub fn average_save_time(&self) -> Duration {
        Duration::from_secs_f64(self.average_save_time_ms / 1000.0)
    }

    pub fn longest_pending_time(&self) -> Duration {
        Duration::from_millis(self.longest_pending_time_ms)
    }

    /// Fraction of finished saves that succeeded (1.0 when nothing finished).
    pub fn success_rate(&self) -> f64 {
        if self.total_saves == 0 {
            1.0
        } else {
            self.successful_saves as f64 / self.total_saves as f64
        }
    }
}
