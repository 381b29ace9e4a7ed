//! Centralized default constants for notewise.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// TEXT STATISTICS
// =============================================================================

/// Reading speed used for reading-time estimates (words per minute).
pub const READING_WORDS_PER_MINUTE: usize = 200;

/// Fixed syllables-per-word estimate for the Flesch approximation.
pub const AVG_SYLLABLES_PER_WORD: f64 = 1.5;

// =============================================================================
// LANGUAGE DETECTION
// =============================================================================

/// Language reported for empty input.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Confidence reported for empty input.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Confidence above which a detection is considered reliable.
pub const RELIABLE_CONFIDENCE: f64 = 0.7;

/// Weight of the NLP hypothesis in the combined confidence.
pub const NLP_WEIGHT: f64 = 0.6;

/// Weight of the statistical scorer in the combined confidence.
pub const STATISTICAL_WEIGHT: f64 = 0.4;

/// Maximum hypotheses requested from a hypothesis source.
pub const MAX_HYPOTHESES: usize = 3;

/// Distinct languages at which the mixing score saturates.
pub const MIXING_SATURATION: usize = 5;

/// Mixing score above which text counts as mixed-language.
pub const MIXING_THRESHOLD: f64 = 0.3;

// =============================================================================
// SENTIMENT
// =============================================================================

/// Scale applied to the intensifier ratio before capping at 1.0.
pub const INTENSITY_SCALE: f64 = 5.0;

/// Word count at which length-based confidence saturates.
pub const CONFIDENCE_WORD_SATURATION: usize = 10;

/// Score added per distinct sarcasm indicator.
pub const SARCASM_INDICATOR_WEIGHT: f64 = 0.2;

/// Sarcasm score above which text is flagged.
pub const SARCASM_THRESHOLD: f64 = 0.3;

// =============================================================================
// AUTO-SAVE
// =============================================================================

/// Interval between periodic auto-save drains (seconds).
pub const AUTOSAVE_INTERVAL_SECS: f64 = 30.0;

/// Inactivity before an idle drain fires (seconds).
pub const AUTOSAVE_IDLE_THRESHOLD_SECS: f64 = 2.0;

/// Items dispatched per `process_queue` call.
pub const AUTOSAVE_MAX_ITEMS_PER_BATCH: usize = 10;

/// Persistence attempts before an item fails terminally.
pub const AUTOSAVE_RETRY_ATTEMPTS: u32 = 3;

/// Upper bound accepted for `retry_attempts`.
pub const AUTOSAVE_MAX_RETRY_ATTEMPTS: u32 = 10;

/// Base delay for exponential backoff (seconds).
pub const AUTOSAVE_RETRY_BASE_DELAY_SECS: f64 = 1.0;

/// Longest backoff delay ever scheduled (seconds).
pub const AUTOSAVE_MAX_BACKOFF_SECS: f64 = 300.0;

/// Longest accepted periodic drain interval (seconds).
pub const AUTOSAVE_MAX_INTERVAL_SECS: f64 = 86_400.0;

/// Longest accepted idle threshold (seconds).
pub const AUTOSAVE_MAX_IDLE_THRESHOLD_SECS: f64 = 3_600.0;

/// Floor for a single persistence attempt (seconds).
pub const SAVE_TIMEOUT_FLOOR_SECS: f64 = 1.0;

/// Ceiling for a single persistence attempt (seconds).
pub const SAVE_TIMEOUT_CEILING_SECS: f64 = 30.0;

/// Coordinator command channel capacity.
pub const COMMAND_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// EVENTS
// =============================================================================

/// Default event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Ollama base URL.
pub const LLM_URL: &str = "http://127.0.0.1:11434";

/// Default generation model name.
pub const LLM_MODEL: &str = "llama3.2:3b";

/// Timeout for generation requests in seconds.
pub const LLM_TIMEOUT_SECS: u64 = 120;

/// Timeout for the model listing and health probes in seconds.
pub const LLM_PROBE_TIMEOUT_SECS: u64 = 5;

/// Sampling temperature.
pub const LLM_TEMPERATURE: f64 = 0.7;

/// Top-k sampling cutoff.
pub const LLM_TOP_K: u32 = 40;

/// Nucleus sampling cutoff.
pub const LLM_TOP_P: f64 = 0.9;

/// Maximum tokens to generate.
pub const LLM_NUM_PREDICT: i32 = 512;

/// Context window size in tokens.
pub const LLM_NUM_CTX: u32 = 4096;

// =============================================================================
// PREFERENCES
// =============================================================================

/// Key under which the preferences blob is stored.
pub const PREFERENCES_KEY: &str = "notewise.preferences";

/// Default preferred language code.
pub const PREFERRED_LANGUAGE: &str = "en";
