//! Structured logging schema and field name constants for notewise.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log tooling can query by the same field names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (segments, tokens) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "text", "autosave", "inference", "preferences", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "language_classifier", "sentiment", "coordinator", "ollama"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "detect", "analyze", "process_queue", "generate"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Save queue item UUID.
pub const ITEM_ID: &str = "item_id";

/// Save priority tier.
pub const PRIORITY: &str = "priority";

/// Detected language code.
pub const LANGUAGE: &str = "language";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of items in a batch or result.
pub const RESULT_COUNT: &str = "result_count";

/// Number of words in analyzed text.
pub const WORD_COUNT: &str = "word_count";

/// Confidence attached to a detection.
pub const CONFIDENCE: &str = "confidence";

/// Retry attempt number.
pub const ATTEMPT: &str = "attempt";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";
