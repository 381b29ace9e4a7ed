//! Auto-save configuration defaults and timing rules.
//!
//! This test suite validates:
//! - Defaults match the documented constants
//! - Per-attempt timeout is the interval clamped to [1s, 30s]
//! - Exponential and fixed backoff schedules, including the 300s cap
//! - Persisted configuration fills missing fields with defaults

use std::time::Duration;

use notewise_core::defaults;
use notewise_core::{AutoSaveConfiguration, Preferences};

#[test]
fn test_defaults_match_constants() {
    let config = AutoSaveConfiguration::default();
    assert_eq!(config.interval(), Duration::from_secs(30));
    assert_eq!(config.idle_threshold(), Duration::from_secs(2));
    assert_eq!(config.max_items_per_batch, defaults::AUTOSAVE_MAX_ITEMS_PER_BATCH);
    assert_eq!(config.retry_attempts, 3);
    assert!(config.exponential_backoff);
    assert!(config.preserve_drafts);
    assert!(config.validate().is_ok());
}

#[test]
fn test_save_timeout_is_clamped_interval() {
    let timeout = |secs| {
        AutoSaveConfiguration::default()
            .with_interval_secs(secs)
            .save_timeout()
    };
    assert_eq!(timeout(0.2), Duration::from_secs(1));
    assert_eq!(timeout(5.0), Duration::from_secs(5));
    assert_eq!(timeout(120.0), Duration::from_secs(30));
}

#[test]
fn test_exponential_backoff_doubles_and_caps() {
    let config = AutoSaveConfiguration::default().with_retry_base_delay_secs(1.0);
    let delays: Vec<u64> = (1..=4).map(|n| config.backoff_delay(n).as_secs()).collect();
    assert_eq!(delays, vec![1, 2, 4, 8]);
    assert_eq!(config.backoff_delay(20), Duration::from_secs(300));
}

#[test]
fn test_fixed_backoff_uses_interval() {
    let config = AutoSaveConfiguration::default()
        .with_exponential_backoff(false)
        .with_interval_secs(3.0);
    assert_eq!(config.backoff_delay(1), Duration::from_secs(3));
    assert_eq!(config.backoff_delay(5), Duration::from_secs(3));
}

#[test]
fn test_partial_preferences_blob_keeps_autosave_defaults() {
    let prefs: Preferences =
        serde_json::from_str(r#"{"auto_save": {"interval_secs": 10}}"#).unwrap();
    assert_eq!(prefs.auto_save.interval(), Duration::from_secs(10));
    assert_eq!(prefs.auto_save.retry_attempts, defaults::AUTOSAVE_RETRY_ATTEMPTS);
    assert!(prefs.validate().is_ok());
}

#[test]
fn test_out_of_range_retry_attempts_rejected() {
    let config = AutoSaveConfiguration::default()
        .with_retry_attempts(defaults::AUTOSAVE_MAX_RETRY_ATTEMPTS + 1);
    assert!(config.validate().is_err());
    assert!(AutoSaveConfiguration::default()
        .with_retry_attempts(0)
        .validate()
        .is_err());
}
