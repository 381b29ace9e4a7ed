//! Core traits for notewise collaborators.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{LanguageHypothesis, NoteRef};

// =============================================================================
// LANGUAGE HYPOTHESES
// =============================================================================

/// External source of ranked language guesses (platform NLP, script detector).
///
/// Called from the blocking pool, so implementations may do CPU work but
/// must not await.
pub trait HypothesisSource: Send + Sync {
    /// Rank up to `max` candidate languages for `text`, most probable first.
    fn rank(&self, text: &str, max: usize) -> Vec<LanguageHypothesis>;

    /// Short identifier used in logs.
    fn name(&self) -> &str;
}

/// Hypothesis source that never has an opinion.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHypotheses;

impl HypothesisSource for NoHypotheses {
    fn rank(&self, _text: &str, _max: usize) -> Vec<LanguageHypothesis> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "none"
    }
}

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Storage for note drafts, driven by the save queue.
///
/// `save` must be idempotent: the queue retries it after failures and
/// timeouts, possibly after an earlier attempt already reached storage.
#[async_trait]
pub trait DraftPersistence: Send + Sync {
    /// Persist the draft snapshot.
    async fn save(&self, note: &NoteRef) -> Result<()>;

    /// Remove any on-disk draft copies.
    async fn delete_drafts(&self) -> Result<()>;
}

// =============================================================================
// PREFERENCES
// =============================================================================

/// Key-value blob store for serialized preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Load the blob stored under `key`, `None` if absent.
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous blob.
    async fn store(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_hypotheses_is_empty() {
        let source = NoHypotheses;
        assert!(source.rank("Bonjour tout le monde", 3).is_empty());
        assert_eq!(source.name(), "none");
    }

    #[test]
    fn test_traits_are_object_safe() {
        fn _hypothesis(_: &dyn HypothesisSource) {}
        fn _persistence(_: &dyn DraftPersistence) {}
        fn _store(_: &dyn PreferenceStore) {}
    }
}
