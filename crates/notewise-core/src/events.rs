//! Core event types, envelope schema, and event bus for state-change notifications.
//!
//! The UI never observes core state directly. Every state change the core
//! wants to surface (queued saves, retries, pause toggles, preference updates)
//! is emitted on a single broadcast channel; consumers subscribe independently.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{Polarity, SavePriority};

// ============================================================================
// Event Envelope
// ============================================================================

/// Versioned, self-describing wrapper around a [`CoreEvent`].
///
/// The `event_type` field uses dot-namespaced names (e.g. `"save.completed"`).
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// Namespaced event type.
    pub event_type: String,
    /// When the event occurred (UTC).
    pub occurred_at: DateTime<Utc>,
    /// Type of entity this event relates to (e.g. `"note"`, `"save"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// ID of the entity this event relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Correlation ID for tracing related events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
    /// Payload schema version.
    pub payload_version: u32,
    /// Domain-specific event data.
    pub payload: CoreEvent,
}

impl EventEnvelope {
    /// Create an envelope without correlation.
    pub fn new(event: CoreEvent) -> Self {
        Self::correlated(event, None)
    }

    /// Create an envelope carrying a correlation ID.
    pub fn correlated(event: CoreEvent, correlation_id: Option<Uuid>) -> Self {
        Self {
            event_id: crate::uuid_utils::new_v7(),
            event_type: event.namespaced_event_type().to_string(),
            occurred_at: Utc::now(),
            entity_type: event.entity_type().map(String::from),
            entity_id: event.entity_id().map(|id| id.to_string()),
            correlation_id,
            payload_version: 1,
            payload: event,
        }
    }
}

// ============================================================================
// Core Event (domain payloads)
// ============================================================================

/// Domain events emitted by the core.
///
/// Serialized with a `type` tag, e.g. `{"type":"SaveCompleted","item_id":"..."}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum CoreEvent {
    /// A save was accepted into the queue (or merged into an existing one).
    SaveQueued {
        item_id: Uuid,
        note_id: Uuid,
        priority: SavePriority,
        coalesced: bool,
    },
    /// A persistence attempt started.
    SaveStarted {
        item_id: Uuid,
        note_id: Uuid,
        attempt: u32,
    },
    /// A save completed and left the queue.
    SaveCompleted {
        item_id: Uuid,
        note_id: Uuid,
        duration_ms: u64,
    },
    /// An attempt failed and a retry was scheduled.
    SaveRetryScheduled {
        item_id: Uuid,
        note_id: Uuid,
        retry_count: u32,
        delay_ms: u64,
        error: String,
    },
    /// An item exhausted its retries.
    SaveFailed {
        item_id: Uuid,
        note_id: Uuid,
        retry_count: u32,
        error: String,
    },
    /// The queue was cleared.
    QueueCleared {
        cancelled: usize,
        drafts_deleted: bool,
    },
    /// Queue counts after a drain.
    QueueStatus {
        pending: usize,
        in_progress: usize,
        failed: usize,
    },
    /// Automatic drains stopped.
    AutoSavePaused,
    /// Automatic drains resumed.
    AutoSaveResumed,
    /// The auto-save configuration was replaced.
    ConfigurationUpdated,
    /// Preferences were saved or imported.
    PreferencesChanged { last_modified: DateTime<Utc> },
    /// A note finished the analysis pipeline.
    NoteAnalyzed {
        #[serde(skip_serializing_if = "Option::is_none")]
        note_id: Option<Uuid>,
        language: String,
        polarity: Polarity,
    },
}

impl CoreEvent {
    /// Returns the namespaced event type for the envelope (e.g. `"save.completed"`).
    pub fn namespaced_event_type(&self) -> &'static str {
        match self {
            CoreEvent::SaveQueued { .. } => "save.queued",
            CoreEvent::SaveStarted { .. } => "save.started",
            CoreEvent::SaveCompleted { .. } => "save.completed",
            CoreEvent::SaveRetryScheduled { .. } => "save.retry_scheduled",
            CoreEvent::SaveFailed { .. } => "save.failed",
            CoreEvent::QueueCleared { .. } => "queue.cleared",
            CoreEvent::QueueStatus { .. } => "queue.status",
            CoreEvent::AutoSavePaused => "autosave.paused",
            CoreEvent::AutoSaveResumed => "autosave.resumed",
            CoreEvent::ConfigurationUpdated => "autosave.configuration_updated",
            CoreEvent::PreferencesChanged { .. } => "preferences.changed",
            CoreEvent::NoteAnalyzed { .. } => "note.analyzed",
        }
    }

    /// Returns the entity type this event relates to.
    pub fn entity_type(&self) -> Option<&'static str> {
        match self {
            CoreEvent::SaveQueued { .. }
            | CoreEvent::SaveStarted { .. }
            | CoreEvent::SaveCompleted { .. }
            | CoreEvent::SaveRetryScheduled { .. }
            | CoreEvent::SaveFailed { .. } => Some("save"),
            CoreEvent::NoteAnalyzed { note_id, .. } => note_id.map(|_| "note"),
            _ => None,
        }
    }

    /// Returns the primary entity ID this event relates to.
    pub fn entity_id(&self) -> Option<Uuid> {
        match self {
            CoreEvent::SaveQueued { item_id, .. }
            | CoreEvent::SaveStarted { item_id, .. }
            | CoreEvent::SaveCompleted { item_id, .. }
            | CoreEvent::SaveRetryScheduled { item_id, .. }
            | CoreEvent::SaveFailed { item_id, .. } => Some(*item_id),
            CoreEvent::NoteAnalyzed { note_id, .. } => *note_id,
            _ => None,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast-based event bus for distributing core events to multiple consumers.
///
/// Slow receivers that fall behind get a `Lagged` error and miss events;
/// UI consumers only care about the latest state.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit an event to all subscribers. Dropped silently when nobody listens.
    pub fn emit(&self, event: CoreEvent) {
        self.send(EventEnvelope::new(event));
    }

    /// Emit an event tagged with a correlation ID.
    pub fn emit_correlated(&self, event: CoreEvent, correlation_id: Uuid) {
        self.send(EventEnvelope::correlated(event, Some(correlation_id)));
    }

    fn send(&self, envelope: EventEnvelope) {
        tracing::trace!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to receive enveloped events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(32);
        let mut rx = bus.subscribe();

        bus.emit(CoreEvent::QueueStatus {
            pending: 4,
            in_progress: 1,
            failed: 0,
        });

        let envelope = rx.recv().await.unwrap();
        assert!(matches!(
            envelope.payload,
            CoreEvent::QueueStatus { pending: 4, .. }
        ));
        assert_eq!(envelope.event_type, "queue.status");
        assert_eq!(envelope.payload_version, 1);
        assert!(envelope.entity_type.is_none());
    }

    #[tokio::test]
    async fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::new(32);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(CoreEvent::SaveStarted {
            item_id: Uuid::nil(),
            note_id: Uuid::nil(),
            attempt: 1,
        });

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();
        assert!(matches!(e1.payload, CoreEvent::SaveStarted { .. }));
        assert!(matches!(e2.payload, CoreEvent::SaveStarted { .. }));
        assert_eq!(e1.event_type, "save.started");
        assert_eq!(e1.entity_type.as_deref(), Some("save"));
    }

    #[tokio::test]
    async fn test_event_bus_no_subscribers_ok() {
        let bus = EventBus::new(32);
        bus.emit(CoreEvent::AutoSavePaused);
    }

    #[tokio::test]
    async fn test_event_bus_subscriber_count() {
        let bus = EventBus::new(32);
        assert_eq!(bus.subscriber_count(), 0);

        let rx1 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(rx1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_emit_correlated_sets_id() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let correlation = Uuid::new_v4();

        bus.emit_correlated(CoreEvent::ConfigurationUpdated, correlation);

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.correlation_id, Some(correlation));
    }

    #[test]
    fn test_core_event_json_serialization() {
        let event = CoreEvent::SaveQueued {
            item_id: Uuid::nil(),
            note_id: Uuid::nil(),
            priority: SavePriority::Critical,
            coalesced: false,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"SaveQueued"#));
        assert!(json.contains(r#""priority":"critical"#));
    }

    #[test]
    fn test_note_analyzed_skips_missing_note_id() {
        let event = CoreEvent::NoteAnalyzed {
            note_id: None,
            language: "de".to_string(),
            polarity: Polarity::Positive,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("note_id"));
        assert!(event.entity_type().is_none());
    }

    #[tokio::test]
    async fn test_event_bus_lagged_receiver() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();

        for _ in 0..5 {
            bus.emit(CoreEvent::AutoSaveResumed);
        }

        let result = rx.recv().await;
        assert!(matches!(
            result,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
    }
}
