//! Domain event system — decoupled observation of pipeline runs.
//!
//! The pipeline publishes events as it moves between stages. Tracing sinks,
//! the CLI, or tests can subscribe without coupling to the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::agent::Stage;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A pipeline run started
    PipelineStarted {
        session_id: String,
        strategy: String,
        max_results: usize,
        timestamp: DateTime<Utc>,
    },

    /// One stage of a run finished successfully
    StageCompleted {
        session_id: String,
        strategy: String,
        stage: Stage,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A run returned a response (including the empty-retrieval outcome)
    PipelineCompleted {
        session_id: String,
        strategy: String,
        snippets: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A run aborted
    PipelineFailed {
        session_id: String,
        strategy: String,
        stage: Option<Stage>,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// A two-strategy comparison finished
    ComparisonCompleted {
        faster: String,
        performance_gain_percent: f64,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::StageCompleted {
            session_id: "s-1".into(),
            strategy: "direct".into(),
            stage: Stage::Answer,
            duration_ms: 42,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::StageCompleted { stage, duration_ms, .. } => {
                assert_eq!(*stage, Stage::Answer);
                assert_eq!(*duration_ms, 42);
            }
            _ => panic!("Expected StageCompleted event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::PipelineFailed {
            session_id: "s-2".into(),
            strategy: "envelope".into(),
            stage: None,
            error_message: "no subscribers".into(),
            timestamp: Utc::now(),
        });
    }
}
