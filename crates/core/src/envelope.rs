//! Context envelopes: per-call metadata for the structured protocol strategy.
//!
//! An envelope is built fresh for every stage call, never changed after
//! construction, and dropped once the call returns.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier shared by every stage call of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata wrapper attached to each envelope-routed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextEnvelope {
    session_id: SessionId,
    agent_id: String,
    timestamp_ms: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
}

impl ContextEnvelope {
    /// Create an envelope stamped with the current wall-clock time.
    pub fn new(session_id: SessionId, agent_id: impl Into<String>) -> Self {
        Self::at(session_id, agent_id, Utc::now().timestamp_millis())
    }

    /// Create an envelope with an explicit timestamp.
    pub fn at(session_id: SessionId, agent_id: impl Into<String>, timestamp_ms: i64) -> Self {
        Self {
            session_id,
            agent_id: agent_id.into(),
            timestamp_ms,
            metadata: BTreeMap::new(),
        }
    }

    /// Builder-style metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }
}

/// A named event on the diagnostic side-channel, tagged with an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentEvent {
    pub envelope: ContextEnvelope,
    pub event_type: String,
    pub agent_name: String,
    pub message: String,
}

impl AgentEvent {
    pub fn new(
        envelope: ContextEnvelope,
        event_type: impl Into<String>,
        agent_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            envelope,
            event_type: event_type.into(),
            agent_name: agent_name.into(),
            message: message.into(),
        }
    }
}
