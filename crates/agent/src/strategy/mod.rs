//! Transport strategies — how a stage call reaches its agent.
//!
//! The pipeline talks to a [`TransportStrategy`] and never to an agent
//! directly. Both implementations honour the same stage contract: the same
//! task kind and inputs produce the same class of output. Only the call path
//! and the metadata attached to it differ.
//!
//! - [`DirectStrategy`]: plain in-process call, no per-call metadata.
//! - [`EnvelopeStrategy`]: every call is wrapped in a [`ContextEnvelope`] and
//!   sent through a serialized request/response exchange.
//!
//! [`ContextEnvelope`]: tandem_core::envelope::ContextEnvelope

pub mod direct;
pub mod envelope;

pub use direct::DirectStrategy;
pub use envelope::{EnvelopeStrategy, EventStream, StageRequest, StageResponse};

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tandem_core::agent::{AgentInputs, TaskKind};
use tandem_core::envelope::SessionId;
use tandem_core::error::{Error, Result};

/// Which strategy a run used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Direct,
    Envelope,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 2] = [StrategyKind::Direct, StrategyKind::Envelope];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Direct => "direct",
            StrategyKind::Envelope => "envelope",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "direct" => Ok(StrategyKind::Direct),
            "envelope" => Ok(StrategyKind::Envelope),
            other => Err(Error::InvalidInput(format!(
                "unknown strategy '{other}' (expected 'direct' or 'envelope')"
            ))),
        }
    }
}

/// Per-run state handed to every stage call of one pipeline run.
///
/// Holds the session id shared by all stages and the last timestamp issued,
/// so timestamps within a run never go backwards even if the wall clock does.
#[derive(Debug)]
pub struct RunContext {
    session_id: SessionId,
    last_timestamp_ms: AtomicI64,
}

impl RunContext {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            last_timestamp_ms: AtomicI64::new(i64::MIN),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Current wall-clock time in ms, clamped to be ≥ every earlier value.
    pub fn next_timestamp_ms(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self.last_timestamp_ms.fetch_max(now, Ordering::SeqCst);
        previous.max(now)
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(SessionId::new())
    }
}

/// A call path from the pipeline to the agents.
#[async_trait]
pub trait TransportStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Start a run. Each run gets a fresh session id.
    fn open_run(&self) -> RunContext {
        RunContext::default()
    }

    /// Execute one stage call and return its plain text output.
    async fn run_stage(&self, run: &RunContext, task: TaskKind, inputs: AgentInputs)
    -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_kind_parses_case_insensitively() {
        assert_eq!("Direct".parse::<StrategyKind>().unwrap(), StrategyKind::Direct);
        assert_eq!("envelope".parse::<StrategyKind>().unwrap(), StrategyKind::Envelope);
        assert!("grpc".parse::<StrategyKind>().unwrap_err().is_invalid_input());
    }

    #[test]
    fn strategy_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&StrategyKind::Envelope).unwrap(), "\"envelope\"");
    }

    #[test]
    fn run_timestamps_never_decrease() {
        let run = RunContext::default();
        let mut last = i64::MIN;
        for _ in 0..100 {
            let ts = run.next_timestamp_ms();
            assert!(ts >= last);
            last = ts;
        }
    }

    #[test]
    fn each_run_gets_its_own_session() {
        assert_ne!(RunContext::default().session_id(), RunContext::default().session_id());
    }
}
