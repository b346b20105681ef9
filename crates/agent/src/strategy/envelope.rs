//! Envelope strategy: every stage call is an explicit request/response
//! exchange carrying a [`ContextEnvelope`].
//!
//! The caller side builds a [`StageRequest`] and encodes it as a JSON frame;
//! the service side decodes it, invokes the agent, and answers with a
//! [`StageResponse`] frame whose envelope names the responding agent. Both
//! sides run in this process, but nothing crosses the boundary except bytes.
//!
//! The strategy also offers a diagnostic side-channel ([`EventStream`]) that
//! acknowledges every event pushed into it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tandem_config::EnvelopeConfig;
use tandem_core::agent::{AgentCapability, AgentInputs, TaskKind};
use tandem_core::envelope::{AgentEvent, ContextEnvelope};
use tandem_core::error::{Error, Result};
use tokio::sync::mpsc;
use tracing::debug;

use super::{RunContext, StrategyKind, TransportStrategy};

/// `eventType` of an acknowledgement.
pub const ACK_EVENT_TYPE: &str = "ACK";
/// `agentName` of an acknowledgement.
pub const ACK_AGENT_NAME: &str = "orchestrator";
/// `message` of an acknowledgement.
pub const ACK_MESSAGE: &str = "received";

/// Caller → agent frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRequest {
    pub envelope: ContextEnvelope,
    pub task: TaskKind,
    pub inputs: AgentInputs,
}

/// Agent → caller frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResponse {
    pub envelope: ContextEnvelope,
    pub output: String,
}

pub struct EnvelopeStrategy {
    agent: Arc<dyn AgentCapability>,
    protocol: String,
    version: String,
}

impl EnvelopeStrategy {
    pub fn new(agent: Arc<dyn AgentCapability>) -> Self {
        Self::from_config(agent, &EnvelopeConfig::default())
    }

    pub fn from_config(agent: Arc<dyn AgentCapability>, config: &EnvelopeConfig) -> Self {
        Self {
            agent,
            protocol: config.protocol.clone(),
            version: config.version.clone(),
        }
    }

    /// Build the request frame for one stage of `run`.
    ///
    /// The envelope's agent id is the stage name.
    pub fn request(&self, run: &RunContext, task: TaskKind, inputs: AgentInputs) -> StageRequest {
        let envelope = ContextEnvelope::at(
            run.session_id().clone(),
            task.stage().as_str(),
            run.next_timestamp_ms(),
        )
        .with_metadata("protocol", &self.protocol)
        .with_metadata("version", &self.version);

        StageRequest {
            envelope,
            task,
            inputs,
        }
    }

    /// Send a request across the exchange boundary and decode the reply.
    pub async fn exchange(&self, request: &StageRequest) -> Result<StageResponse> {
        let frame = serde_json::to_vec(request)?;
        let reply = self.serve(&frame).await?;
        serde_json::from_slice(&reply)
            .map_err(|e| Error::Protocol(format!("undecodable response frame: {e}")))
    }

    /// Service side of the exchange.
    async fn serve(&self, frame: &[u8]) -> Result<Vec<u8>> {
        let request: StageRequest = serde_json::from_slice(frame)
            .map_err(|e| Error::Protocol(format!("undecodable request frame: {e}")))?;

        let output = self.agent.invoke(request.task, &request.inputs).await?;

        let timestamp_ms = Utc::now()
            .timestamp_millis()
            .max(request.envelope.timestamp_ms());
        let response = StageResponse {
            envelope: ContextEnvelope::at(
                request.envelope.session_id().clone(),
                request.task.role().agent_id(),
                timestamp_ms,
            ),
            output,
        };

        Ok(serde_json::to_vec(&response)?)
    }

    /// Open the event echo channel.
    ///
    /// Spawns a task that answers every pushed event with an acknowledgement
    /// carrying the same envelope. Dropping or closing the sending half ends
    /// the task, after which the receiving half yields `None`.
    pub fn open_event_stream(&self, buffer: usize) -> EventStream {
        let buffer = buffer.max(1);
        let (in_tx, mut in_rx) = mpsc::channel::<AgentEvent>(buffer);
        let (out_tx, out_rx) = mpsc::channel::<AgentEvent>(buffer);

        tokio::spawn(async move {
            while let Some(event) = in_rx.recv().await {
                debug!(
                    session_id = %event.envelope.session_id(),
                    event_type = %event.event_type,
                    agent = %event.agent_name,
                    "Event received"
                );
                let ack = AgentEvent::new(event.envelope, ACK_EVENT_TYPE, ACK_AGENT_NAME, ACK_MESSAGE);
                if out_tx.send(ack).await.is_err() {
                    break;
                }
            }
            debug!("Event stream closed");
        });

        EventStream {
            sender: in_tx,
            receiver: out_rx,
        }
    }
}

/// Check a reply against its request and unwrap the stage output.
fn accept(request: &StageRequest, response: StageResponse) -> Result<String> {
    if response.envelope.session_id() != request.envelope.session_id() {
        return Err(Error::Protocol(format!(
            "session mismatch: sent {}, got {}",
            request.envelope.session_id(),
            response.envelope.session_id()
        )));
    }
    Ok(response.output)
}

#[async_trait]
impl TransportStrategy for EnvelopeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Envelope
    }

    async fn run_stage(
        &self,
        run: &RunContext,
        task: TaskKind,
        inputs: AgentInputs,
    ) -> Result<String> {
        let request = self.request(run, task, inputs);
        debug!(
            session_id = %request.envelope.session_id(),
            agent_id = %request.envelope.agent_id(),
            timestamp_ms = request.envelope.timestamp_ms(),
            "Envelope request"
        );

        let response = self.exchange(&request).await?;
        debug!(responder = %response.envelope.agent_id(), "Envelope response");

        accept(&request, response)
    }
}

/// Both ends of the event echo channel, held by the caller.
pub struct EventStream {
    sender: mpsc::Sender<AgentEvent>,
    receiver: mpsc::Receiver<AgentEvent>,
}

impl EventStream {
    /// Push an event. Fails only if the echo task has stopped.
    pub async fn send(&self, event: AgentEvent) -> Result<()> {
        self.sender
            .send(event)
            .await
            .map_err(|_| Error::Protocol("event stream closed".into()))
    }

    /// Next acknowledgement, or `None` once the stream is closed and drained.
    pub async fn recv(&mut self) -> Option<AgentEvent> {
        self.receiver.recv().await
    }

    /// Split into the sending and receiving halves.
    pub fn into_parts(self) -> (mpsc::Sender<AgentEvent>, mpsc::Receiver<AgentEvent>) {
        (self.sender, self.receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedAgent;
    use tandem_core::envelope::SessionId;

    fn strategy() -> (Arc<ScriptedAgent>, EnvelopeStrategy) {
        let agent = Arc::new(ScriptedAgent::new());
        (agent.clone(), EnvelopeStrategy::new(agent))
    }

    #[test]
    fn request_envelope_names_stage_and_protocol() {
        let (_, strategy) = strategy();
        let run = RunContext::new(SessionId::from("s-1"));

        let req = strategy.request(&run, TaskKind::ValidateAnswer, AgentInputs::new());
        assert_eq!(req.envelope.session_id().as_str(), "s-1");
        assert_eq!(req.envelope.agent_id(), "validate");
        assert_eq!(req.envelope.metadata()["protocol"], "tandem-envelope");
        assert_eq!(req.envelope.metadata()["version"], "1.0");
    }

    #[test]
    fn requests_in_one_run_share_session_and_ordered_timestamps() {
        let (_, strategy) = strategy();
        let run = strategy.open_run();

        let first = strategy.request(&run, TaskKind::AnalyzeDocument, AgentInputs::new());
        let second = strategy.request(&run, TaskKind::AnswerTechnical, AgentInputs::new());
        assert_eq!(first.envelope.session_id(), second.envelope.session_id());
        assert!(second.envelope.timestamp_ms() >= first.envelope.timestamp_ms());

        let other_run = strategy.open_run();
        let third = strategy.request(&other_run, TaskKind::AnalyzeDocument, AgentInputs::new());
        assert_ne!(first.envelope.session_id(), third.envelope.session_id());
    }

    #[tokio::test]
    async fn response_envelope_names_the_responding_agent() {
        let (_, strategy) = strategy();
        let run = RunContext::new(SessionId::from("s-2"));
        let req = strategy.request(
            &run,
            TaskKind::SynthesizeFinal,
            AgentInputs::new()
                .with("analysis", "a")
                .with("technicalAnswer", "t")
                .with("validation", "v")
                .with("originalQuestion", "q"),
        );

        let resp = strategy.exchange(&req).await.unwrap();
        assert_eq!(resp.envelope.session_id().as_str(), "s-2");
        assert_eq!(resp.envelope.agent_id(), "coordinator");
        assert!(resp.envelope.timestamp_ms() >= req.envelope.timestamp_ms());
        assert_eq!(resp.output, "synthesize-final output");
    }

    #[tokio::test]
    async fn run_stage_matches_direct_output() {
        let (agent, strategy) = strategy();
        let run = strategy.open_run();
        let inputs = AgentInputs::new().with("content", "doc");

        let out = strategy
            .run_stage(&run, TaskKind::ExtractKeyInfo, inputs.clone())
            .await
            .unwrap();
        assert_eq!(out, "extract-key-info output");
        assert_eq!(agent.calls(), vec![(TaskKind::ExtractKeyInfo, inputs)]);
    }

    #[tokio::test]
    async fn agent_errors_cross_the_boundary_unchanged() {
        let agent = Arc::new(ScriptedAgent::new().fail_on(TaskKind::AnswerTechnical));
        let strategy = EnvelopeStrategy::new(agent);
        let run = strategy.open_run();

        let err = strategy
            .run_stage(&run, TaskKind::AnswerTechnical, AgentInputs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[test]
    fn session_mismatch_is_a_protocol_error() {
        let (_, strategy) = strategy();
        let run = RunContext::new(SessionId::from("mine"));
        let req = strategy.request(&run, TaskKind::AnalyzeDocument, AgentInputs::new());
        let resp = StageResponse {
            envelope: ContextEnvelope::at(SessionId::from("theirs"), "document-analyst", 0),
            output: "x".into(),
        };

        let err = accept(&req, resp).unwrap_err();
        assert!(matches!(err, Error::Protocol(msg) if msg.contains("session mismatch")));
    }

    #[tokio::test]
    async fn undecodable_frame_is_a_protocol_error() {
        let (agent, strategy) = strategy();
        let err = strategy.serve(b"not json").await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(agent.calls().is_empty());
    }

    #[tokio::test]
    async fn event_stream_acknowledges_with_same_envelope() {
        let (_, strategy) = strategy();
        let mut stream = strategy.open_event_stream(4);
        let envelope = ContextEnvelope::at(SessionId::from("s-ev"), "client", 7);

        stream
            .send(AgentEvent::new(envelope.clone(), "PROGRESS", "analyst", "halfway"))
            .await
            .unwrap();

        let ack = stream.recv().await.unwrap();
        assert_eq!(ack.envelope, envelope);
        assert_eq!(ack.event_type, "ACK");
        assert_eq!(ack.agent_name, "orchestrator");
        assert_eq!(ack.message, "received");
    }

    #[tokio::test]
    async fn closing_sender_ends_the_stream() {
        let (_, strategy) = strategy();
        let (tx, mut rx) = strategy.open_event_stream(0).into_parts();

        for i in 0..3 {
            let env = ContextEnvelope::at(SessionId::from("s"), "client", i);
            tx.send(AgentEvent::new(env, "TICK", "client", i.to_string()))
                .await
                .unwrap();
        }
        drop(tx);

        let mut acks = Vec::new();
        while let Some(ack) = rx.recv().await {
            acks.push(ack.envelope.timestamp_ms());
        }
        assert_eq!(acks, vec![0, 1, 2]);
    }
}
