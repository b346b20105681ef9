//! Orchestrator — the caller-facing facade.
//!
//! Built once at startup from the agent capability, the retriever and the
//! application config; every handle it holds is read-only afterwards.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tandem_config::AppConfig;
use tandem_core::agent::AgentCapability;
use tandem_core::envelope::SessionId;
use tandem_core::error::Result;
use tandem_core::event::EventBus;
use tandem_core::retrieval::Retriever;
use tokio::time::Instant;
use tracing::info;

use crate::comparison::{
    BenchmarkResult, ComparisonEngine, ComparisonResult, StrategyInfo, strategy_info,
};
use crate::pipeline::{AgentResponse, DocumentAnalysis, PipelineEngine};
use crate::strategy::{
    DirectStrategy, EnvelopeStrategy, EventStream, StrategyKind, TransportStrategy,
};

/// A pipeline response plus the trace data of the run that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracedResponse {
    #[serde(flatten)]
    pub response: AgentResponse,
    pub session_id: SessionId,
    pub strategy_name: StrategyKind,
    pub duration_ms: u64,
}

pub struct Orchestrator {
    engine: Arc<PipelineEngine>,
    direct: Arc<DirectStrategy>,
    envelope: Arc<EnvelopeStrategy>,
    comparison: ComparisonEngine,
    event_buffer: usize,
}

impl Orchestrator {
    pub fn new(
        agent: Arc<dyn AgentCapability>,
        retriever: Arc<dyn Retriever>,
        config: &AppConfig,
    ) -> Self {
        let engine = Arc::new(PipelineEngine::new(retriever, Arc::new(EventBus::default())));
        let direct = Arc::new(DirectStrategy::new(agent.clone()));
        let envelope = Arc::new(EnvelopeStrategy::from_config(agent, &config.envelope));

        let comparison = ComparisonEngine::new(engine.clone(), direct.clone(), envelope.clone())
            .with_benchmark_max_results(config.pipeline.benchmark_max_results);

        Self {
            engine,
            direct,
            envelope,
            comparison,
            event_buffer: config.envelope.event_buffer,
        }
    }

    /// Domain events published by every run.
    pub fn events(&self) -> &Arc<EventBus> {
        self.engine.events()
    }

    fn strategy(&self, kind: StrategyKind) -> &dyn TransportStrategy {
        match kind {
            StrategyKind::Direct => self.direct.as_ref(),
            StrategyKind::Envelope => self.envelope.as_ref(),
        }
    }

    /// Full five-stage run over the direct strategy.
    pub async fn execute_agent_pipeline(
        &self,
        question: &str,
        max_results: usize,
    ) -> Result<AgentResponse> {
        self.engine.execute(self.direct.as_ref(), question, max_results).await
    }

    /// Full five-stage run over the chosen strategy.
    pub async fn execute_with_strategy(
        &self,
        kind: StrategyKind,
        question: &str,
        max_results: usize,
    ) -> Result<AgentResponse> {
        self.engine.execute(self.strategy(kind), question, max_results).await
    }

    /// Retrieval plus the technical expert only.
    pub async fn execute_simplified(&self, question: &str, max_results: usize) -> Result<String> {
        self.engine
            .execute_simplified(self.direct.as_ref(), question, max_results)
            .await
    }

    /// Summary and key information for caller-supplied content.
    pub async fn analyze_with_agents(&self, content: &str) -> Result<DocumentAnalysis> {
        self.engine.analyze_document(self.direct.as_ref(), content).await
    }

    /// Full run over the envelope strategy, returned with its session id and
    /// duration.
    pub async fn execute_with_envelope_strategy(
        &self,
        question: &str,
        max_results: usize,
    ) -> Result<TracedResponse> {
        let strategy = self.envelope.as_ref();
        let run = strategy.open_run();
        let started = Instant::now();

        let response = self
            .engine
            .execute_in(strategy, &run, question, max_results)
            .await?;
        let duration_ms = started.elapsed().as_millis() as u64;

        info!(session_id = %run.session_id(), duration_ms, "Envelope run finished");

        Ok(TracedResponse {
            response,
            session_id: run.session_id().clone(),
            strategy_name: StrategyKind::Envelope,
            duration_ms,
        })
    }

    pub async fn compare(&self, question: &str, max_results: usize) -> Result<ComparisonResult> {
        self.comparison.compare(question, max_results).await
    }

    pub async fn benchmark(&self, question: &str, iterations: usize) -> Result<BenchmarkResult> {
        self.comparison.benchmark(question, iterations).await
    }

    pub fn info(&self) -> Vec<StrategyInfo> {
        strategy_info()
    }

    /// Open the envelope strategy's event echo channel with the configured
    /// buffer size.
    pub fn open_event_stream(&self) -> EventStream {
        self.envelope.open_event_stream(self.event_buffer)
    }
}
