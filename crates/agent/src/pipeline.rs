//! Pipeline engine — the five-stage Retrieve → Analyze → Answer → Validate →
//! Coordinate run.
//!
//! Stages run strictly in order; each stage's output feeds the next. Any
//! failure aborts the run and is returned tagged with the stage that raised
//! it. An empty retrieval is not a failure: the run ends early with
//! [`NO_DOCUMENTS_ANSWER`].
//!
//! The engine holds no per-run state, so one engine can serve concurrent
//! runs as long as each run has its own [`RunContext`].

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tandem_core::agent::{AgentInputs, Stage, TaskKind};
use tandem_core::error::{Error, Result};
use tandem_core::event::{DomainEvent, EventBus};
use tandem_core::retrieval::Retriever;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::strategy::{RunContext, StrategyKind, TransportStrategy};

/// Final answer when retrieval finds nothing.
pub const NO_DOCUMENTS_ANSWER: &str = "No relevant documents were found to answer your question.";

/// Result of a full pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub final_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<String>,
    /// The snippets the run worked from, joined by blank lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieved_context: Option<String>,
}

impl AgentResponse {
    /// The terminal response for an empty retrieval.
    pub fn no_documents() -> Self {
        Self {
            final_answer: NO_DOCUMENTS_ANSWER.to_string(),
            document_analysis: None,
            technical_answer: None,
            validation: None,
            retrieved_context: None,
        }
    }
}

/// Result of document-only analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    pub summary: String,
    pub key_information: String,
}

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Retrieving,
    Analyzing,
    Answering,
    Validating,
    Coordinating,
    Done,
}

/// Reject requests no stage could serve.
pub fn validate_request(question: &str, max_results: usize) -> Result<()> {
    if question.trim().is_empty() {
        return Err(Error::InvalidInput("question must not be empty".into()));
    }
    if max_results == 0 {
        return Err(Error::InvalidInput("maxResults must be at least 1".into()));
    }
    Ok(())
}

pub struct PipelineEngine {
    retriever: Arc<dyn Retriever>,
    events: Arc<EventBus>,
}

impl PipelineEngine {
    pub fn new(retriever: Arc<dyn Retriever>, events: Arc<EventBus>) -> Self {
        Self { retriever, events }
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Run the full pipeline in a fresh run of `strategy`.
    pub async fn execute(
        &self,
        strategy: &dyn TransportStrategy,
        question: &str,
        max_results: usize,
    ) -> Result<AgentResponse> {
        let run = strategy.open_run();
        self.execute_in(strategy, &run, question, max_results).await
    }

    /// Run the full pipeline inside an existing run.
    pub async fn execute_in(
        &self,
        strategy: &dyn TransportStrategy,
        run: &RunContext,
        question: &str,
        max_results: usize,
    ) -> Result<AgentResponse> {
        validate_request(question, max_results)?;

        let mut runner = StageRunner::new(strategy, run, &self.events);
        info!(
            session_id = %run.session_id(),
            strategy = %strategy.kind(),
            max_results,
            "Pipeline started"
        );
        self.events.publish(DomainEvent::PipelineStarted {
            session_id: run.session_id().to_string(),
            strategy: strategy.kind().to_string(),
            max_results,
            timestamp: Utc::now(),
        });

        let result = self.run_stages(&mut runner, question, max_results).await;
        runner.finish(&result);
        result
    }

    async fn run_stages(
        &self,
        runner: &mut StageRunner<'_>,
        question: &str,
        max_results: usize,
    ) -> Result<AgentResponse> {
        let snippets = runner.retrieve(self.retriever.as_ref(), question, max_results).await?;
        if snippets.is_empty() {
            info!(session_id = %runner.run.session_id(), "No documents retrieved");
            return Ok(AgentResponse::no_documents());
        }

        let context = snippets.join("\n\n");

        let analysis = runner
            .call(
                PipelineState::Analyzing,
                TaskKind::AnalyzeDocument,
                AgentInputs::new().with("content", &context),
            )
            .await?;

        let technical_answer = runner
            .call(
                PipelineState::Answering,
                TaskKind::AnswerTechnical,
                AgentInputs::new()
                    .with("context", &context)
                    .with("question", question),
            )
            .await?;

        // Checked against the retrieved context, not the analysis
        let validation = runner
            .call(
                PipelineState::Validating,
                TaskKind::ValidateAnswer,
                AgentInputs::new()
                    .with("context", &context)
                    .with("answer", &technical_answer),
            )
            .await?;

        let final_answer = runner
            .call(
                PipelineState::Coordinating,
                TaskKind::SynthesizeFinal,
                AgentInputs::new()
                    .with("analysis", &analysis)
                    .with("technicalAnswer", &technical_answer)
                    .with("validation", &validation)
                    .with("originalQuestion", question),
            )
            .await?;

        Ok(AgentResponse {
            final_answer,
            document_analysis: Some(analysis),
            technical_answer: Some(technical_answer),
            validation: Some(validation),
            retrieved_context: Some(context),
        })
    }

    /// Retrieve, then answer with the technical expert only.
    pub async fn execute_simplified(
        &self,
        strategy: &dyn TransportStrategy,
        question: &str,
        max_results: usize,
    ) -> Result<String> {
        validate_request(question, max_results)?;

        let run = strategy.open_run();
        let mut runner = StageRunner::new(strategy, &run, &self.events);

        let snippets = runner.retrieve(self.retriever.as_ref(), question, max_results).await?;
        if snippets.is_empty() {
            return Ok(NO_DOCUMENTS_ANSWER.to_string());
        }

        runner
            .call(
                PipelineState::Answering,
                TaskKind::AnswerTechnical,
                AgentInputs::new()
                    .with("context", snippets.join("\n\n"))
                    .with("question", question),
            )
            .await
    }

    /// Extract key information from, and summarize, caller-supplied content.
    /// No retrieval is involved.
    pub async fn analyze_document(
        &self,
        strategy: &dyn TransportStrategy,
        content: &str,
    ) -> Result<DocumentAnalysis> {
        if content.trim().is_empty() {
            return Err(Error::InvalidInput("document content must not be empty".into()));
        }

        let run = strategy.open_run();
        let mut runner = StageRunner::new(strategy, &run, &self.events);
        let inputs = AgentInputs::new().with("content", content);

        let key_information = runner
            .call(PipelineState::Analyzing, TaskKind::ExtractKeyInfo, inputs.clone())
            .await?;
        let summary = runner
            .call(PipelineState::Analyzing, TaskKind::AnalyzeDocument, inputs)
            .await?;

        Ok(DocumentAnalysis {
            summary,
            key_information,
        })
    }
}

/// Drives the stages of one run: tracks state, times each call, tags
/// failures with their stage and publishes progress events.
struct StageRunner<'a> {
    strategy: &'a dyn TransportStrategy,
    run: &'a RunContext,
    events: &'a EventBus,
    state: PipelineState,
    started: Instant,
    snippets: usize,
    failed_stage: Option<Stage>,
}

impl<'a> StageRunner<'a> {
    fn new(strategy: &'a dyn TransportStrategy, run: &'a RunContext, events: &'a EventBus) -> Self {
        Self {
            strategy,
            run,
            events,
            state: PipelineState::Idle,
            started: Instant::now(),
            snippets: 0,
            failed_stage: None,
        }
    }

    fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    fn enter(&mut self, state: PipelineState) {
        debug!(session_id = %self.run.session_id(), from = ?self.state, to = ?state, "Pipeline state");
        self.state = state;
    }

    fn completed(&self, stage: Stage, started: Instant) {
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            session_id = %self.run.session_id(),
            strategy = %self.kind(),
            stage = %stage,
            duration_ms,
            "Stage completed"
        );
        self.events.publish(DomainEvent::StageCompleted {
            session_id: self.run.session_id().to_string(),
            strategy: self.kind().to_string(),
            stage,
            duration_ms,
            timestamp: Utc::now(),
        });
    }

    async fn retrieve(
        &mut self,
        retriever: &dyn Retriever,
        question: &str,
        max_results: usize,
    ) -> Result<Vec<String>> {
        self.enter(PipelineState::Retrieving);
        let started = Instant::now();

        match retriever.retrieve(question, max_results).await {
            Ok(snippets) => {
                self.snippets = snippets.len();
                debug!(retriever = retriever.name(), snippets = snippets.len(), "Retrieved context");
                self.completed(Stage::Retrieve, started);
                Ok(snippets)
            }
            Err(e) => {
                self.failed_stage = Some(Stage::Retrieve);
                Err(Error::Retrieval(e).at_stage(Stage::Retrieve))
            }
        }
    }

    async fn call(
        &mut self,
        state: PipelineState,
        task: TaskKind,
        inputs: AgentInputs,
    ) -> Result<String> {
        self.enter(state);
        let stage = task.stage();
        let started = Instant::now();

        match self.strategy.run_stage(self.run, task, inputs).await {
            Ok(output) => {
                debug!(stage = %stage, output_len = output.len(), "Stage output");
                self.completed(stage, started);
                Ok(output)
            }
            Err(e) => {
                self.failed_stage = Some(stage);
                Err(e.at_stage(stage))
            }
        }
    }

    fn finish(&mut self, result: &Result<AgentResponse>) {
        let duration_ms = self.started.elapsed().as_millis() as u64;
        let session_id = self.run.session_id().to_string();
        let strategy = self.kind().to_string();

        match result {
            Ok(_) => {
                self.enter(PipelineState::Done);
                info!(
                    session_id = %session_id,
                    strategy = %strategy,
                    snippets = self.snippets,
                    duration_ms,
                    "Pipeline completed"
                );
                self.events.publish(DomainEvent::PipelineCompleted {
                    session_id,
                    strategy,
                    snippets: self.snippets,
                    duration_ms,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    strategy = %strategy,
                    state = ?self.state,
                    error = %e,
                    "Pipeline failed"
                );
                self.events.publish(DomainEvent::PipelineFailed {
                    session_id,
                    strategy,
                    stage: self.failed_stage,
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    }
}
