//! The Tandem multi-agent pipeline.
//!
//! A question flows through five stages in strict order:
//!
//! 1. **Retrieve** context snippets for the question
//! 2. **Analyze** the joined context (document analyst)
//! 3. **Answer** the question from the context (technical expert)
//! 4. **Validate** the answer against the context (validator)
//! 5. **Coordinate** everything into a final answer (coordinator)
//!
//! Each agent call goes through a [`TransportStrategy`]: either a direct
//! in-process call or an envelope-wrapped request/response exchange. The
//! [`ComparisonEngine`] runs both strategies side by side and measures them.

pub mod capability;
pub mod comparison;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod strategy;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use capability::LlmAgent;
pub use comparison::{
    BenchmarkResult, ComparisonEngine, ComparisonResult, StrategyInfo, StrategyOutcome,
    strategy_info,
};
pub use orchestrator::{Orchestrator, TracedResponse};
pub use pipeline::{
    AgentResponse, DocumentAnalysis, NO_DOCUMENTS_ANSWER, PipelineEngine, PipelineState,
};
pub use strategy::{
    DirectStrategy, EnvelopeStrategy, EventStream, RunContext, StrategyKind, TransportStrategy,
};
