//! Comparison and benchmark engine.
//!
//! Runs the same pipeline under both transport strategies and reports how
//! long each took. Unlike single runs, a pipeline failure here is recorded in
//! that strategy's slot instead of aborting: the other strategy is always
//! measured.
//!
//! Durations use `tokio::time::Instant`, so tests can drive them with a
//! paused clock.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tandem_core::error::Result;
use tandem_core::event::DomainEvent;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::pipeline::{AgentResponse, PipelineEngine, validate_request};
use crate::strategy::{StrategyKind, TransportStrategy};

/// One strategy's result in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyOutcome {
    pub final_answer: Option<String>,
    pub analysis: Option<String>,
    pub technical_answer: Option<String>,
    pub validation: Option<String>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StrategyOutcome {
    fn new(result: Result<AgentResponse>, duration_ms: u64) -> Self {
        match result {
            Ok(response) => Self {
                final_answer: Some(response.final_answer),
                analysis: response.document_analysis,
                technical_answer: response.technical_answer,
                validation: response.validation,
                duration_ms,
                error: None,
            },
            Err(e) => Self {
                final_answer: None,
                analysis: None,
                technical_answer: None,
                validation: None,
                duration_ms,
                error: Some(e.to_string()),
            },
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub results: BTreeMap<StrategyKind, StrategyOutcome>,
    pub faster_strategy: StrategyKind,
    pub performance_gain_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    pub iterations: usize,
    pub success_count: BTreeMap<StrategyKind, usize>,
    /// Mean duration over successful runs; 0 when there were none.
    pub average_latency_ms: BTreeMap<StrategyKind, f64>,
    pub faster_strategy: StrategyKind,
    pub performance_gain_percent: f64,
}

/// Static description of a strategy's trade-offs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyInfo {
    pub strategy: StrategyKind,
    pub name: String,
    pub description: String,
    pub advantages: Vec<String>,
    pub disadvantages: Vec<String>,
}

/// The strategy with the lower duration. Envelope wins ties.
pub fn faster_strategy(direct_ms: f64, envelope_ms: f64) -> StrategyKind {
    if envelope_ms <= direct_ms {
        StrategyKind::Envelope
    } else {
        StrategyKind::Direct
    }
}

/// Envelope's gain over the direct baseline, in percent.
///
/// Negative when envelope is slower; 0 when the direct duration is 0.
pub fn performance_gain(direct_ms: f64, envelope_ms: f64) -> f64 {
    if direct_ms <= 0.0 {
        return 0.0;
    }
    (direct_ms - envelope_ms) / direct_ms * 100.0
}

/// Per-strategy running totals for a benchmark.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    successes: usize,
    total_ms: u64,
}

impl Tally {
    fn record(&mut self, outcome: &StrategyOutcome) {
        if outcome.succeeded() {
            self.successes += 1;
            self.total_ms += outcome.duration_ms;
        }
    }

    fn average_ms(&self) -> f64 {
        if self.successes == 0 {
            0.0
        } else {
            self.total_ms as f64 / self.successes as f64
        }
    }
}

pub struct ComparisonEngine {
    engine: Arc<PipelineEngine>,
    direct: Arc<dyn TransportStrategy>,
    envelope: Arc<dyn TransportStrategy>,
    benchmark_max_results: usize,
}

impl ComparisonEngine {
    pub fn new(
        engine: Arc<PipelineEngine>,
        direct: Arc<dyn TransportStrategy>,
        envelope: Arc<dyn TransportStrategy>,
    ) -> Self {
        Self {
            engine,
            direct,
            envelope,
            benchmark_max_results: 5,
        }
    }

    /// Result limit for every benchmark iteration.
    pub fn with_benchmark_max_results(mut self, max_results: usize) -> Self {
        self.benchmark_max_results = max_results;
        self
    }

    /// Run one strategy and time it. Never fails: errors land in the outcome.
    async fn measure(
        &self,
        strategy: &dyn TransportStrategy,
        question: &str,
        max_results: usize,
    ) -> StrategyOutcome {
        let started = Instant::now();
        let result = self.engine.execute(strategy, question, max_results).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        if let Err(e) = &result {
            warn!(strategy = %strategy.kind(), error = %e, "Strategy run failed");
        }
        StrategyOutcome::new(result, duration_ms)
    }

    /// Direct first, then Envelope, sequentially.
    async fn measure_both(
        &self,
        question: &str,
        max_results: usize,
    ) -> (StrategyOutcome, StrategyOutcome) {
        let direct = self.measure(self.direct.as_ref(), question, max_results).await;
        let envelope = self.measure(self.envelope.as_ref(), question, max_results).await;
        (direct, envelope)
    }

    /// Run the pipeline once per strategy and compare.
    pub async fn compare(&self, question: &str, max_results: usize) -> Result<ComparisonResult> {
        validate_request(question, max_results)?;

        let (direct, envelope) = self.measure_both(question, max_results).await;
        let direct_ms = direct.duration_ms as f64;
        let envelope_ms = envelope.duration_ms as f64;

        let faster = faster_strategy(direct_ms, envelope_ms);
        let gain = performance_gain(direct_ms, envelope_ms);

        info!(
            direct_ms = direct.duration_ms,
            envelope_ms = envelope.duration_ms,
            faster = %faster,
            gain_percent = gain,
            "Comparison completed"
        );
        self.engine.events().publish(DomainEvent::ComparisonCompleted {
            faster: faster.to_string(),
            performance_gain_percent: gain,
            timestamp: Utc::now(),
        });

        let mut results = BTreeMap::new();
        results.insert(StrategyKind::Direct, direct);
        results.insert(StrategyKind::Envelope, envelope);

        Ok(ComparisonResult {
            results,
            faster_strategy: faster,
            performance_gain_percent: gain,
        })
    }

    /// Repeat the two-strategy run `iterations` times and average the
    /// successful durations.
    pub async fn benchmark(&self, question: &str, iterations: usize) -> Result<BenchmarkResult> {
        validate_request(question, self.benchmark_max_results)?;

        let mut direct = Tally::default();
        let mut envelope = Tally::default();

        for iteration in 0..iterations {
            let (d, e) = self.measure_both(question, self.benchmark_max_results).await;
            direct.record(&d);
            envelope.record(&e);
            info!(
                iteration = iteration + 1,
                iterations,
                direct_ms = d.duration_ms,
                envelope_ms = e.duration_ms,
                "Benchmark iteration"
            );
        }

        let direct_avg = direct.average_ms();
        let envelope_avg = envelope.average_ms();
        let result = BenchmarkResult {
            iterations,
            success_count: BTreeMap::from([
                (StrategyKind::Direct, direct.successes),
                (StrategyKind::Envelope, envelope.successes),
            ]),
            average_latency_ms: BTreeMap::from([
                (StrategyKind::Direct, direct_avg),
                (StrategyKind::Envelope, envelope_avg),
            ]),
            faster_strategy: faster_strategy(direct_avg, envelope_avg),
            performance_gain_percent: performance_gain(direct_avg, envelope_avg),
        };

        info!(
            iterations,
            direct_avg_ms = direct_avg,
            envelope_avg_ms = envelope_avg,
            faster = %result.faster_strategy,
            "Benchmark completed"
        );
        Ok(result)
    }
}

/// Trade-offs of both strategies. Pure data.
pub fn strategy_info() -> Vec<StrategyInfo> {
    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    vec![
        StrategyInfo {
            strategy: StrategyKind::Direct,
            name: "Direct".into(),
            description: "Agents are called in-process through the capability interface".into(),
            advantages: strings(&[
                "Direct calls between agents with no intermediate layer",
                "No serialization overhead",
                "Simpler to implement and debug",
            ]),
            disadvantages: strings(&[
                "Less structured",
                "Calls between agents are hard to trace",
                "Tighter coupling between components",
            ]),
        },
        StrategyInfo {
            strategy: StrategyKind::Envelope,
            name: "Envelope".into(),
            description: "Every call is a serialized request/response exchange carrying a \
                          context envelope"
                .into(),
            advantages: strings(&[
                "Well-defined, typed request and response frames",
                "Full traceability (session id, timestamps, metadata)",
                "Event side-channel with acknowledgements",
                "Agents are decoupled behind the exchange boundary",
                "Ready to be split across services",
            ]),
            disadvantages: strings(&[
                "More moving parts",
                "Serialization and deserialization overhead",
                "Frame formats must be kept in sync",
            ]),
        },
    ]
}
