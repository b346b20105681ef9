//! `tandem benchmark` — Repeated comparison with averaged latencies.

use std::path::PathBuf;

use super::{print_json, runtime};

pub async fn run(
    question: &str,
    iterations: Option<usize>,
    docs: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = runtime::build(docs).await?;
    let iterations = iterations.unwrap_or(rt.config.pipeline.default_iterations);

    eprintln!("  Running {iterations} iteration(s) per strategy...");
    let result = rt.orchestrator.benchmark(question, iterations).await?;
    print_json(&result)
}
