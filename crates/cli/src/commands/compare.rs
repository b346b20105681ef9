//! `tandem compare` — Both strategies, once each.

use std::path::PathBuf;

use super::{print_json, runtime};

pub async fn run(
    question: &str,
    max_results: Option<usize>,
    docs: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = runtime::build(docs).await?;
    let max_results = max_results.unwrap_or(rt.config.retrieval.default_max_results);

    let result = rt.orchestrator.compare(question, max_results).await?;
    print_json(&result)
}
