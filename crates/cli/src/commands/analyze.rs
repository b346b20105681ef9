//! `tandem analyze` — Document-only analysis, no retrieval.

use std::path::Path;

use super::{print_json, runtime};

pub async fn run(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;

    let rt = runtime::build(None).await?;
    let analysis = rt.orchestrator.analyze_with_agents(&content).await?;
    print_json(&analysis)
}
