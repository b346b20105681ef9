//! `tandem ask` — One question through the pipeline.

use std::path::PathBuf;

use tandem_agent::StrategyKind;

use super::runtime;

pub async fn run(
    question: &str,
    max_results: Option<usize>,
    strategy: StrategyKind,
    simple: bool,
    docs: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = runtime::build(docs).await?;
    let max_results = max_results.unwrap_or(rt.config.retrieval.default_max_results);
    let orchestrator = &rt.orchestrator;

    eprint!("  Thinking...");
    let outcome = if simple {
        orchestrator
            .execute_simplified(question, max_results)
            .await
            .map(|answer| (answer, None))
    } else {
        match strategy {
            StrategyKind::Direct => orchestrator
                .execute_agent_pipeline(question, max_results)
                .await
                .map(|r| (r.final_answer, None)),
            StrategyKind::Envelope => orchestrator
                .execute_with_envelope_strategy(question, max_results)
                .await
                .map(|t| (t.response.final_answer, Some((t.session_id, t.duration_ms)))),
        }
    };
    eprint!("\r              \r");

    let (answer, trace) = outcome?;
    println!("{answer}");

    if let Some((session_id, duration_ms)) = trace {
        println!();
        println!("  Strategy:  envelope");
        println!("  Session:   {session_id}");
        println!("  Duration:  {duration_ms} ms");
    }

    Ok(())
}
