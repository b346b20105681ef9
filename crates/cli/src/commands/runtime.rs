//! Shared startup: config, provider, documents, retriever, orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use tandem_agent::{LlmAgent, Orchestrator};
use tandem_config::{AppConfig, RetrievalMode};
use tandem_core::retrieval::Retriever;
use tandem_retrieval::{DocumentStore, KeywordRetriever, VectorRetriever, load_documents};
use tracing::{info, warn};

/// Providers that run locally and need no API key.
const KEYLESS_PROVIDERS: &[&str] = &["ollama", "vllm", "llamacpp", "llama.cpp"];

pub struct Runtime {
    pub config: AppConfig,
    pub orchestrator: Orchestrator,
}

pub async fn build(docs: Option<PathBuf>) -> Result<Runtime, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    require_api_key(&config)?;

    let router = tandem_providers::router::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;

    let store = DocumentStore::new();
    let docs_dir = docs.or_else(|| config.retrieval.documents_dir.as_ref().map(PathBuf::from));
    if let Some(dir) = docs_dir {
        let added = load_documents(&store, &dir).await?;
        info!(dir = %dir.display(), snippets = added, "Documents loaded");
    }
    if store.is_empty().await {
        warn!("No documents loaded; every question will get the no-documents answer");
    }

    let retriever: Arc<dyn Retriever> = match config.retrieval.mode {
        RetrievalMode::Keyword => Arc::new(KeywordRetriever::new(store)),
        RetrievalMode::Vector => {
            let retriever = VectorRetriever::new(
                store,
                provider.clone(),
                &config.retrieval.embedding_model,
                config.retrieval.min_score,
            );
            retriever.index_missing().await?;
            Arc::new(retriever)
        }
    };

    let agent = Arc::new(LlmAgent::from_config(provider, &config));
    let orchestrator = Orchestrator::new(agent, retriever, &config);

    Ok(Runtime {
        config,
        orchestrator,
    })
}

fn require_api_key(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let provider_has_key = config
        .providers
        .get(&config.default_provider)
        .is_some_and(|p| p.api_key.is_some());

    if config.has_api_key()
        || provider_has_key
        || KEYLESS_PROVIDERS.contains(&config.default_provider.as_str())
    {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    OPENROUTER_API_KEY=sk-or-v1-...   (recommended)");
    eprintln!("    OPENAI_API_KEY=sk-...             (for OpenAI direct)");
    eprintln!("    TANDEM_API_KEY=sk-...             (generic)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}
