//! LLM-backed agent capability.
//!
//! One `LlmAgent` serves all four agent roles: the task kind selects the
//! prompt template, the provider does the rest.

use std::sync::Arc;

use async_trait::async_trait;
use tandem_config::AppConfig;
use tandem_core::agent::{AgentCapability, AgentInputs, TaskKind};
use tandem_core::error::Result;
use tandem_core::provider::{Provider, ProviderRequest};
use tracing::debug;

use crate::prompts;

pub struct LlmAgent {
    /// LLM provider.
    provider: Arc<dyn Provider>,
    /// Model name.
    model: String,
    /// Temperature.
    temperature: f32,
    /// Upper bound on generated tokens per call.
    max_tokens: Option<u32>,
}

impl LlmAgent {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    /// Use the model, temperature and token limit from `config`.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, &config.default_model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[async_trait]
impl AgentCapability for LlmAgent {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn invoke(&self, task: TaskKind, inputs: &AgentInputs) -> Result<String> {
        let messages = prompts::build_messages(task, inputs)?;

        debug!(task = %task, role = %task.role(), model = %self.model, "Invoking agent");

        let response = self
            .provider
            .complete(ProviderRequest {
                model: self.model.clone(),
                messages,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            })
            .await?;

        Ok(response.message.content)
    }
}
