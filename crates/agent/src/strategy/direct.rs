//! Direct strategy: in-process call, nothing attached.

use std::sync::Arc;

use async_trait::async_trait;
use tandem_core::agent::{AgentCapability, AgentInputs, TaskKind};
use tandem_core::error::Result;

use super::{RunContext, StrategyKind, TransportStrategy};

pub struct DirectStrategy {
    agent: Arc<dyn AgentCapability>,
}

impl DirectStrategy {
    pub fn new(agent: Arc<dyn AgentCapability>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl TransportStrategy for DirectStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Direct
    }

    async fn run_stage(
        &self,
        _run: &RunContext,
        task: TaskKind,
        inputs: AgentInputs,
    ) -> Result<String> {
        self.agent.invoke(task, &inputs).await
    }
}
