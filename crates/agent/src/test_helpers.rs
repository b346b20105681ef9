//! Shared test doubles for pipeline, strategy and comparison tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tandem_core::agent::{AgentCapability, AgentInputs, TaskKind};
use tandem_core::error::{Error, ProviderError, Result, RetrievalError};
use tandem_core::message::Message;
use tandem_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use tandem_core::retrieval::Retriever;

/// An agent that answers `"<task> output"` (or a scripted text) and records
/// every call in order.
pub struct ScriptedAgent {
    outputs: HashMap<TaskKind, String>,
    fail_on: Option<TaskKind>,
    fail_on_calls: Vec<usize>,
    calls: Mutex<Vec<(TaskKind, AgentInputs)>>,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self {
            outputs: HashMap::new(),
            fail_on: None,
            fail_on_calls: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[allow(dead_code)]
    pub fn with_output(mut self, task: TaskKind, text: &str) -> Self {
        self.outputs.insert(task, text.to_string());
        self
    }

    /// Fail every call of this task kind.
    pub fn fail_on(mut self, task: TaskKind) -> Self {
        self.fail_on = Some(task);
        self
    }

    /// Fail the n-th call (0-based, across all task kinds).
    pub fn fail_on_call(mut self, n: usize) -> Self {
        self.fail_on_calls.push(n);
        self
    }

    pub fn calls(&self) -> Vec<(TaskKind, AgentInputs)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn tasks(&self) -> Vec<TaskKind> {
        self.calls().into_iter().map(|(task, _)| task).collect()
    }
}

#[async_trait::async_trait]
impl AgentCapability for ScriptedAgent {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, task: TaskKind, inputs: &AgentInputs) -> Result<String> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((task, inputs.clone()));
            calls.len() - 1
        };

        if self.fail_on == Some(task) || self.fail_on_calls.contains(&index) {
            return Err(Error::Provider(ProviderError::ApiError {
                status_code: 500,
                message: format!("scripted failure on {task}"),
            }));
        }

        Ok(self
            .outputs
            .get(&task)
            .cloned()
            .unwrap_or_else(|| format!("{task} output")))
    }
}

/// A retriever over a fixed snippet list, with an optional per-call delay
/// schedule (consumed front to back).
pub struct StaticRetriever {
    snippets: Vec<String>,
    delays_ms: Mutex<VecDeque<u64>>,
    failure: Option<RetrievalError>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StaticRetriever {
    pub fn new(snippets: &[&str]) -> Self {
        Self {
            snippets: snippets.iter().map(|s| s.to_string()).collect(),
            delays_ms: Mutex::new(VecDeque::new()),
            failure: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(&[])
    }

    pub fn failing(error: RetrievalError) -> Self {
        let mut retriever = Self::empty();
        retriever.failure = Some(error);
        retriever
    }

    pub fn with_delays(self, delays_ms: &[u64]) -> Self {
        *self.delays_ms.lock().unwrap() = delays_ms.iter().copied().collect();
        self
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        "static"
    }

    async fn retrieve(
        &self,
        query: &str,
        max_results: usize,
    ) -> std::result::Result<Vec<String>, RetrievalError> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));

        let delay = self.delays_ms.lock().unwrap().pop_front();
        if let Some(ms) = delay {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self.snippets.iter().take(max_results).cloned().collect())
    }
}

/// A provider that returns one canned reply (or error) and records requests.
pub struct RecordingProvider {
    reply: std::result::Result<String, ProviderError>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl RecordingProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            reply: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.reply.clone().map(|text| make_text_response(&text))
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}
