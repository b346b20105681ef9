//! Agent capability: one reasoning call, keyed by task kind.
//!
//! The pipeline depends on this single contract rather than on four concrete
//! agent types. Which agent persona answers is derived from the [`TaskKind`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The kinds of reasoning task an agent can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// Summarize a document. Inputs: `content`.
    AnalyzeDocument,
    /// Extract the most relevant facts. Inputs: `content`.
    ExtractKeyInfo,
    /// Answer a question from context. Inputs: `context`, `question`.
    AnswerTechnical,
    /// Check an answer against context. Inputs: `context`, `answer`.
    ValidateAnswer,
    /// Merge all intermediate outputs. Inputs: `analysis`, `technicalAnswer`,
    /// `validation`, `originalQuestion`.
    SynthesizeFinal,
    /// Reserved for multi-path routing. Inputs: `question`.
    PlanExecution,
}

impl TaskKind {
    pub const ALL: [TaskKind; 6] = [
        TaskKind::AnalyzeDocument,
        TaskKind::ExtractKeyInfo,
        TaskKind::AnswerTechnical,
        TaskKind::ValidateAnswer,
        TaskKind::SynthesizeFinal,
        TaskKind::PlanExecution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::AnalyzeDocument => "analyze-document",
            TaskKind::ExtractKeyInfo => "extract-key-info",
            TaskKind::AnswerTechnical => "answer-technical",
            TaskKind::ValidateAnswer => "validate-answer",
            TaskKind::SynthesizeFinal => "synthesize-final",
            TaskKind::PlanExecution => "plan-execution",
        }
    }

    /// Input keys that must be present for this task.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            TaskKind::AnalyzeDocument | TaskKind::ExtractKeyInfo => &["content"],
            TaskKind::AnswerTechnical => &["context", "question"],
            TaskKind::ValidateAnswer => &["context", "answer"],
            TaskKind::SynthesizeFinal => {
                &["analysis", "technicalAnswer", "validation", "originalQuestion"]
            }
            TaskKind::PlanExecution => &["question"],
        }
    }

    /// The agent persona that handles this task.
    pub fn role(&self) -> AgentRole {
        match self {
            TaskKind::AnalyzeDocument | TaskKind::ExtractKeyInfo => AgentRole::Analyst,
            TaskKind::AnswerTechnical => AgentRole::TechnicalExpert,
            TaskKind::ValidateAnswer => AgentRole::Validator,
            TaskKind::SynthesizeFinal | TaskKind::PlanExecution => AgentRole::Coordinator,
        }
    }

    /// The stage this task runs as.
    pub fn stage(&self) -> Stage {
        match self {
            TaskKind::AnalyzeDocument => Stage::Analyze,
            TaskKind::ExtractKeyInfo => Stage::Extract,
            TaskKind::AnswerTechnical => Stage::Answer,
            TaskKind::ValidateAnswer => Stage::Validate,
            TaskKind::SynthesizeFinal => Stage::Coordinate,
            TaskKind::PlanExecution => Stage::Plan,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four specialist agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Analyst,
    TechnicalExpert,
    Validator,
    Coordinator,
}

impl AgentRole {
    /// Identifier used when this agent answers through an envelope.
    pub fn agent_id(&self) -> &'static str {
        match self {
            AgentRole::Analyst => "document-analyst",
            AgentRole::TechnicalExpert => "technical-expert",
            AgentRole::Validator => "validator",
            AgentRole::Coordinator => "coordinator",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.agent_id())
    }
}

/// A named step of a pipeline run. Errors are tagged with the stage that
/// raised them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Retrieve,
    Extract,
    Analyze,
    Answer,
    Validate,
    Coordinate,
    Plan,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Retrieve => "retrieve",
            Stage::Extract => "extract",
            Stage::Analyze => "analyze",
            Stage::Answer => "answer",
            Stage::Validate => "validate",
            Stage::Coordinate => "coordinate",
            Stage::Plan => "plan",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named string inputs for a task. Ordered so prompts and envelopes are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentInputs(BTreeMap<String, String>);

impl AgentInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Fail with `InvalidInput` unless every key `task` needs is present.
    pub fn check(&self, task: TaskKind) -> Result<()> {
        let missing: Vec<&str> = task
            .required_keys()
            .iter()
            .copied()
            .filter(|k| !self.0.contains_key(*k))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "task '{}' is missing input(s): {}",
                task,
                missing.join(", ")
            )))
        }
    }
}

/// One reasoning call: `(task kind, inputs) -> generated text`.
///
/// Implementations perform no retries; collaborator failures are surfaced
/// unchanged.
#[async_trait]
pub trait AgentCapability: Send + Sync {
    /// A human-readable name for this capability (e.g., "llm").
    fn name(&self) -> &str;

    /// Run `task` against `inputs` and return the generated text.
    async fn invoke(&self, task: TaskKind, inputs: &AgentInputs) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_task_maps_to_a_distinct_stage() {
        let stages: std::collections::HashSet<Stage> =
            TaskKind::ALL.iter().map(|t| t.stage()).collect();
        assert_eq!(stages.len(), TaskKind::ALL.len());
        assert!(!stages.contains(&Stage::Retrieve));
    }

    #[test]
    fn roles_follow_task_kind() {
        assert_eq!(TaskKind::ExtractKeyInfo.role(), AgentRole::Analyst);
        assert_eq!(TaskKind::AnswerTechnical.role(), AgentRole::TechnicalExpert);
        assert_eq!(TaskKind::ValidateAnswer.role(), AgentRole::Validator);
        assert_eq!(TaskKind::PlanExecution.role(), AgentRole::Coordinator);
    }

    #[test]
    fn check_reports_missing_keys() {
        let inputs = AgentInputs::new().with("analysis", "a").with("validation", "v");
        let err = inputs.check(TaskKind::SynthesizeFinal).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("technicalAnswer"));
        assert!(text.contains("originalQuestion"));
        assert!(!text.contains("analysis,"));
    }

    #[test]
    fn check_accepts_complete_inputs() {
        let inputs = AgentInputs::new()
            .with("context", "ctx")
            .with("question", "q");
        assert!(inputs.check(TaskKind::AnswerTechnical).is_ok());
    }

    #[test]
    fn task_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&TaskKind::SynthesizeFinal).unwrap();
        assert_eq!(json, "\"synthesize-final\"");
        assert_eq!(TaskKind::SynthesizeFinal.to_string(), "synthesize-final");
    }
}
