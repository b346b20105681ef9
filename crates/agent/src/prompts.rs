//! Prompt templates for each task kind.
//!
//! A template is a fixed system prompt plus a user prompt with `{key}`
//! placeholders, filled from the task's [`AgentInputs`].

use tandem_core::agent::{AgentInputs, TaskKind};
use tandem_core::error::Result;
use tandem_core::message::Message;

/// System and user prompt for one task kind.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub system: &'static str,
    pub user: &'static str,
}

const ANALYST: &str = "You are an expert document analyst. Your job is to read technical \
documents carefully and produce accurate, well-structured summaries that capture the main \
ideas, concepts and relationships.";

const EXTRACTOR: &str = "You are an expert document analyst. Identify the facts, definitions, \
figures and conclusions that matter most in a text and list them concisely.";

const EXPERT: &str = "You are a senior technical expert. Answer questions precisely, using only \
the provided context. If the context does not contain the answer, say so.";

const VALIDATOR: &str = "You are a critical reviewer. Check answers against their source \
context, point out factual errors, omissions and unsupported claims, and suggest concrete \
corrections.";

const COORDINATOR: &str = "You are a coordinator that combines the work of several specialist \
agents into one clear, accurate and complete final answer for the user.";

const PLANNER: &str = "You are a planner for a team of specialist agents (document-analyst, \
technical-expert, validator, coordinator). Decide which agents a question needs and in what \
order.";

/// The template for `task`.
pub fn template(task: TaskKind) -> PromptTemplate {
    match task {
        TaskKind::AnalyzeDocument => PromptTemplate {
            system: ANALYST,
            user: "Analyze the following document and provide a detailed summary:\n\n{content}",
        },
        TaskKind::ExtractKeyInfo => PromptTemplate {
            system: EXTRACTOR,
            user: "Extract the most important information from this text:\n\n{content}",
        },
        TaskKind::AnswerTechnical => PromptTemplate {
            system: EXPERT,
            user: "Based on the provided context, answer the technical question:\n\n\
                   Context: {context}\n\nQuestion: {question}",
        },
        TaskKind::ValidateAnswer => PromptTemplate {
            system: VALIDATOR,
            user: "Validate the following answer against the original context:\n\n\
                   Original context: {context}\n\nAnswer to validate: {answer}\n\n\
                   Is the answer correct and complete? If not, suggest improvements.",
        },
        TaskKind::SynthesizeFinal => PromptTemplate {
            system: COORDINATOR,
            user: "Synthesize the following information into a coherent final answer:\n\n\
                   Document analysis: {analysis}\n\nTechnical answer: {technicalAnswer}\n\n\
                   Validation: {validation}\n\nOriginal question: {originalQuestion}",
        },
        TaskKind::PlanExecution => PromptTemplate {
            system: PLANNER,
            user: "Plan how to answer this question:\n\n{question}\n\n\
                   Respond with JSON only: {\"agents\": [...], \"strategy\": \"...\"}",
        },
    }
}

/// Replace every `{key}` in `template` whose key is present in `inputs`.
///
/// Placeholders are matched against the input keys only, so literal braces
/// elsewhere in the template are left alone. Values are not re-scanned.
pub fn render(template: &str, inputs: &AgentInputs) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let key = &after[..close];
            inputs.get(key).map(|value| (value, close))
        });
        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Build the `[system, user]` conversation for a task.
///
/// Fails with `InvalidInput` when a required key is missing.
pub fn build_messages(task: TaskKind, inputs: &AgentInputs) -> Result<Vec<Message>> {
    inputs.check(task)?;
    let tpl = template(task);
    Ok(vec![
        Message::system(tpl.system),
        Message::user(render(tpl.user, inputs)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::message::Role;

    #[test]
    fn every_template_mentions_its_required_keys() {
        for task in TaskKind::ALL {
            let tpl = template(task);
            for key in task.required_keys() {
                assert!(
                    tpl.user.contains(&format!("{{{key}}}")),
                    "{task} template lacks {{{key}}}"
                );
            }
        }
    }

    #[test]
    fn render_fills_placeholders() {
        let inputs = AgentInputs::new()
            .with("context", "Rust has ownership.")
            .with("question", "What is ownership?");
        let text = render(template(TaskKind::AnswerTechnical).user, &inputs);
        assert!(text.contains("Context: Rust has ownership."));
        assert!(text.ends_with("Question: What is ownership?"));
        assert!(!text.contains('{'));
    }

    #[test]
    fn render_leaves_unknown_braces() {
        let inputs = AgentInputs::new().with("question", "q");
        let text = render(template(TaskKind::PlanExecution).user, &inputs);
        assert!(text.contains("{\"agents\": [...]"));
        assert!(text.contains("\n\nq\n\n"));
    }

    #[test]
    fn values_are_not_rescanned() {
        let inputs = AgentInputs::new().with("content", "{content}");
        assert_eq!(render("x {content} y", &inputs), "x {content} y");
    }

    #[test]
    fn build_messages_orders_system_then_user() {
        let inputs = AgentInputs::new().with("content", "doc");
        let messages = build_messages(TaskKind::ExtractKeyInfo, &inputs).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.ends_with("doc"));
    }

    #[test]
    fn build_messages_rejects_missing_keys() {
        let inputs = AgentInputs::new().with("context", "c");
        let err = build_messages(TaskKind::ValidateAnswer, &inputs).unwrap_err();
        assert!(err.is_invalid_input());
    }
}
