use serde::{Deserialize, Serialize};

use crate::domain::{ConversationTurn, SearchResult};

/// Templates with `{history}`, `{context}` and `{question}` placeholders.
///
/// In `answer`, `{history}` expands to a "Previous conversation" block, or to
/// nothing for a fresh conversation. In `condense` it expands to the bare
/// history lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub system: String,
    pub answer: String,
    pub condense: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: "You answer questions about the user's documents. Rely only on the \
                     provided context and say so when it does not contain the answer."
                .to_string(),
            answer: "Use the following pieces of context to answer the question at the end. \
                     If you don't know the answer, just say that you don't know, don't try \
                     to make up an answer.\n\n{context}\n\n{history}Question: {question}\n\
                     Helpful Answer:"
                .to_string(),
            condense: "Given the following conversation and a follow up question, rephrase \
                       the follow up question to be a standalone question, in its original \
                       language.\n\nChat History:\n{history}\nFollow Up Input: {question}\n\
                       Standalone question:"
                .to_string(),
        }
    }
}

pub struct PromptBuilder<'a> {
    templates: &'a PromptTemplates,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(templates: &'a PromptTemplates) -> Self {
        Self { templates }
    }

    pub fn system(&self) -> &str {
        &self.templates.system
    }

    pub fn answer_prompt(
        &self,
        history: &[ConversationTurn],
        context: &[SearchResult],
        question: &str,
    ) -> String {
        let history_block = if history.is_empty() {
            String::new()
        } else {
            format!("Previous conversation:\n{}\n\n", format_history(history))
        };

        render(
            &self.templates.answer,
            &[
                ("history", history_block.as_str()),
                ("context", build_context(context).as_str()),
                ("question", question),
            ],
        )
    }

    pub fn condense_prompt(&self, history: &[ConversationTurn], question: &str) -> String {
        render(
            &self.templates.condense,
            &[
                ("history", format_history(history).as_str()),
                ("question", question),
            ],
        )
    }
}

pub fn format_history(history: &[ConversationTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.role.as_str(), turn.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[{}] (source: {})\n{}", i + 1, r.chunk.document_id, r.chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Keeps results in rank order while their combined length fits `max_chars`.
/// The best result is always kept.
pub fn select_context(results: Vec<SearchResult>, max_chars: usize) -> Vec<SearchResult> {
    let mut used = 0;
    let mut selected = Vec::with_capacity(results.len());
    for result in results {
        let len = result.chunk.length;
        if !selected.is_empty() && used + len > max_chars {
            break;
        }
        used += len;
        selected.push(result);
    }
    selected
}

/// Single-pass substitution, so placeholder text inside values is left alone.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = values.iter().find(|(key, _)| {
            after.starts_with(key) && after[key.len()..].starts_with('}')
        });
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &after[key.len() + 1..];
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Chunk;

    fn result(doc: &str, content: &str, start: usize) -> SearchResult {
        SearchResult {
            chunk: Chunk::new(doc, content, start, 0),
            score: 1.0,
        }
    }

    #[test]
    fn test_render_ignores_placeholders_in_values() {
        let out = render(
            "{a} and {b} {unknown}",
            &[("a", "{b}"), ("b", "two")],
        );
        assert_eq!(out, "{b} and two {unknown}");
    }

    #[test]
    fn test_answer_prompt_without_history() {
        let templates = PromptTemplates::default();
        let prompt = PromptBuilder::new(&templates).answer_prompt(
            &[],
            &[result("guide.txt", "Rust has ownership.", 0)],
            "What does Rust have?",
        );

        assert!(prompt.contains("[1] (source: guide.txt)\nRust has ownership."));
        assert!(prompt.contains("Question: What does Rust have?"));
        assert!(!prompt.contains("Previous conversation"));
    }

    #[test]
    fn test_answer_prompt_with_history() {
        let templates = PromptTemplates::default();
        let history = vec![
            ConversationTurn::user("Who wrote it?"),
            ConversationTurn::assistant("Ferris.", Vec::new()),
        ];
        let prompt = PromptBuilder::new(&templates).answer_prompt(&history, &[], "When?");

        assert!(prompt.contains("Previous conversation:\nUser: Who wrote it?\nAssistant: Ferris.\n\n"));
    }

    #[test]
    fn test_condense_prompt() {
        let templates = PromptTemplates::default();
        let history = vec![ConversationTurn::user("Tell me about crates")];
        let prompt = PromptBuilder::new(&templates).condense_prompt(&history, "and modules?");

        assert!(prompt.contains("Chat History:\nUser: Tell me about crates\n"));
        assert!(prompt.ends_with("Follow Up Input: and modules?\nStandalone question:"));
    }

    #[test]
    fn test_select_context_respects_budget() {
        let results = vec![
            result("a", "0123456789", 0),
            result("a", "0123456789", 10),
            result("a", "0123456789", 20),
        ];
        assert_eq!(select_context(results.clone(), 25).len(), 2);
        assert_eq!(select_context(results, 5).len(), 1);
    }
}
