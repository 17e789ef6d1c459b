//! Prompt templates.
//!
//! Every literal the model sees lives here, as data, so the templates can be
//! swapped from the config file without touching control flow. The default
//! set is ChatML with a Qwen3-style `<think>` section.

use super::history::{ConversationTurn, Role};
use serde::{Deserialize, Serialize};

const CONTENT: &str = "{content}";
const INPUT: &str = "{input}";

/// Named prompt templates. `{content}` and `{input}` are placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    /// System instruction placed at the top of every chat prompt.
    pub system: String,
    /// Wraps the system instruction.
    pub system_turn: String,
    /// Wraps one user turn.
    pub user_turn: String,
    /// Wraps one completed assistant turn (answer only).
    pub assistant_turn: String,
    /// Opens the assistant's reply and its thinking section.
    pub assistant_open: String,
    /// Closes the thinking section. Must match what the model emits.
    pub think_close: String,
    /// Intent classification prompt.
    pub classify: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: "You are a helpful coding assistant running locally. \
                     Reason inside the think section, then give a concise answer."
                .to_string(),
            system_turn: "<|im_start|>system\n{content}<|im_end|>\n".to_string(),
            user_turn: "<|im_start|>user\n{content}<|im_end|>\n".to_string(),
            assistant_turn: "<|im_start|>assistant\n{content}<|im_end|>\n".to_string(),
            assistant_open: "<|im_start|>assistant\n<think>\n".to_string(),
            think_close: crate::stream::THINK_CLOSE.to_string(),
            classify: "Classify this request as CODE, CHAT, or TOOL:\n{input}\nClassification:"
                .to_string(),
        }
    }
}

impl PromptTemplates {
    /// Render the chat prompt for `message`, preceded by prior turns.
    ///
    /// Assistant turns contribute only their answer, never their thinking.
    pub fn chat_prompt(&self, context: &[ConversationTurn], message: &str) -> String {
        let mut prompt = self.system_turn.replace(CONTENT, &self.system);
        for turn in context {
            let rendered = match turn.role {
                Role::User => self.user_turn.replace(CONTENT, &turn.content),
                Role::Assistant => self
                    .assistant_turn
                    .replace(CONTENT, self.answer_part(&turn.content).trim()),
            };
            prompt.push_str(&rendered);
        }
        prompt.push_str(&self.user_turn.replace(CONTENT, message));
        prompt.push_str(&self.assistant_open);
        prompt
    }

    /// Prompt that resumes generation right after the thinking section.
    pub fn continuation_prompt(&self, prompt: &str, primed_response: &str) -> String {
        let mut next = String::with_capacity(prompt.len() + primed_response.len());
        next.push_str(prompt);
        next.push_str(primed_response);
        next
    }

    /// Text appended to a response whose thinking never closed.
    pub fn forced_close(&self) -> String {
        format!("{}\n\n", self.think_close)
    }

    /// Render the classification prompt.
    pub fn classify_prompt(&self, input: &str) -> String {
        self.classify.replace(INPUT, input)
    }

    /// The part of a stored response after the thinking delimiter.
    ///
    /// A response without the delimiter was cut off while thinking and has
    /// no answer, unless it is an error message recorded in its place.
    pub fn answer_part<'a>(&self, response: &'a str) -> &'a str {
        match response.find(&self.think_close) {
            Some(at) => &response[at + self.think_close.len()..],
            None if response.trim_start().starts_with("Error:") => response,
            None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_prompt_opens_thinking() {
        let prompt = PromptTemplates::default().chat_prompt(&[], "hello");
        assert!(prompt.starts_with("<|im_start|>system\n"));
        assert!(prompt.contains("<|im_start|>user\nhello<|im_end|>\n"));
        assert!(prompt.ends_with("<|im_start|>assistant\n<think>\n"));
    }

    #[test]
    fn test_context_drops_thinking() {
        let templates = PromptTemplates::default();
        let context = vec![
            ConversationTurn::user("what is 2+2"),
            ConversationTurn::assistant("add them</think>\n4"),
        ];
        let prompt = templates.chat_prompt(&context, "and 3+3?");
        assert!(prompt.contains("<|im_start|>assistant\n4<|im_end|>"));
        assert!(!prompt.contains("add them"));
    }

    #[test]
    fn test_answer_part_without_delimiter() {
        let templates = PromptTemplates::default();
        assert_eq!(templates.answer_part("Error: Chat model not loaded"), "Error: Chat model not loaded");
        assert_eq!(templates.answer_part("still weighing the options"), "");
    }

    #[test]
    fn test_cut_off_thinking_stays_out_of_context() {
        let templates = PromptTemplates::default();
        let context = vec![
            ConversationTurn::user("long question"),
            ConversationTurn::assistant("first I should consider"),
        ];
        let prompt = templates.chat_prompt(&context, "next");
        assert!(prompt.contains("<|im_start|>assistant\n<|im_end|>"));
        assert!(!prompt.contains("first I should consider"));
    }

    #[test]
    fn test_classify_prompt() {
        let prompt = PromptTemplates::default().classify_prompt("fix my loop");
        assert_eq!(prompt, "Classify this request as CODE, CHAT, or TOOL:\nfix my loop\nClassification:");
    }

    #[test]
    fn test_continuation_is_concatenation() {
        let templates = PromptTemplates::default();
        assert_eq!(templates.continuation_prompt("P", "R</think>\n"), "PR</think>\n");
    }

    #[test]
    fn test_templates_from_toml_fill_defaults() {
        let templates: PromptTemplates = toml::from_str("system = \"Be brief.\"").unwrap();
        assert_eq!(templates.system, "Be brief.");
        assert_eq!(templates.think_close, "</think>");
    }
}
