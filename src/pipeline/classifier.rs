//! Intent classification with the small router model.

use super::intent::Intent;
use crate::engine::{Grammar, InferenceEngine, InferenceRequest};
use crate::error::Result;
use crate::session::PromptTemplates;
use std::sync::Arc;

/// One constrained generation that maps free text to an [`Intent`].
pub struct IntentClassifier {
    engine: Arc<dyn InferenceEngine>,
    model: String,
    templates: PromptTemplates,
    grammar: Grammar,
    max_tokens: u32,
}

impl IntentClassifier {
    /// Classifier over `model`, which should be small and kept resident.
    pub fn new(
        engine: Arc<dyn InferenceEngine>,
        model: impl Into<String>,
        templates: PromptTemplates,
        max_tokens: u32,
    ) -> Self {
        Self {
            engine,
            model: model.into(),
            templates,
            grammar: Grammar::one_of(Intent::LABELS),
            max_tokens,
        }
    }

    /// Classify `input`. Never fails: any engine problem means chat.
    pub fn classify(&self, input: &str) -> Intent {
        match self.try_classify(input) {
            Ok(intent) => intent,
            Err(err) => {
                tracing::warn!(model = %self.model, %err, "classification failed; defaulting to chat");
                Intent::Chat
            }
        }
    }

    fn try_classify(&self, input: &str) -> Result<Intent> {
        if !self.engine.is_loaded(&self.model) {
            self.engine.load(&self.model)?;
        }
        let prompt = self.templates.classify_prompt(input);
        let request =
            InferenceRequest::new(&self.model, &prompt, self.max_tokens).with_grammar(&self.grammar);
        let output = self.engine.infer(&request, &mut |_| {}, None)?;
        let intent = Intent::from_output(&output);
        tracing::info!(output = output.trim(), %intent, "classified request");
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{Script, ScriptedEngine};

    fn classifier(engine: &Arc<ScriptedEngine>) -> IntentClassifier {
        IntentClassifier::new(engine.clone(), "router", PromptTemplates::default(), 10)
    }

    #[test]
    fn test_constrained_request() {
        let engine = Arc::new(ScriptedEngine::new([Script::chunks(["TOOL"])]));
        assert_eq!(classifier(&engine).classify("list my files"), Intent::Tool);

        let call = &engine.calls()[0];
        assert_eq!(call.model, "router");
        assert_eq!(call.max_tokens, 10);
        assert!(call.prompt.contains("list my files"));
        let grammar = call.grammar.as_ref().unwrap();
        assert_eq!(grammar.alternatives(), ["CODE", "CHAT", "TOOL"]);
    }

    #[test]
    fn test_json_quoted_output() {
        let engine = Arc::new(ScriptedEngine::new([Script::chunks(["\"CO", "DE\""])]));
        assert_eq!(classifier(&engine).classify("write a parser"), Intent::CodeGeneration);
    }

    #[test]
    fn test_failure_defaults_to_chat() {
        let engine = Arc::new(ScriptedEngine::new([Script::Fail("timeout".into())]));
        assert_eq!(classifier(&engine).classify("anything"), Intent::Chat);
    }

    #[test]
    fn test_load_failure_defaults_to_chat() {
        let engine = Arc::new(ScriptedEngine::unloadable());
        assert_eq!(classifier(&engine).classify("anything"), Intent::Chat);
        assert_eq!(engine.call_count(), 0);
    }

    #[test]
    fn test_garbage_defaults_to_chat() {
        let engine = Arc::new(ScriptedEngine::new([Script::chunks(["???"])]));
        assert_eq!(classifier(&engine).classify("hm"), Intent::Chat);
    }
}
