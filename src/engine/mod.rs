//! Inference engine boundary.
//!
//! The rest of the crate only sees [`InferenceEngine`]: load a model, then
//! stream a completion through a per-chunk callback while honouring a
//! [`CancellationToken`]. The engine is an explicitly owned, long-lived
//! handle (`Arc<dyn InferenceEngine>`) passed to whoever needs it.
//!
//! ```text
//!  IntentClassifier ──┐
//!                     ├──▶ Arc<dyn InferenceEngine> ──▶ OllamaEngine ──▶ HTTP
//!  ChatSession ───────┘
//! ```

mod cancel;
mod grammar;
mod ollama;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::CancellationToken;
pub use grammar::Grammar;
pub use ollama::OllamaEngine;

use crate::error::Result;

/// One generation request.
#[derive(Debug, Clone, Copy)]
pub struct InferenceRequest<'a> {
    /// Model to run.
    pub model: &'a str,
    /// Fully rendered prompt, sent verbatim.
    pub prompt: &'a str,
    /// Optional output constraint.
    pub grammar: Option<&'a Grammar>,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl<'a> InferenceRequest<'a> {
    /// Unconstrained request.
    pub const fn new(model: &'a str, prompt: &'a str, max_tokens: u32) -> Self {
        Self {
            model,
            prompt,
            grammar: None,
            max_tokens,
        }
    }

    /// Attach an output grammar.
    #[must_use]
    pub const fn with_grammar(mut self, grammar: &'a Grammar) -> Self {
        self.grammar = Some(grammar);
        self
    }
}

/// A text generation backend.
///
/// Implementations must be shareable across threads: the classifier runs on
/// the worker thread and the UI may hold the same handle.
pub trait InferenceEngine: Send + Sync {
    /// Load a model and keep it resident.
    fn load(&self, model: &str) -> Result<()>;

    /// Whether `model` has been loaded by this engine.
    fn is_loaded(&self, model: &str) -> bool;

    /// Stream a completion.
    ///
    /// `on_chunk` receives each decoded piece as it is produced. When
    /// `cancel` is set the engine stops after the step in flight and returns
    /// what it generated so far.
    fn infer(
        &self,
        request: &InferenceRequest<'_>,
        on_chunk: &mut dyn FnMut(&str),
        cancel: Option<&CancellationToken>,
    ) -> Result<String>;
}
