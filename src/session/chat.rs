//! Streaming chat session.
//!
//! [`ChatSession::run`] drives exactly one exchange:
//!
//! ```text
//!  load? ─▶ prompt ─▶ infer ──chunk──▶ SectionParser ──▶ sink(Thinking | Answer)
//!                       │                   │
//!                       │        budget exceeded: cancel + annotate
//!                       ▼
//!                    finish ─▶ empty answer? ─▶ one continuation ─▶ history += 2
//! ```

use super::history::SharedHistory;
use super::prompt::PromptTemplates;
use crate::config::SessionConfig;
use crate::engine::{CancellationToken, InferenceEngine, InferenceRequest};
use crate::error::Error;
use crate::stream::{Phase, SectionDelta, SectionParser};
use std::sync::Arc;

/// Returned when the chat model cannot be loaded.
pub const MODEL_NOT_LOADED: &str = "Error: Chat model not loaded";

/// Appended as answer text when the thinking budget runs out.
pub const THINKING_LIMIT_NOTICE: &str = "[Error: Thinking limit exceeded]";

/// Per-exchange stream state. Lives for one [`ChatSession::run`] call.
struct StreamState {
    parser: SectionParser,
    /// Raw response as the model (or the budget cut-off) produced it.
    response: String,
    thinking_chunks: usize,
    budget: usize,
    limit_note: String,
    exceeded: bool,
}

impl StreamState {
    fn new(templates: &PromptTemplates, budget: usize) -> Self {
        Self {
            parser: SectionParser::with_delimiter(templates.think_close.clone()),
            response: String::new(),
            thinking_chunks: 0,
            budget,
            limit_note: format!("{}\n{THINKING_LIMIT_NOTICE}", templates.think_close),
            exceeded: false,
        }
    }

    fn on_chunk(&mut self, chunk: &str, cancel: &CancellationToken, sink: &mut dyn FnMut(Phase, &str)) {
        if self.exceeded {
            return;
        }
        self.feed(chunk, sink);

        if self.parser.phase() == Phase::Thinking {
            self.thinking_chunks += 1;
            if self.thinking_chunks > self.budget {
                self.exceeded = true;
                cancel.cancel();
                tracing::warn!(budget = self.budget, "thinking budget exceeded; cutting off");
                let note = self.limit_note.clone();
                self.feed(&note, sink);
            }
        }
    }

    fn feed(&mut self, text: &str, sink: &mut dyn FnMut(Phase, &str)) {
        self.response.push_str(text);
        deliver(&self.parser.consume(text), sink);
    }

    fn finish(&mut self, sink: &mut dyn FnMut(Phase, &str)) {
        deliver(&self.parser.finish(), sink);
    }

    /// Record an engine failure as answer text.
    fn fail(&mut self, err: &Error, sink: &mut dyn FnMut(Phase, &str)) {
        let text = match err {
            Error::Engine(message) => format!("Error: {message}"),
            other => format!("Error: {other}"),
        };
        sink(Phase::Answer, &text);
        self.response.push_str(&text);
    }
}

fn deliver(delta: &SectionDelta, sink: &mut dyn FnMut(Phase, &str)) {
    if !delta.thinking.is_empty() {
        sink(Phase::Thinking, &delta.thinking);
    }
    if !delta.answer.is_empty() {
        sink(Phase::Answer, &delta.answer);
    }
}

/// Runs chat exchanges against one model and records them in history.
pub struct ChatSession {
    engine: Arc<dyn InferenceEngine>,
    model: String,
    templates: PromptTemplates,
    config: SessionConfig,
    history: SharedHistory,
}

impl ChatSession {
    /// Create a session for `model`.
    pub fn new(
        engine: Arc<dyn InferenceEngine>,
        model: impl Into<String>,
        templates: PromptTemplates,
        config: SessionConfig,
        history: SharedHistory,
    ) -> Self {
        Self {
            engine,
            model: model.into(),
            templates,
            config,
            history,
        }
    }

    /// History this session appends to.
    pub const fn history(&self) -> &SharedHistory {
        &self.history
    }

    /// Model used for chat.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one exchange and return the full response.
    ///
    /// `sink` receives released text tagged by section, in order. The
    /// returned response keeps the thinking section and the delimiter;
    /// it is also what history records. Engine failures never escape:
    /// they become answer text, except a failed load, which returns
    /// [`MODEL_NOT_LOADED`] and leaves history untouched.
    pub fn run(&self, message: &str, sink: &mut dyn FnMut(Phase, &str), cancel: &CancellationToken) -> String {
        if !self.engine.is_loaded(&self.model) {
            if let Err(err) = self.engine.load(&self.model) {
                tracing::warn!(model = %self.model, %err, "chat model failed to load");
                return MODEL_NOT_LOADED.to_string();
            }
        }

        let prompt = {
            let history = self.history.lock();
            self.templates
                .chat_prompt(history.recent(self.config.context_turns), message)
        };

        let mut state = StreamState::new(&self.templates, self.config.thinking_budget);
        let request = InferenceRequest::new(&self.model, &prompt, self.config.max_tokens);
        let outcome = self.engine.infer(
            &request,
            &mut |chunk| state.on_chunk(chunk, cancel, sink),
            Some(cancel),
        );
        state.finish(sink);

        let failed = match outcome {
            Ok(_) => false,
            Err(err) => {
                tracing::warn!(%err, "generation failed mid-stream");
                state.fail(&err, sink);
                true
            }
        };

        let cancelled = cancel.is_cancelled() && !state.exceeded;
        if cancelled {
            tracing::info!(generated = state.response.len(), "exchange cancelled");
        } else if !failed && !state.parser.has_answer() {
            let closed = state.parser.saw_delimiter();
            self.continue_answer(&prompt, &mut state, closed, sink, cancel);
        }

        let response = state.response;
        self.history.lock().append_exchange(message, &response);
        tracing::debug!(
            thinking_chunks = state.thinking_chunks,
            response_len = response.len(),
            "exchange complete"
        );
        response
    }

    /// Ask once more, primed with everything produced so far, for the
    /// answer the first pass never gave.
    fn continue_answer(
        &self,
        prompt: &str,
        state: &mut StreamState,
        closed: bool,
        sink: &mut dyn FnMut(Phase, &str),
        cancel: &CancellationToken,
    ) {
        if !closed {
            state.response.push_str(&self.templates.forced_close());
        }
        let primed = self.templates.continuation_prompt(prompt, &state.response);
        tracing::info!(closed, "answer missing; requesting continuation");

        let request = InferenceRequest::new(&self.model, &primed, self.config.max_tokens);
        match self
            .engine
            .infer(&request, &mut |chunk| sink(Phase::Answer, chunk), Some(cancel))
        {
            Ok(text) => state.response.push_str(&text),
            Err(err) => {
                tracing::warn!(%err, "continuation failed");
                state.fail(&err, sink);
            }
        }
    }
}
