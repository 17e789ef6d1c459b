//! Scripted engine for unit tests.

use super::{CancellationToken, Grammar, InferenceEngine, InferenceRequest};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};

/// What the engine does on its next `infer` call.
#[derive(Debug, Clone)]
pub enum Script {
    /// Emit these chunks, one generation step each.
    Chunks(Vec<String>),
    /// Fail with this engine error before producing anything.
    Fail(String),
    /// Emit these chunks, then fail.
    Interrupted(Vec<String>, String),
}

impl Script {
    pub fn chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Chunks(chunks.into_iter().map(Into::into).collect())
    }
}

/// A recorded `infer` call.
#[derive(Debug, Clone)]
pub struct Call {
    pub model: String,
    pub prompt: String,
    pub grammar: Option<Grammar>,
    pub max_tokens: u32,
}

/// Replays scripted outputs in order and records every request.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    scripts: Mutex<VecDeque<Script>>,
    calls: Mutex<Vec<Call>>,
    loaded: Mutex<HashSet<String>>,
    refuse_load: bool,
}

impl ScriptedEngine {
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            ..Self::default()
        }
    }

    /// An engine whose every load fails.
    pub fn unloadable() -> Self {
        Self {
            refuse_load: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl InferenceEngine for ScriptedEngine {
    fn load(&self, model: &str) -> Result<()> {
        if self.refuse_load {
            return Err(Error::Engine(format!("cannot load {model}")));
        }
        self.loaded.lock().insert(model.to_string());
        Ok(())
    }

    fn is_loaded(&self, model: &str) -> bool {
        self.loaded.lock().contains(model)
    }

    fn infer(
        &self,
        request: &InferenceRequest<'_>,
        on_chunk: &mut dyn FnMut(&str),
        cancel: Option<&CancellationToken>,
    ) -> Result<String> {
        self.calls.lock().push(Call {
            model: request.model.to_string(),
            prompt: request.prompt.to_string(),
            grammar: request.grammar.cloned(),
            max_tokens: request.max_tokens,
        });

        let script = self
            .scripts
            .lock()
            .pop_front()
            .ok_or_else(|| Error::Engine("script exhausted".to_string()))?;

        match script {
            Script::Fail(message) => Err(Error::Engine(message)),
            Script::Interrupted(chunks, message) => {
                for chunk in chunks {
                    on_chunk(&chunk);
                }
                Err(Error::Engine(message))
            }
            Script::Chunks(chunks) => {
                let mut output = String::new();
                for chunk in chunks {
                    if cancel.is_some_and(CancellationToken::is_cancelled) {
                        break;
                    }
                    on_chunk(&chunk);
                    output.push_str(&chunk);
                }
                Ok(output)
            }
        }
    }
}

/// Routes every classification to chat, then thinks until cancelled.
#[derive(Debug, Default)]
pub struct EndlessEngine;

impl InferenceEngine for EndlessEngine {
    fn load(&self, _model: &str) -> Result<()> {
        Ok(())
    }

    fn is_loaded(&self, _model: &str) -> bool {
        true
    }

    fn infer(
        &self,
        request: &InferenceRequest<'_>,
        on_chunk: &mut dyn FnMut(&str),
        cancel: Option<&CancellationToken>,
    ) -> Result<String> {
        if request.grammar.is_some() {
            on_chunk("CHAT");
            return Ok("CHAT".to_string());
        }
        let mut output = String::new();
        while !cancel.is_some_and(CancellationToken::is_cancelled) {
            on_chunk("hm ");
            output.push_str("hm ");
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        Ok(output)
    }
}
