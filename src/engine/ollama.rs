//! Ollama backend.
//!
//! Talks to a local Ollama server over its `/api/generate` endpoint in raw
//! mode, so the prompt template is ours and not the model's. Responses
//! stream as newline-delimited JSON, one object per generated token; the
//! cancellation token is checked between objects.

use super::{CancellationToken, InferenceEngine, InferenceRequest};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    raw: bool,
    stream: bool,
    keep_alive: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

/// One line of a streaming `/api/generate` response.
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Engine backed by a local Ollama server.
pub struct OllamaEngine {
    http: Client,
    base_url: String,
    keep_alive: i64,
    request_timeout: Duration,
    loaded: Mutex<HashSet<String>>,
}

impl OllamaEngine {
    /// Build an engine for the server described by `config`.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        // No overall timeout: a streamed generation can legitimately run
        // for minutes. Loads get a per-request timeout instead.
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(None::<Duration>)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            keep_alive: config.keep_alive,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            loaded: Mutex::new(HashSet::new()),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        let message = serde_json::from_str::<GenerateChunk>(&body)
            .ok()
            .and_then(|chunk| chunk.error)
            .unwrap_or(body);
        Err(Error::Engine(format!("ollama returned {status}: {message}")))
    }
}

/// Parse one NDJSON line. Blank lines yield `None`.
fn parse_line(line: &str) -> Result<Option<GenerateChunk>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let chunk: GenerateChunk = serde_json::from_str(line)?;
    if let Some(error) = chunk.error {
        return Err(Error::Engine(error));
    }
    Ok(Some(chunk))
}

impl InferenceEngine for OllamaEngine {
    fn load(&self, model: &str) -> Result<()> {
        if self.is_loaded(model) {
            return Ok(());
        }

        // A generate call without a prompt loads the model and returns.
        let body = GenerateRequest {
            model,
            prompt: None,
            raw: false,
            stream: false,
            keep_alive: self.keep_alive,
            format: None,
            options: None,
        };
        tracing::info!(model, base_url = %self.base_url, "loading model");
        let response = self
            .http
            .post(self.generate_url())
            .timeout(self.request_timeout)
            .json(&body)
            .send()?;
        Self::check_status(response)?;

        self.loaded.lock().insert(model.to_string());
        tracing::info!(model, "model resident");
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
        if !self.is_loaded(request.model) {
            return Err(Error::ModelNotLoaded(request.model.to_string()));
        }

        let body = GenerateRequest {
            model: request.model,
            prompt: Some(request.prompt),
            raw: true,
            stream: true,
            keep_alive: self.keep_alive,
            format: request.grammar.map(super::Grammar::to_json_schema),
            options: Some(GenerateOptions {
                num_predict: request.max_tokens,
            }),
        };

        tracing::debug!(
            model = request.model,
            prompt_len = request.prompt.len(),
            max_tokens = request.max_tokens,
            constrained = request.grammar.is_some(),
            "starting generation"
        );

        let response = self.http.post(self.generate_url()).json(&body).send()?;
        let reader = BufReader::new(Self::check_status(response)?);

        let mut output = String::new();
        for line in reader.lines() {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                // Dropping the response closes the connection, which stops
                // generation server-side.
                tracing::debug!(generated = output.len(), "generation cancelled");
                break;
            }

            let Some(chunk) = parse_line(&line?)? else {
                continue;
            };
            if !chunk.response.is_empty() {
                on_chunk(&chunk.response);
                output.push_str(&chunk.response);
            }
            if chunk.done {
                break;
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_line() {
        let chunk = parse_line(r#"{"model":"qwen3","response":"Hel","done":false}"#)
            .unwrap()
            .unwrap();
        assert_eq!(chunk.response, "Hel");
        assert!(!chunk.done);
    }

    #[test]
    fn test_parse_final_line() {
        let chunk = parse_line(r#"{"response":"","done":true,"eval_count":12}"#)
            .unwrap()
            .unwrap();
        assert!(chunk.done);
        assert!(chunk.response.is_empty());
    }

    #[test]
    fn test_parse_blank_line() {
        assert!(parse_line("   ").unwrap().is_none());
    }

    #[test]
    fn test_parse_error_line() {
        let err = parse_line(r#"{"error":"model 'nope' not found"}"#).unwrap_err();
        assert!(matches!(err, Error::Engine(msg) if msg.contains("not found")));
    }

    #[test]
    fn test_request_serialization() {
        let grammar = super::super::Grammar::one_of(["CODE", "CHAT"]);
        let body = GenerateRequest {
            model: "qwen3",
            prompt: Some("hi"),
            raw: true,
            stream: true,
            keep_alive: -1,
            format: Some(grammar.to_json_schema()),
            options: Some(GenerateOptions { num_predict: 10 }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["raw"], true);
        assert_eq!(json["keep_alive"], -1);
        assert_eq!(json["options"]["num_predict"], 10);
        assert_eq!(json["format"]["enum"][0], "CODE");
    }

    #[test]
    fn test_load_request_omits_prompt() {
        let body = GenerateRequest {
            model: "qwen3",
            prompt: None,
            raw: false,
            stream: false,
            keep_alive: -1,
            format: None,
            options: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("prompt").is_none());
        assert!(json.get("format").is_none());
    }

    #[test]
    fn test_infer_requires_load() {
        let engine = OllamaEngine::new(&EngineConfig::default()).unwrap();
        let err = engine
            .infer(&InferenceRequest::new("qwen3", "hi", 4), &mut |_| {}, None)
            .unwrap_err();
        assert!(matches!(err, Error::ModelNotLoaded(_)));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = EngineConfig {
            base_url: "http://localhost:11434/".to_string(),
            ..EngineConfig::default()
        };
        let engine = OllamaEngine::new(&config).unwrap();
        assert_eq!(engine.generate_url(), "http://localhost:11434/api/generate");
    }
}
