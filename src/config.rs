//! Configuration: a TOML file with every field defaulted.
//!
//! ```toml
//! [engine]
//! base_url = "http://127.0.0.1:11434"
//! chat_model = "qwen3:1.7b"
//!
//! [session]
//! thinking_budget = 1000
//! ```

use crate::error::Result;
use crate::session::PromptTemplates;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `engine.base_url`.
pub const BASE_URL_ENV: &str = "OLLAMA_BASE_URL";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inference server settings.
    pub engine: EngineConfig,
    /// Per-exchange generation limits.
    pub session: SessionConfig,
    /// Prompt templates.
    pub prompts: PromptTemplates,
    /// Terminal UI settings.
    pub ui: UiConfig,
    /// Conversation persistence.
    pub history: HistoryConfig,
}

/// Inference server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ollama server URL.
    pub base_url: String,
    /// Thinking model used for chat.
    pub chat_model: String,
    /// Small model used for intent classification.
    pub router_model: String,
    /// Timeout for non-streaming requests such as model loads.
    pub request_timeout_secs: u64,
    /// How long the server keeps a model in memory; `-1` means forever.
    pub keep_alive: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            chat_model: "qwen3:1.7b".to_string(),
            router_model: "qwen3:0.6b".to_string(),
            request_timeout_secs: 120,
            keep_alive: -1,
        }
    }
}

/// Per-exchange generation limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Thinking chunks allowed before the reasoning is cut off.
    pub thinking_budget: usize,
    /// Token cap for chat generations.
    pub max_tokens: u32,
    /// Token cap for the classifier.
    pub classify_max_tokens: u32,
    /// Prior turns included in the chat prompt.
    pub context_turns: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            thinking_budget: 1000,
            max_tokens: 2048,
            classify_max_tokens: 10,
            context_turns: 6,
        }
    }
}

/// Terminal UI settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Spinner frame interval in milliseconds.
    pub tick_ms: u64,
    /// Input poll timeout in milliseconds.
    pub input_poll_ms: u64,
    /// Capture the mouse for wheel scrolling.
    pub enable_mouse: bool,
    /// Draw on the alternate screen.
    pub alternate_screen: bool,
    /// Message lines kept in scrollback.
    pub max_messages: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            input_poll_ms: 10,
            enable_mouse: true,
            alternate_screen: true,
            max_messages: 10_000,
        }
    }
}

impl UiConfig {
    /// Spinner frame interval.
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Input poll timeout.
    pub const fn input_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms)
    }
}

/// Conversation persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Mirror turns to disk.
    pub enabled: bool,
    /// Where session files live; defaults to the platform data directory.
    pub sessions_dir: Option<PathBuf>,
    /// Turns restored from the latest session at startup (0 = start fresh).
    pub resume_recent: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sessions_dir: None,
            resume_recent: 0,
        }
    }
}

impl HistoryConfig {
    /// Resolved sessions directory.
    pub fn sessions_dir(&self) -> PathBuf {
        self.sessions_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("reverie")
                .join("sessions")
        })
    }
}

impl Config {
    /// Default config file location, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("reverie").join("config.toml"))
    }

    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from `path`, or from the default location if it exists, or fall
    /// back to defaults. The base URL environment override is applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    tracing::info!(path = %path.display(), "loading config");
                    Self::from_toml(&std::fs::read_to_string(path)?)?
                }
                None => Self::default(),
            },
        };

        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.engine.base_url = url;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [engine]
            chat_model = "deepseek-r1:1.5b"

            [session]
            thinking_budget = 250

            [ui]
            enable_mouse = false
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.chat_model, "deepseek-r1:1.5b");
        assert_eq!(config.engine.base_url, "http://127.0.0.1:11434");
        assert_eq!(config.session.thinking_budget, 250);
        assert_eq!(config.session.max_tokens, 2048);
        assert!(!config.ui.enable_mouse);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Config::from_toml("[session]\nthinking_budget = \"lots\"").unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[history]\nenabled = false\nresume_recent = 4\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(!config.history.enabled);
        assert_eq!(config.history.resume_recent, 4);
    }

    #[test]
    fn test_explicit_sessions_dir() {
        let history = HistoryConfig {
            sessions_dir: Some(PathBuf::from("/tmp/reverie-sessions")),
            ..HistoryConfig::default()
        };
        assert_eq!(history.sessions_dir(), PathBuf::from("/tmp/reverie-sessions"));
    }
}
