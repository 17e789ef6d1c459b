//! Error types shared across the crate.

use thiserror::Error;

/// Convenient alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between the keyboard and the model.
#[derive(Debug, Error)]
pub enum Error {
    /// The inference engine rejected or failed a request.
    #[error("engine error: {0}")]
    Engine(String),

    /// A generation was requested for a model that could not be loaded.
    #[error("model not loaded: {0}")]
    ModelNotLoaded(String),

    /// Transport failure talking to the inference server.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem or terminal I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON on the wire or on disk.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// A generation is already in flight for this session.
    #[error("a response is still streaming; press Esc to cancel it first")]
    Busy,
}
