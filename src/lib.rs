//! # Reverie
//!
//! A local terminal assistant for thinking models.
//!
//! Reverie streams a model's output live while splitting it into the
//! reasoning it does before `</think>` and the answer that follows. A small
//! router model first decides what kind of request it is; chat requests go
//! to a thinking model whose reasoning is capped by a budget, and whose
//! answer is recovered with a second generation if the model never closes
//! its thinking.
//!
//! ## Core Concepts
//!
//! - **Section parser**: chunk-invariant split of a token stream at the
//!   closing delimiter ([`stream`])
//! - **Streaming session**: budget, continuation, history ([`session`])
//! - **Pipeline**: classify, dispatch, commands ([`pipeline`])
//! - **Actor model**: input, ticker, worker, and renderer threads ([`actor`])
//! - **View-model**: sticky scrollback rendered to styled lines ([`view`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use reverie::stream::{Phase, SectionParser};
//!
//! let mut parser = SectionParser::new();
//! let delta = parser.consume("let me see</thi");
//! let rest = parser.consume("nk>\n42");
//! assert_eq!(parser.phase(), Phase::Answer);
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod stream;
pub mod view;

// Re-exports for convenience
pub use config::Config;
pub use engine::{CancellationToken, InferenceEngine, OllamaEngine};
pub use error::{Error, Result};
pub use session::{ChatSession, ConversationHistory};
pub use stream::{Phase, SectionParser};
