//! From user text to a running workflow.
//!
//! ```text
//!  input ─▶ Command::parse ─▶ CommandHandler          (local, main loop)
//!    │
//!    └────▶ Orchestrator ─▶ IntentClassifier ─▶ dispatch ─▶ ChatSession
//!                                                    ├─▶ code placeholder
//!                                                    └─▶ tool placeholder
//! ```

mod classifier;
mod commands;
mod intent;
mod orchestrator;

pub use classifier::IntentClassifier;
pub use commands::{Command, CommandHandler, CommandOutcome};
pub use intent::{dispatch, Intent, WorkflowType};
pub use orchestrator::{Orchestrator, CODE_PLACEHOLDER, TOOL_PLACEHOLDER};
