//! Chat exchanges and the conversation they build up.
//!
//! - [`ChatSession`]: runs one exchange end to end
//! - [`ConversationHistory`]: the turns so far, shared with the UI
//! - [`JsonlStore`] and [`PersistenceActor`]: session files on disk
//! - [`PromptTemplates`]: every string the model sees

mod chat;
mod history;
mod prompt;
mod store;

pub use chat::{ChatSession, MODEL_NOT_LOADED, THINKING_LIMIT_NOTICE};
pub use history::{ConversationHistory, ConversationTurn, Role, SharedHistory};
pub use prompt::PromptTemplates;
pub use store::{JsonlStore, PersistenceActor, TurnStore};
