//! Conversation history: the ordered list of completed turns.

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Who spoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person at the keyboard.
    User,
    /// The model.
    Assistant,
}

impl Role {
    /// Lower-case label, as stored on disk.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One immutable turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Speaker.
    pub role: Role,
    /// Full text. Assistant turns keep their thinking section.
    pub content: String,
}

impl ConversationTurn {
    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// History shared between the generation worker and the UI.
pub type SharedHistory = Arc<Mutex<ConversationHistory>>;

/// Append-only list of turns, optionally mirrored to persistence.
///
/// Turns only ever enter in (User, Assistant) pairs through
/// [`append_exchange`](Self::append_exchange), so the history never holds
/// an unanswered user turn.
#[derive(Debug, Default)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
    mirror: Option<Sender<ConversationTurn>>,
}

impl ConversationHistory {
    /// Empty, unmirrored history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty history whose appends are forwarded to `mirror`.
    pub const fn mirrored(mirror: Sender<ConversationTurn>) -> Self {
        Self {
            turns: Vec::new(),
            mirror: Some(mirror),
        }
    }

    /// Wrap for sharing across threads.
    pub fn shared(self) -> SharedHistory {
        Arc::new(Mutex::new(self))
    }

    /// Record a completed exchange.
    pub fn append_exchange(&mut self, message: &str, response: &str) {
        for turn in [ConversationTurn::user(message), ConversationTurn::assistant(response)] {
            if let Some(mirror) = &self.mirror {
                // Unbounded channel: never blocks. A closed channel only
                // means persistence has shut down.
                if mirror.send(turn.clone()).is_err() {
                    tracing::warn!("persistence channel closed; turn not saved");
                }
            }
            self.turns.push(turn);
        }
    }

    /// Seed with turns from a previous session without mirroring them again.
    ///
    /// Only whole exchanges are kept (see [`whole_exchanges`]). Returns the
    /// number of turns restored.
    pub fn restore(&mut self, turns: impl IntoIterator<Item = ConversationTurn>) -> usize {
        let turns = whole_exchanges(turns);
        let restored = turns.len();
        self.turns.extend(turns);
        restored
    }

    /// All turns in order.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// The last `limit` turns.
    pub fn recent(&self, limit: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(limit);
        &self.turns[start..]
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turns were recorded.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Forget every turn. Persisted turns are untouched.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// Keep only (User, Assistant) pairs, in order.
///
/// A stored session can be torn: a crash between the two writes, or a failed
/// assistant write, leaves a user turn with no answer. Assistant turns with
/// no preceding user turn and user turns with no answer are dropped.
pub fn whole_exchanges(turns: impl IntoIterator<Item = ConversationTurn>) -> Vec<ConversationTurn> {
    let mut out = Vec::new();
    let mut pending: Option<ConversationTurn> = None;
    for turn in turns {
        match turn.role {
            Role::User => pending = Some(turn),
            Role::Assistant => {
                if let Some(user) = pending.take() {
                    out.push(user);
                    out.push(turn);
                }
            }
        }
    }
    out
}
