//! Slash commands, handled locally before anything reaches a model.

use crate::session::{JsonlStore, PromptTemplates, Role, SharedHistory, TurnStore};
use std::path::PathBuf;

const DEFAULT_HISTORY_LIMIT: usize = 10;

const HELP: &str = "\
reverie: a local assistant that shows its thinking.

Commands:
  /help          Show this message
  /history [n]   Show the last n messages (default 10)
  /clear         Clear this session's history and screen
  /sessions      List saved sessions
  /load <n>      Load session n from the /sessions list
  /quit          Exit

Keys:
  Enter          Send            Esc            Stop the current answer
  Up/Down        Previous input  t (empty line) Show/hide thinking
  PgUp/PgDn      Scroll 10       Ctrl+Up/Down   Scroll 1
  Ctrl+Home/End  Top/bottom      Ctrl+C         Exit";

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/help`
    Help,
    /// `/history [n]`
    History(usize),
    /// `/clear`
    Clear,
    /// `/sessions`
    Sessions,
    /// `/load <n>`; `None` when the argument is missing or not a number.
    Load(Option<usize>),
    /// `/quit` or `/exit`
    Quit,
    /// Anything else starting with `/`.
    Unknown(String),
}

impl Command {
    /// Parse `input`. Returns `None` when it is not a command at all.
    pub fn parse(input: &str) -> Option<Self> {
        let body = input.trim().strip_prefix('/')?;
        let mut words = body.split_whitespace();
        let name = words.next().unwrap_or_default();
        let arg = words.next();

        Some(match name {
            "help" | "?" => Self::Help,
            "history" => Self::History(
                arg.and_then(|n| n.parse().ok())
                    .unwrap_or(DEFAULT_HISTORY_LIMIT),
            ),
            "clear" | "clear-history" => Self::Clear,
            "sessions" => Self::Sessions,
            "load" => Self::Load(arg.and_then(|n| n.parse().ok())),
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        })
    }

    /// Whether running it would change conversation history.
    pub const fn mutates_history(&self) -> bool {
        matches!(self, Self::Clear | Self::Load(_))
    }
}

/// What the main loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Show these lines.
    Reply(String),
    /// Wipe the message log, then show these lines.
    ClearThen(String),
    /// Leave the application.
    Quit,
}

/// Executes commands against the shared history and the sessions directory.
pub struct CommandHandler {
    history: SharedHistory,
    templates: PromptTemplates,
    sessions_dir: Option<PathBuf>,
    current_session: Option<String>,
    /// The last `/sessions` listing, so `/load <n>` refers to what was shown.
    listing: Vec<JsonlStore>,
}

impl CommandHandler {
    /// Handler over `history`. Without a sessions directory, the session
    /// commands report that persistence is off.
    pub const fn new(
        history: SharedHistory,
        templates: PromptTemplates,
        sessions_dir: Option<PathBuf>,
        current_session: Option<String>,
    ) -> Self {
        Self {
            history,
            templates,
            sessions_dir,
            current_session,
            listing: Vec::new(),
        }
    }

    /// Run a parsed command.
    pub fn execute(&mut self, command: Command) -> CommandOutcome {
        match command {
            Command::Help => CommandOutcome::Reply(HELP.to_string()),
            Command::History(limit) => CommandOutcome::Reply(self.history_text(limit)),
            Command::Clear => {
                self.history.lock().clear();
                tracing::info!("history cleared");
                CommandOutcome::ClearThen("[Chat history cleared for this session]".to_string())
            }
            Command::Sessions => CommandOutcome::Reply(self.sessions_text()),
            Command::Load(index) => self.load(index),
            Command::Quit => CommandOutcome::Quit,
            Command::Unknown(name) => {
                CommandOutcome::Reply(format!("Error: unknown command /{name} (try /help)"))
            }
        }
    }

    fn history_text(&self, limit: usize) -> String {
        let history = self.history.lock();
        let turns = history.recent(limit);
        if turns.is_empty() {
            return "No chat history available.".to_string();
        }
        let mut out = format!("Chat History (last {} messages):", turns.len());
        for turn in turns {
            let content = match turn.role {
                Role::User => turn.content.as_str(),
                Role::Assistant => self.templates.answer_part(&turn.content).trim(),
            };
            out.push_str(&format!("\n  {}: {content}", turn.role.as_str()));
        }
        out
    }

    fn sessions_text(&mut self) -> String {
        let Some(dir) = &self.sessions_dir else {
            return "Error: session history is disabled".to_string();
        };
        self.listing = match JsonlStore::list(dir) {
            Ok(listing) => listing,
            Err(err) => return format!("Error: cannot read {}: {err}", dir.display()),
        };
        if self.listing.is_empty() {
            return "No saved sessions.".to_string();
        }

        let mut out = "Saved sessions:".to_string();
        for (i, store) in self.listing.iter().enumerate() {
            let marker = if self.current_session.as_deref() == Some(store.session_id()) {
                "*"
            } else {
                " "
            };
            out.push_str(&format!("\n{marker} [{}] {}", i + 1, store.session_id()));
        }
        out
    }

    fn load(&mut self, index: Option<usize>) -> CommandOutcome {
        let Some(index) = index else {
            return CommandOutcome::Reply("Usage: /load <n> (run /sessions first)".to_string());
        };
        if self.listing.is_empty() && self.sessions_dir.is_some() {
            let _ = self.sessions_text();
        }
        let Some(store) = index.checked_sub(1).and_then(|i| self.listing.get(i)) else {
            return CommandOutcome::Reply(
                "Error: no such session; run /sessions to see the list".to_string(),
            );
        };

        let turns = match store.read_recent(usize::MAX) {
            Ok(turns) => turns,
            Err(err) => {
                return CommandOutcome::Reply(format!("Error: failed to load {}: {err}", store.session_id()))
            }
        };
        tracing::info!(session = store.session_id(), turns = turns.len(), "session loaded");

        let mut out = format!("[Session loaded: {}]", store.session_id());
        for turn in &turns {
            match turn.role {
                Role::User => out.push_str(&format!("\n> {}", turn.content)),
                Role::Assistant => {
                    out.push('\n');
                    out.push_str(self.templates.answer_part(&turn.content).trim());
                }
            }
        }

        let mut history = self.history.lock();
        history.clear();
        history.restore(turns);
        CommandOutcome::ClearThen(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ConversationHistory;

    fn handler(dir: Option<PathBuf>) -> CommandHandler {
        CommandHandler::new(
            ConversationHistory::new().shared(),
            PromptTemplates::default(),
            dir,
            None,
        )
    }

    #[test]
    fn test_parse() {
        assert_eq!(Command::parse("hello"), None);
        assert_eq!(Command::parse("/help"), Some(Command::Help));
        assert_eq!(Command::parse("/history"), Some(Command::History(10)));
        assert_eq!(Command::parse("/history 3"), Some(Command::History(3)));
        assert_eq!(Command::parse("/history lots"), Some(Command::History(10)));
        assert_eq!(Command::parse("/load 2"), Some(Command::Load(Some(2))));
        assert_eq!(Command::parse("/load"), Some(Command::Load(None)));
        assert_eq!(Command::parse(" /quit "), Some(Command::Quit));
        assert_eq!(Command::parse("/frobnicate"), Some(Command::Unknown("frobnicate".into())));
    }

    #[test]
    fn test_directory_commands_are_unknown() {
        assert_eq!(Command::parse("/cd src"), Some(Command::Unknown("cd".into())));
        assert_eq!(Command::parse("/ls"), Some(Command::Unknown("ls".into())));
    }

    #[test]
    fn test_history_shows_answers_only() {
        let mut h = handler(None);
        h.history.lock().append_exchange("2+2?", "adding</think>\n4");

        let CommandOutcome::Reply(text) = h.execute(Command::History(10)) else {
            panic!("expected reply");
        };
        assert!(text.starts_with("Chat History (last 2 messages):"));
        assert!(text.contains("user: 2+2?"));
        assert!(text.contains("assistant: 4"));
        assert!(!text.contains("adding"));
    }

    #[test]
    fn test_empty_history() {
        let mut h = handler(None);
        assert_eq!(
            h.execute(Command::History(5)),
            CommandOutcome::Reply("No chat history available.".into())
        );
    }

    #[test]
    fn test_clear() {
        let mut h = handler(None);
        h.history.lock().append_exchange("a", "b");
        assert!(matches!(h.execute(Command::Clear), CommandOutcome::ClearThen(_)));
        assert!(h.history.lock().is_empty());
    }

    #[test]
    fn test_sessions_disabled() {
        let mut h = handler(None);
        let CommandOutcome::Reply(text) = h.execute(Command::Sessions) else {
            panic!("expected reply");
        };
        assert!(text.starts_with("Error:"));
    }

    #[test]
    fn test_sessions_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut old = JsonlStore::open(dir.path().join("session_100.jsonl"));
        old.append_turn(Role::User, "old question").unwrap();
        old.append_turn(Role::Assistant, "pondering</think>\nold answer").unwrap();
        std::fs::write(dir.path().join("session_200.jsonl"), "").unwrap();

        let mut h = CommandHandler::new(
            ConversationHistory::new().shared(),
            PromptTemplates::default(),
            Some(dir.path().to_path_buf()),
            Some("session_200".into()),
        );

        let CommandOutcome::Reply(listing) = h.execute(Command::Sessions) else {
            panic!("expected reply");
        };
        assert!(listing.contains("* [1] session_200"));
        assert!(listing.contains("  [2] session_100"));

        let CommandOutcome::ClearThen(replay) = h.execute(Command::Load(Some(2))) else {
            panic!("expected replay");
        };
        assert!(replay.contains("> old question"));
        assert!(replay.contains("old answer"));
        assert!(!replay.contains("pondering"));
        assert_eq!(h.history.lock().len(), 2);
    }

    #[test]
    fn test_load_skips_torn_exchange() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("session_300.jsonl"),
            concat!(
                "{\"session_id\":\"session_300\",\"timestamp\":1,\"role\":\"user\",\"content\":\"q\"}\n",
                "{\"session_id\":\"session_300\",\"timestamp\":2,\"role\":\"assistant\",\"cont",
            ),
        )
        .unwrap();
        let mut h = handler(Some(dir.path().to_path_buf()));

        let CommandOutcome::Reply(listing) = h.execute(Command::Sessions) else {
            panic!("expected reply");
        };
        assert!(listing.contains("[1] session_300"));
        let CommandOutcome::ClearThen(replay) = h.execute(Command::Load(Some(1))) else {
            panic!("expected replay");
        };
        assert!(!replay.contains("> q"));
        assert!(h.history.lock().is_empty());
    }

    #[test]
    fn test_load_bad_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = handler(Some(dir.path().to_path_buf()));
        let CommandOutcome::Reply(text) = h.execute(Command::Load(Some(4))) else {
            panic!("expected reply");
        };
        assert!(text.starts_with("Error:"));
        assert!(matches!(h.execute(Command::Load(None)), CommandOutcome::Reply(t) if t.starts_with("Usage")));
    }

    #[test]
    fn test_unknown_is_error_line() {
        let mut h = handler(None);
        let CommandOutcome::Reply(text) = h.execute(Command::Unknown("x".into())) else {
            panic!("expected reply");
        };
        assert!(text.starts_with("Error: unknown command /x"));
    }

    #[test]
    fn test_mutating_commands() {
        assert!(Command::Clear.mutates_history());
        assert!(Command::Load(Some(1)).mutates_history());
        assert!(!Command::History(3).mutates_history());
    }
}
