//! Turn persistence.
//!
//! Each run of the program writes one session file of JSON lines:
//!
//! ```text
//! <sessions_dir>/session_1730000000.jsonl
//! {"session_id":"session_1730000000","timestamp":1730000012,"role":"user","content":"hi"}
//! {"session_id":"session_1730000000","timestamp":1730000015,"role":"assistant","content":"..."}
//! ```
//!
//! Writes happen on a dedicated thread ([`PersistenceActor`]) so an exchange
//! never waits on the disk. Failures are logged and dropped.

use super::history::{whole_exchanges, ConversationTurn, Role};
use crate::error::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

const SESSION_PREFIX: &str = "session_";
const SESSION_EXT: &str = "jsonl";

/// Somewhere turns can be appended to and read back from.
pub trait TurnStore: Send {
    /// Append one turn.
    fn append_turn(&mut self, role: Role, content: &str) -> Result<()>;

    /// At most `limit` of the newest stored turns, oldest first, as whole
    /// (User, Assistant) exchanges.
    fn read_recent(&self, limit: usize) -> Result<Vec<ConversationTurn>>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredTurn {
    session_id: String,
    timestamp: u64,
    role: Role,
    content: String,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

/// A JSON-lines session file.
#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
    session_id: String,
}

impl JsonlStore {
    /// Start a new session file in `dir`, creating the directory if needed.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let mut stamp = unix_now();
        // Two runs within the same second must not share a file.
        let path = loop {
            let candidate = dir.join(format!("{SESSION_PREFIX}{stamp}.{SESSION_EXT}"));
            if !candidate.exists() {
                break candidate;
            }
            stamp += 1;
        };
        Ok(Self::open(path))
    }

    /// Use an existing (or not yet existing) session file.
    pub fn open(path: PathBuf) -> Self {
        let session_id = path
            .file_stem()
            .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned());
        Self { path, session_id }
    }

    /// Every session file in `dir`, newest first.
    ///
    /// Files are named by start time; anything else in the directory is
    /// ignored.
    pub fn list(dir: &Path) -> Result<Vec<Self>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut sessions: Vec<(u64, PathBuf)> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SESSION_EXT) {
                continue;
            }
            let stamp = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.strip_prefix(SESSION_PREFIX))
                .and_then(|stamp| stamp.parse::<u64>().ok());
            if let Some(stamp) = stamp {
                sessions.push((stamp, path));
            }
        }
        sessions.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        Ok(sessions.into_iter().map(|(_, path)| Self::open(path)).collect())
    }

    /// The most recent session file in `dir`, if any.
    pub fn latest(dir: &Path) -> Result<Option<Self>> {
        Ok(Self::list(dir)?.into_iter().next())
    }

    /// Path of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier written into every record.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl TurnStore for JsonlStore {
    fn append_turn(&mut self, role: Role, content: &str) -> Result<()> {
        let record = StoredTurn {
            session_id: self.session_id.clone(),
            timestamp: unix_now(),
            role,
            content: content.to_string(),
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn read_recent(&self, limit: usize) -> Result<Vec<ConversationTurn>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let mut turns = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredTurn>(&line) {
                Ok(record) => turns.push(ConversationTurn {
                    role: record.role,
                    content: record.content,
                }),
                // A torn final line from a crash should not lose the rest.
                Err(err) => tracing::warn!(path = %self.path.display(), %err, "skipping bad record"),
            }
        }
        let mut turns = whole_exchanges(turns);
        let start = turns.len().saturating_sub(limit - limit % 2);
        Ok(turns.split_off(start))
    }
}

/// Background writer that drains turns into a [`TurnStore`].
pub struct PersistenceActor {
    handle: Option<JoinHandle<()>>,
    turn_tx: Option<Sender<ConversationTurn>>,
}

impl PersistenceActor {
    /// Spawn the writer thread.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to spawn the thread.
    pub fn spawn(store: Box<dyn TurnStore>) -> Self {
        let (turn_tx, turn_rx) = unbounded();

        let handle = thread::Builder::new()
            .name("reverie-persist".to_string())
            .spawn(move || Self::run_loop(store, &turn_rx))
            .expect("Failed to spawn persistence thread");

        Self {
            handle: Some(handle),
            turn_tx: Some(turn_tx),
        }
    }

    /// Sender to hand to [`ConversationHistory::mirrored`](super::ConversationHistory::mirrored).
    pub fn sender(&self) -> Option<Sender<ConversationTurn>> {
        self.turn_tx.clone()
    }

    /// Flush outstanding turns and stop.
    ///
    /// The thread exits once every sender, including the ones handed out,
    /// has been dropped.
    pub fn join(mut self) {
        self.turn_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn run_loop(mut store: Box<dyn TurnStore>, turn_rx: &Receiver<ConversationTurn>) {
        for turn in turn_rx {
            if let Err(err) = store.append_turn(turn.role, &turn.content) {
                tracing::warn!(role = turn.role.as_str(), %err, "failed to persist turn");
            }
        }
        tracing::debug!("persistence actor stopped");
    }
}
