//! Generation worker: runs one request at a time off the main thread.
//!
//! The main loop stays responsive while a model streams. Only one
//! generation may be in flight; a second submission is rejected with
//! [`Error::Busy`] instead of interleaving two exchanges in the history.

use super::messages::AppEvent;
use crate::engine::CancellationToken;
use crate::error::{Error, Result};
use crate::pipeline::Orchestrator;
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

struct Running {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Sends [`AppEvent::Complete`] when dropped, so the main loop hears about
/// the end of a request even if the workflow panics.
struct CompleteOnDrop(Sender<AppEvent>);

impl Drop for CompleteOnDrop {
    fn drop(&mut self) {
        let _ = self.0.send(AppEvent::Complete);
    }
}

/// Owner of the in-flight generation thread.
pub struct GenerationWorker {
    orchestrator: Arc<Orchestrator>,
    events: Sender<AppEvent>,
    running: Option<Running>,
}

impl GenerationWorker {
    /// Worker that reports on `events`.
    pub fn new(orchestrator: Arc<Orchestrator>, events: Sender<AppEvent>) -> Self {
        Self {
            orchestrator,
            events,
            running: None,
        }
    }

    /// Whether a request has been submitted and not yet reaped.
    #[inline]
    pub const fn is_busy(&self) -> bool {
        self.running.is_some()
    }

    /// Start processing `request` on a fresh thread with a fresh token.
    ///
    /// # Errors
    ///
    /// [`Error::Busy`] while a previous request is still running, or
    /// [`Error::Io`] if the thread cannot be spawned.
    pub fn submit(&mut self, request: String) -> Result<()> {
        if self.is_busy() {
            return Err(Error::Busy);
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let orchestrator = Arc::clone(&self.orchestrator);
        let events = self.events.clone();

        let handle = thread::Builder::new()
            .name("reverie-worker".to_string())
            .spawn(move || {
                let _complete = CompleteOnDrop(events.clone());
                orchestrator.process(&request, &events, &token);
            })?;

        self.running = Some(Running { handle, cancel });
        Ok(())
    }

    /// Ask the running request to stop. Returns `false` when idle.
    pub fn cancel(&self) -> bool {
        match &self.running {
            Some(running) => {
                running.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Join the finished thread. Call on [`AppEvent::Complete`].
    pub fn reap(&mut self) {
        if let Some(running) = self.running.take() {
            if running.handle.join().is_err() {
                tracing::error!("generation thread panicked");
            }
        }
    }

    /// Cancel whatever is running and wait for it.
    pub fn cancel_and_join(&mut self) {
        self.cancel();
        self.reap();
    }
}

impl Drop for GenerationWorker {
    fn drop(&mut self) {
        self.cancel_and_join();
    }
}
