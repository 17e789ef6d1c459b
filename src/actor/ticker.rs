//! Ticker actor: drives the spinner at a fixed interval.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// One spinner step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Monotonic frame number.
    pub frame: u64,
}

/// Ticker thread handle.
pub struct TickerActor {
    handle: Option<JoinHandle<()>>,
    stop_tx: Option<Sender<()>>,
    tick_rx: Receiver<Tick>,
}

impl TickerActor {
    /// Spawn a ticker firing every `interval`.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to spawn the thread.
    pub fn spawn(interval: Duration) -> Self {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        // Two slots: a slow main loop skips frames instead of queueing them.
        let (tick_tx, tick_rx) = bounded(2);

        let handle = thread::Builder::new()
            .name("reverie-ticker".to_string())
            .spawn(move || Self::run_loop(&tick_tx, &stop_rx, interval))
            .expect("Failed to spawn ticker thread");

        Self {
            handle: Some(handle),
            stop_tx: Some(stop_tx),
            tick_rx,
        }
    }

    /// Tick receiver, for `select!`.
    #[inline]
    pub const fn receiver(&self) -> &Receiver<Tick> {
        &self.tick_rx
    }

    /// Stop and wait for the thread.
    pub fn join(mut self) {
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn run_loop(tick_tx: &Sender<Tick>, stop_rx: &Receiver<()>, interval: Duration) {
        let mut frame = 0u64;
        // The stop channel never carries a message; it wakes us by
        // disconnecting when the handle drops its sender.
        while let Err(RecvTimeoutError::Timeout) = stop_rx.recv_timeout(interval) {
            let _ = tick_tx.try_send(Tick { frame });
            frame += 1;
        }
    }
}

impl Drop for TickerActor {
    fn drop(&mut self) {
        self.stop_tx.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_in_order() {
        let ticker = TickerActor::spawn(Duration::from_millis(5));
        let first = ticker.receiver().recv_timeout(Duration::from_secs(1)).unwrap();
        let second = ticker.receiver().recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(first.frame, 0);
        assert!(second.frame > first.frame);
        ticker.join();
    }

    #[test]
    fn test_join_is_prompt() {
        let ticker = TickerActor::spawn(Duration::from_secs(60));
        let started = std::time::Instant::now();
        ticker.join();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
