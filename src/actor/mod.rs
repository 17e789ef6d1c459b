//! Actor model: message-passing concurrency for the terminal front end.
//!
//! Each actor owns one thread and talks to the main loop over crossbeam
//! channels:
//! - **Input actor**: polls terminal events and forwards them
//! - **Ticker actor**: paces the spinner
//! - **Generation worker**: classifies and streams one request at a time
//! - **Renderer actor**: owns stdout, diffs and flushes screens
//! - **Main loop** ([`crate::app`]): owns the view and decides everything
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     InputEvent      ┌──────────────┐    RenderCommand   ┌───────────────┐
//! │ Input Thread │ ─────────────────▶  │              │ ─────────────────▶ │ Render Thread │
//! └──────────────┘                     │  Main Loop   │                    └───────────────┘
//! ┌──────────────┐        Tick         │              │
//! │ Ticker       │ ─────────────────▶  │              │
//! └──────────────┘                     └──────────────┘
//!                                         │       ▲
//!                               submit /  │       │ AppEvent
//!                               cancel    ▼       │
//!                                      ┌──────────────┐
//!                                      │ Worker       │ ──▶ Orchestrator ──▶ engine
//!                                      └──────────────┘
//! ```

mod input;
mod messages;
mod renderer;
mod ticker;
mod worker;

pub use input::InputActor;
pub use messages::{AppEvent, InputEvent, KeyCode, KeyModifiers, RenderCommand, Screen};
pub use renderer::RendererActor;
pub use ticker::{Tick, TickerActor};
pub use worker::GenerationWorker;
