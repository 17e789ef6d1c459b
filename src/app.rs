//! The interactive application: terminal setup, actors, and the main loop.
//!
//! The main loop is the only writer of the view-model. It selects over
//! three channels (terminal input, worker events, spinner ticks) and sends
//! a finished [`Screen`] to the renderer whenever something changed.

use crate::actor::{
    AppEvent, GenerationWorker, InputActor, InputEvent, KeyCode, KeyModifiers, RenderCommand,
    RendererActor, Screen, TickerActor,
};
use crate::config::{Config, HistoryConfig, UiConfig};
use crate::engine::InferenceEngine;
use crate::error::{Error, Result};
use crate::pipeline::{Command, CommandHandler, CommandOutcome, IntentClassifier, Orchestrator};
use crate::session::{
    ChatSession, ConversationHistory, ConversationTurn, JsonlStore, PersistenceActor,
    SharedHistory, TurnStore,
};
use crate::view::{
    Frame, InputLine, Modifiers, PipelineStage, Rgb, Scrollback, Style, StyledLine,
};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use crossterm::{
    cursor,
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

const PAGE_STEP: usize = 10;
const WHEEL_STEP: usize = 3;

/// Raw mode and screen setup, undone on drop.
pub struct TerminalGuard {
    mouse: bool,
    alternate_screen: bool,
}

impl TerminalGuard {
    /// Put the terminal into raw mode with the features `ui` asks for.
    pub fn enter(ui: &UiConfig) -> Result<Self> {
        terminal::enable_raw_mode()?;
        // From here on, Drop restores whatever was enabled.
        let guard = Self {
            mouse: ui.enable_mouse,
            alternate_screen: ui.alternate_screen,
        };

        let mut stdout = io::stdout();
        if guard.alternate_screen {
            execute!(stdout, EnterAlternateScreen)?;
        }
        if guard.mouse {
            execute!(stdout, EnableMouseCapture)?;
        }
        execute!(stdout, EnableBracketedPaste, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, DisableBracketedPaste, cursor::Show);
        if self.mouse {
            let _ = execute!(stdout, DisableMouseCapture);
        }
        if self.alternate_screen {
            let _ = execute!(stdout, LeaveAlternateScreen);
        }
        let _ = terminal::disable_raw_mode();
    }
}

/// Session files resolved at startup.
struct Sessions {
    dir: PathBuf,
    current: JsonlStore,
    resumed: Vec<ConversationTurn>,
    resumed_from: Option<String>,
}

impl Sessions {
    fn open(config: &HistoryConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        let dir = config.sessions_dir();

        let mut resumed = Vec::new();
        let mut resumed_from = None;
        if config.resume_recent > 0 {
            if let Some(latest) = JsonlStore::latest(&dir)? {
                resumed = latest.read_recent(config.resume_recent)?;
                resumed_from = Some(latest.session_id().to_string());
            }
        }

        let current = JsonlStore::create(&dir)?;
        tracing::info!(session = current.session_id(), resumed = resumed.len(), "session opened");
        Ok(Some(Self {
            dir,
            current,
            resumed,
            resumed_from,
        }))
    }
}

/// Run the assistant until the user quits.
pub fn run(config: &Config, engine: Arc<dyn InferenceEngine>) -> Result<()> {
    let sessions = Sessions::open(&config.history).unwrap_or_else(|err| {
        tracing::warn!(%err, "session history unavailable, continuing without it");
        None
    });

    let mut notices = Vec::new();
    let (history, persistence, sessions_dir, current_session) = match sessions {
        Some(sessions) => {
            let session_id = sessions.current.session_id().to_string();
            let persistence = PersistenceActor::spawn(Box::new(sessions.current));
            let mut history = persistence
                .sender()
                .map_or_else(ConversationHistory::new, ConversationHistory::mirrored);
            let restored = history.restore(sessions.resumed);
            if let Some(from) = sessions.resumed_from.filter(|_| restored > 0) {
                notices.push(format!("[Resumed {restored} turns from {from}]"));
            }
            (history, Some(persistence), Some(sessions.dir), Some(session_id))
        }
        None => (ConversationHistory::new(), None, None, None),
    };
    let history = history.shared();

    let classifier = IntentClassifier::new(
        Arc::clone(&engine),
        &config.engine.router_model,
        config.prompts.clone(),
        config.session.classify_max_tokens,
    );
    let chat = ChatSession::new(
        engine,
        &config.engine.chat_model,
        config.prompts.clone(),
        config.session.clone(),
        Arc::clone(&history),
    );
    let orchestrator = Arc::new(Orchestrator::new(classifier, chat));
    let commands = CommandHandler::new(
        Arc::clone(&history),
        config.prompts.clone(),
        sessions_dir,
        current_session,
    );

    let guard = TerminalGuard::enter(&config.ui)?;
    let (width, height) = terminal::size()?;

    let (input_tx, input_rx) = bounded::<InputEvent>(64);
    let (render_tx, render_rx) = bounded::<RenderCommand>(16);
    let (events_tx, events_rx) = unbounded::<AppEvent>();

    let input_actor = InputActor::spawn(input_tx, config.ui.input_poll_timeout());
    let renderer = RendererActor::spawn(render_rx, width, height);
    let ticker = TickerActor::spawn(config.ui.tick_interval());

    let mut scrollback = Scrollback::new(welcome(config), config.ui.max_messages);
    for notice in &notices {
        scrollback.push_message(notice);
    }

    let mut main_loop = MainLoop {
        scrollback,
        input: InputLine::new(),
        commands,
        worker: GenerationWorker::new(orchestrator, events_tx),
        events_rx,
        render_tx: render_tx.clone(),
        chat_model: config.engine.chat_model.clone(),
        history,
        width,
        height,
        quit: false,
        dirty: true,
    };
    main_loop.run(&input_rx, &ticker);

    // Every history handle, and with it every mirror sender, goes before the
    // persistence actor is joined.
    drop(main_loop);
    if let Some(persistence) = persistence {
        persistence.join();
    }
    input_actor.join();
    ticker.join();
    let _ = render_tx.send(RenderCommand::Shutdown);
    renderer.join();
    drop(guard);

    tracing::info!("shutdown complete");
    Ok(())
}

fn welcome(config: &Config) -> Vec<StyledLine> {
    vec![
        StyledLine::new("reverie", Style::fg(Rgb::CYAN).with(Modifiers::BOLD)).push(
            format!(" v{}", env!("CARGO_PKG_VERSION")),
            Style::fg(Rgb::DARK_GREY),
        ),
        StyledLine::new(
            format!(
                "chat: {}  router: {}",
                config.engine.chat_model, config.engine.router_model
            ),
            Style::fg(Rgb::GREY),
        ),
        StyledLine::new(
            "Type /help for commands, Ctrl+C to exit.",
            Style::fg(Rgb::DARK_GREY).with(Modifiers::DIM),
        ),
        StyledLine::blank(),
    ]
}

/// Wrap every line to `width` and cut the `rows` rows that end at the
/// focused line.
pub(crate) fn visible_rows(frame: &Frame, width: usize, rows: usize) -> Vec<StyledLine> {
    let mut wrapped = Vec::with_capacity(frame.lines.len());
    let mut focus_end = 0;
    for (i, line) in frame.lines.iter().enumerate() {
        wrapped.extend(line.wrapped(width));
        if i == frame.focused {
            focus_end = wrapped.len();
        }
    }
    let start = focus_end.saturating_sub(rows);
    let end = (start + rows).min(wrapped.len());
    wrapped.drain(start..end).collect()
}

struct MainLoop {
    scrollback: Scrollback,
    input: InputLine,
    commands: CommandHandler,
    worker: GenerationWorker,
    events_rx: Receiver<AppEvent>,
    render_tx: Sender<RenderCommand>,
    chat_model: String,
    history: SharedHistory,
    width: u16,
    height: u16,
    quit: bool,
    dirty: bool,
}

impl MainLoop {
    fn run(&mut self, input_rx: &Receiver<InputEvent>, ticker: &TickerActor) {
        let events_rx = self.events_rx.clone();
        self.draw();
        while !self.quit {
            select! {
                recv(input_rx) -> event => match event {
                    Ok(event) => self.handle_input(event),
                    Err(_) => break,
                },
                recv(events_rx) -> event => {
                    if let Ok(event) = event {
                        self.handle_app_event(event);
                    }
                },
                recv(ticker.receiver()) -> tick => {
                    if tick.is_ok() {
                        self.on_tick();
                    }
                },
            }
            self.draw();
        }
    }

    fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key { code, modifiers } => self.handle_key(code, modifiers),
            InputEvent::Scroll(delta) => {
                let lines = WHEEL_STEP * usize::from(delta.unsigned_abs());
                if delta > 0 {
                    self.scrollback.scroll_up(lines);
                } else {
                    self.scrollback.scroll_down(lines);
                }
            }
            InputEvent::Resize { width, height } => {
                self.width = width;
                self.height = height;
                let _ = self.render_tx.send(RenderCommand::Resize { width, height });
            }
            InputEvent::Paste(text) => self.input.paste(&text),
            InputEvent::Error(err) => tracing::warn!(%err, "terminal input error"),
            InputEvent::Shutdown => self.quit = true,
        }
        self.dirty = true;
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Char('c') if modifiers.control => self.quit = true,
            KeyCode::Esc => self.interrupt(),
            KeyCode::Enter => self.submit(),
            KeyCode::PageUp => self.scrollback.scroll_up(PAGE_STEP),
            KeyCode::PageDown => self.scrollback.scroll_down(PAGE_STEP),
            KeyCode::Up if modifiers.control => self.scrollback.scroll_up(1),
            KeyCode::Down if modifiers.control => self.scrollback.scroll_down(1),
            KeyCode::Home if modifiers.control => self.scrollback.jump_home(),
            KeyCode::End if modifiers.control => self.scrollback.jump_end(),
            KeyCode::Char('t') if !modifiers.any() && self.input.is_empty() => {
                self.scrollback.toggle_thinking();
            }
            _ => {
                self.input.handle_key(code, modifiers);
            }
        }
    }

    fn interrupt(&mut self) {
        if self.worker.cancel() {
            tracing::info!("interrupt requested");
            self.scrollback.push_message("[Interrupting...]");
        }
    }

    fn submit(&mut self) {
        let Some(text) = self.input.submit() else {
            return;
        };
        self.scrollback.jump_end();

        if let Some(command) = Command::parse(&text) {
            self.run_command(&text, command);
            return;
        }

        if self.worker.is_busy() {
            self.input.set_content(&text);
            self.scrollback.push_message(&format!("Error: {}", Error::Busy));
            return;
        }

        self.scrollback.begin_exchange(&text);
        if let Err(err) = self.worker.submit(text) {
            tracing::error!(%err, "failed to start generation");
            self.scrollback.push_message(&format!("Error: {err}"));
        }
    }

    fn run_command(&mut self, text: &str, command: Command) {
        let busy = self.worker.is_busy();
        if command.mutates_history() && busy {
            self.scrollback.push_message(&format!("Error: {}", Error::Busy));
            return;
        }
        if !busy {
            self.scrollback.archive_answer();
        }
        self.scrollback.push_message(&format!("> {text}"));

        match self.commands.execute(command) {
            CommandOutcome::Reply(reply) => self.scrollback.push_message(&reply),
            CommandOutcome::ClearThen(reply) => {
                self.scrollback.clear();
                self.scrollback.push_message(&reply);
            }
            CommandOutcome::Quit => self.quit = true,
        }
    }

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Stage(stage) => self.scrollback.set_stage(stage),
            AppEvent::Message(text) => self.scrollback.push_message(&text),
            AppEvent::Thinking(text) => self.scrollback.append_thinking(&text),
            AppEvent::Answer(text) => self.scrollback.append_answer(&text),
            AppEvent::Complete => {
                self.worker.reap();
                self.scrollback.set_stage(PipelineStage::Complete);
            }
        }
        self.dirty = true;
    }

    fn on_tick(&mut self) {
        self.scrollback.tick();
        if self.scrollback.stage().is_active() {
            self.dirty = true;
        }
    }

    fn status_line(&self, sticky: bool) -> StyledLine {
        let stage = self.scrollback.stage();
        let color = match stage {
            PipelineStage::Error => Rgb::RED,
            stage if stage.is_active() => Rgb::YELLOW,
            _ => Rgb::GREEN,
        };
        let separator = Style::fg(Rgb::DARK_GREY);

        let mut line = StyledLine::new(
            format!(" {stage} "),
            Style::fg(color).with(Modifiers::BOLD | Modifiers::REVERSED),
        )
        .push(format!(" {} ", self.chat_model), Style::fg(Rgb::GREY))
        .push(format!("│ {} turns ", self.history.lock().len()), separator);

        if !sticky {
            line = line.push("│ scrolled, Ctrl+End to follow ", separator);
        }
        if self.worker.is_busy() {
            line = line.push("│ Esc to stop ", separator);
        }
        line
    }

    fn screen(&self) -> Screen {
        let width = usize::from(self.width);
        let body_rows = usize::from(self.height).saturating_sub(2);
        let (input, cursor) = self.input.render(width);
        let frame = self.scrollback.render();
        Screen {
            body: visible_rows(&frame, width, body_rows),
            status: self.status_line(frame.sticky),
            input,
            cursor: u16::try_from(cursor).unwrap_or(u16::MAX),
        }
    }

    fn draw(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        let _ = self.render_tx.send(RenderCommand::Draw(Box::new(self.screen())));
    }
}
