//! Scrollback view-model.
//!
//! Holds everything the conversation pane shows: a fixed header, the
//! message log, the thinking and answer panes of the current exchange, and
//! a spinner while work is in flight. Content only ever grows at the end
//! (apart from an explicit clear), and rendering recomputes the line count
//! on every pass, so the scroll position is the only state that needs care.
//!
//! ```text
//!  0  header
//!  ..  message log        one line per message line
//!  ..  ▼ Thinking         header + lines, or one collapsed header
//!  ..  (blank)
//!  ..  Final Answer:      header + lines
//!  ..  (blank)
//!  ..  Working... ⠋       while the stage is active
//! ```

use super::stage::PipelineStage;
use super::style::{message_style, Modifiers, Rgb, Style, StyledLine};
use std::collections::VecDeque;

/// Spinner animation frames.
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const THINKING_SHOWN: &str = "▼ Thinking (press 't' to hide)";
const THINKING_HIDDEN: &str = "▶ Thinking (press 't' to show)";
const ANSWER_HEADER: &str = "Final Answer:";

/// Where the view is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollPosition {
    /// Follow the newest line.
    #[default]
    Sticky,
    /// Pinned to an absolute line index.
    Line(usize),
}

/// Scroll position and pane visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    /// Current anchor.
    pub position: ScrollPosition,
    /// Whether the thinking pane is expanded.
    pub thinking_visible: bool,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            position: ScrollPosition::Sticky,
            thinking_visible: true,
        }
    }
}

impl ScrollState {
    /// Move up `n` lines. Leaving sticky mode starts from the last line.
    pub fn scroll_up(&mut self, n: usize, total: usize) {
        let from = match self.position {
            ScrollPosition::Sticky => total.saturating_sub(1),
            ScrollPosition::Line(line) => line,
        };
        self.position = ScrollPosition::Line(from.saturating_sub(n));
    }

    /// Move down `n` lines. Reaching the last line re-enables sticky mode.
    pub fn scroll_down(&mut self, n: usize, total: usize) {
        if let ScrollPosition::Line(line) = self.position {
            let next = line.saturating_add(n);
            self.position = if next >= total.saturating_sub(1) {
                ScrollPosition::Sticky
            } else {
                ScrollPosition::Line(next)
            };
        }
    }

    /// Pin to the first line.
    pub fn jump_home(&mut self) {
        self.position = ScrollPosition::Line(0);
    }

    /// Follow the newest line.
    pub fn jump_end(&mut self) {
        self.position = ScrollPosition::Sticky;
    }

    /// The focused line for a pane of `total` lines.
    pub fn focused(&self, total: usize) -> usize {
        let last = total.saturating_sub(1);
        match self.position {
            ScrollPosition::Sticky => last,
            ScrollPosition::Line(line) => line.min(last),
        }
    }
}

/// Rendered lines plus the line that must be on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Every line of the pane, top to bottom.
    pub lines: Vec<StyledLine>,
    /// Index into `lines` of the focused line.
    pub focused: usize,
    /// Whether the view follows new content.
    pub sticky: bool,
}

/// The conversation pane's state.
#[derive(Debug, Clone)]
pub struct Scrollback {
    header: Vec<StyledLine>,
    messages: VecDeque<String>,
    max_messages: usize,
    thinking: String,
    answer: String,
    stage: PipelineStage,
    spinner_frame: usize,
    scroll: ScrollState,
}

impl Scrollback {
    /// Empty pane under `header`, keeping at most `max_messages` log lines.
    pub fn new(header: Vec<StyledLine>, max_messages: usize) -> Self {
        Self {
            header,
            messages: VecDeque::new(),
            max_messages: max_messages.max(1),
            thinking: String::new(),
            answer: String::new(),
            stage: PipelineStage::Idle,
            spinner_frame: 0,
            scroll: ScrollState::default(),
        }
    }

    /// Append a message, one log line per text line.
    pub fn push_message(&mut self, text: &str) {
        if text.is_empty() {
            self.push_line(String::new());
            return;
        }
        for line in text.lines() {
            self.push_line(line.to_string());
        }
    }

    fn push_line(&mut self, line: String) {
        while self.messages.len() >= self.max_messages {
            self.messages.pop_front();
            self.shift_pinned_line();
        }
        self.messages.push_back(line);
    }

    /// Keep a pinned position on the same content after the oldest message
    /// is evicted. A pin on the evicted line moves to the next one.
    fn shift_pinned_line(&mut self) {
        if let ScrollPosition::Line(line) = self.scroll.position {
            if line > self.header.len() {
                self.scroll.position = ScrollPosition::Line(line - 1);
            }
        }
    }

    /// Start a new exchange: archive the previous one, echo the input.
    pub fn begin_exchange(&mut self, input: &str) {
        self.archive_answer();
        self.push_message(&format!("> {input}"));
    }

    /// Move the finished answer into the message log and empty both panes.
    /// Thinking is not kept.
    pub fn archive_answer(&mut self) {
        let answer = std::mem::take(&mut self.answer);
        let answer = answer.trim();
        if !answer.is_empty() {
            self.push_message(answer);
        }
        self.thinking.clear();
    }

    /// Append released thinking text.
    pub fn append_thinking(&mut self, text: &str) {
        self.thinking.push_str(text);
    }

    /// Append released answer text.
    pub fn append_answer(&mut self, text: &str) {
        self.answer.push_str(text);
    }

    /// Drop the message log and both panes.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.thinking.clear();
        self.answer.clear();
        self.scroll.jump_end();
    }

    /// Set the pipeline stage.
    pub fn set_stage(&mut self, stage: PipelineStage) {
        self.stage = stage;
    }

    /// Current pipeline stage.
    pub const fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Advance the spinner.
    pub fn tick(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }

    /// Expand or collapse the thinking pane.
    pub fn toggle_thinking(&mut self) {
        self.scroll.thinking_visible = !self.scroll.thinking_visible;
    }

    /// Scroll state.
    pub const fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    /// Scroll up `n` lines.
    pub fn scroll_up(&mut self, n: usize) {
        let total = self.total_lines();
        self.scroll.scroll_up(n, total);
    }

    /// Scroll down `n` lines.
    pub fn scroll_down(&mut self, n: usize) {
        let total = self.total_lines();
        self.scroll.scroll_down(n, total);
    }

    /// Jump to the top.
    pub fn jump_home(&mut self) {
        self.scroll.jump_home();
    }

    /// Jump to the newest line and follow it.
    pub fn jump_end(&mut self) {
        self.scroll.jump_end();
    }

    /// Message log lines.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    /// Thinking text of the current exchange.
    pub fn thinking(&self) -> &str {
        &self.thinking
    }

    /// Answer text of the current exchange.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Number of lines [`render`](Self::render) will produce.
    pub fn total_lines(&self) -> usize {
        let mut total = self.header.len() + self.messages.len();
        if !self.thinking.is_empty() {
            total += 1;
            if self.scroll.thinking_visible {
                total += self.thinking.lines().count();
            }
        }
        if !self.answer.is_empty() {
            total += 2 + self.answer.lines().count();
        }
        if self.stage.is_active() {
            total += 2;
        }
        total
    }

    /// Build every line of the pane and pick the focused one.
    pub fn render(&self) -> Frame {
        let mut lines = Vec::with_capacity(self.total_lines());
        lines.extend(self.header.iter().cloned());

        for message in &self.messages {
            lines.push(StyledLine::new(message.clone(), message_style(message)));
        }

        if !self.thinking.is_empty() {
            let header_style = Style::fg(Rgb::DARK_GREY).with(Modifiers::DIM);
            if self.scroll.thinking_visible {
                lines.push(StyledLine::new(THINKING_SHOWN, header_style));
                let body = Style::fg(Rgb::GREY).with(Modifiers::DIM);
                lines.extend(self.thinking.lines().map(|line| StyledLine::new(line, body)));
            } else {
                lines.push(StyledLine::new(THINKING_HIDDEN, header_style));
            }
        }

        if !self.answer.is_empty() {
            lines.push(StyledLine::blank());
            lines.push(StyledLine::new(
                ANSWER_HEADER,
                Style::fg(Rgb::GREEN).with(Modifiers::BOLD),
            ));
            lines.extend(self.answer.lines().map(|line| StyledLine::new(line, Style::PLAIN)));
        }

        if self.stage.is_active() {
            let spinner = SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()];
            let yellow = Style::fg(Rgb::YELLOW);
            lines.push(StyledLine::blank());
            lines.push(StyledLine::new("Working... ", yellow).push(spinner, yellow.with(Modifiers::BOLD)));
        }

        let focused = self.scroll.focused(lines.len());
        Frame {
            lines,
            focused,
            sticky: self.scroll.position == ScrollPosition::Sticky,
        }
    }
}
