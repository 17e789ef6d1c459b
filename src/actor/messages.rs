//! Message types passed between threads.
//!
//! - [`InputEvent`]: input thread → main loop
//! - [`AppEvent`]: generation worker → main loop
//! - [`RenderCommand`]: main loop → render thread

use crate::view::{PipelineStage, StyledLine};

/// Keys the application reacts to.
///
/// A subset of crossterm's key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character.
    Char(char),
    /// Backspace.
    Backspace,
    /// Enter/Return.
    Enter,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Home.
    Home,
    /// End.
    End,
    /// Page Up.
    PageUp,
    /// Page Down.
    PageDown,
    /// Tab.
    Tab,
    /// Delete.
    Delete,
    /// Escape.
    Esc,
}

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyModifiers {
    /// Shift.
    pub shift: bool,
    /// Control.
    pub control: bool,
    /// Alt/Option.
    pub alt: bool,
}

impl KeyModifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
    };

    /// Control only.
    pub const CONTROL: Self = Self {
        shift: false,
        control: true,
        alt: false,
    };

    /// Whether any modifier is held.
    pub const fn any(&self) -> bool {
        self.shift || self.control || self.alt
    }
}

/// Events from the input thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A key was pressed.
    Key {
        /// Which key.
        code: KeyCode,
        /// Modifiers held.
        modifiers: KeyModifiers,
    },

    /// Mouse wheel; positive is up.
    Scroll(i16),

    /// Terminal was resized.
    Resize {
        /// Columns.
        width: u16,
        /// Rows.
        height: u16,
    },

    /// Bracketed paste.
    Paste(String),

    /// Reading the terminal failed.
    Error(String),

    /// Input thread is shutting down.
    Shutdown,
}

impl InputEvent {
    /// A key press without modifiers.
    pub const fn key(code: KeyCode) -> Self {
        Self::Key {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }
}

/// Events from the generation worker.
///
/// Text events carry parser output, already split by section, in stream
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The pipeline moved to a new stage.
    Stage(PipelineStage),
    /// A progress or result line for the message log.
    Message(String),
    /// Released thinking text.
    Thinking(String),
    /// Released answer text.
    Answer(String),
    /// The request finished; the worker is about to exit.
    Complete,
}

/// One full screen, ready to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    /// Conversation lines that fit the pane, top to bottom.
    pub body: Vec<StyledLine>,
    /// Status line under the pane.
    pub status: StyledLine,
    /// The input line.
    pub input: StyledLine,
    /// Cursor column on the input line.
    pub cursor: u16,
}

/// Commands for the render thread.
#[derive(Debug)]
pub enum RenderCommand {
    /// Draw this screen.
    Draw(Box<Screen>),
    /// The terminal changed size; the next draw must repaint everything.
    Resize {
        /// Columns.
        width: u16,
        /// Rows.
        height: u16,
    },
    /// Restore the terminal and exit.
    Shutdown,
}
