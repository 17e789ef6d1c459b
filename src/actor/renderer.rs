//! Renderer actor: owns stdout and draws finished screens.
//!
//! Each [`Screen`] is compared row by row with the previous one; only rows
//! that changed are rewritten. All escape sequences for a frame are queued
//! into one buffer and written with a single `write_all`, so the terminal
//! never shows a half-drawn frame.

use super::messages::{RenderCommand, Screen};
use crate::view::{Modifiers, Span, StyledLine};
use crossbeam_channel::Receiver;
use crossterm::{
    cursor::{MoveTo, Show},
    queue,
    style::{Attribute, Color, Print, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};
use std::thread::{self, JoinHandle};

/// Renderer thread handle.
pub struct RendererActor {
    handle: Option<JoinHandle<()>>,
}

impl RendererActor {
    /// Spawn the render thread for a `width` x `height` terminal.
    ///
    /// The thread runs until it receives [`RenderCommand::Shutdown`] or the
    /// sender is dropped.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to spawn the thread.
    pub fn spawn(receiver: Receiver<RenderCommand>, width: u16, height: u16) -> Self {
        let handle = thread::Builder::new()
            .name("reverie-render".to_string())
            .spawn(move || {
                let mut renderer = Renderer::new(io::stdout(), width, height);
                if let Err(err) = renderer.run(&receiver) {
                    tracing::error!(%err, "render thread failed");
                }
            })
            .expect("Failed to spawn render thread");

        Self {
            handle: Some(handle),
        }
    }

    /// Wait for the render thread to exit.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Row-diffing screen writer.
pub(crate) struct Renderer<W: Write> {
    out: W,
    frame: Vec<u8>,
    width: u16,
    height: u16,
    /// What each row currently shows; `None` forces a rewrite.
    rows: Vec<Option<StyledLine>>,
}

impl<W: Write> Renderer<W> {
    pub(crate) fn new(out: W, width: u16, height: u16) -> Self {
        Self {
            out,
            frame: Vec::with_capacity(16 * 1024),
            width,
            height,
            rows: vec![None; usize::from(height)],
        }
    }

    fn run(&mut self, receiver: &Receiver<RenderCommand>) -> io::Result<()> {
        for command in receiver {
            match command {
                RenderCommand::Draw(screen) => self.draw(&screen)?,
                RenderCommand::Resize { width, height } => self.resize(width, height),
                RenderCommand::Shutdown => break,
            }
        }
        Ok(())
    }

    pub(crate) fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.rows = vec![None; usize::from(height)];
    }

    /// Lay out `screen` (body on top, then status, then input) and write
    /// the rows that changed.
    pub(crate) fn draw(&mut self, screen: &Screen) -> io::Result<()> {
        self.frame.clear();
        let height = usize::from(self.height);
        if height == 0 || self.width == 0 {
            return Ok(());
        }

        if self.rows.iter().all(Option::is_none) {
            queue!(self.frame, Clear(ClearType::All))?;
        }

        let body_rows = height.saturating_sub(2);
        let blank = StyledLine::blank();
        let mut layout: Vec<&StyledLine> = screen.body.iter().take(body_rows).collect();
        layout.resize(body_rows, &blank);
        if height >= 2 {
            layout.push(&screen.status);
        }
        layout.push(&screen.input);

        for (y, line) in layout.into_iter().enumerate() {
            if self.rows[y].as_ref() == Some(line) {
                continue;
            }
            let row = u16::try_from(y).unwrap_or(u16::MAX);
            queue!(self.frame, MoveTo(0, row), Clear(ClearType::CurrentLine))?;
            for span in line.clipped(usize::from(self.width)) {
                queue_span(&mut self.frame, &span)?;
            }
            self.rows[y] = Some(line.clone());
        }

        let cursor_x = screen.cursor.min(self.width.saturating_sub(1));
        queue!(self.frame, MoveTo(cursor_x, self.height - 1), Show)?;

        self.out.write_all(&self.frame)?;
        self.out.flush()
    }
}

fn queue_span(out: &mut Vec<u8>, span: &Span) -> io::Result<()> {
    let style = span.style;
    if let Some(fg) = style.fg {
        queue!(out, SetForegroundColor(Color::Rgb { r: fg.r, g: fg.g, b: fg.b }))?;
    }
    for (flag, attribute) in [
        (Modifiers::BOLD, Attribute::Bold),
        (Modifiers::DIM, Attribute::Dim),
        (Modifiers::ITALIC, Attribute::Italic),
        (Modifiers::REVERSED, Attribute::Reverse),
    ] {
        if style.modifiers.contains(flag) {
            queue!(out, SetAttribute(attribute))?;
        }
    }
    queue!(out, Print(&span.text), SetAttribute(Attribute::Reset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Rgb, Style};

    fn screen(body: &[&str], input: &str) -> Screen {
        Screen {
            body: body.iter().map(|text| StyledLine::new(*text, Style::PLAIN)).collect(),
            status: StyledLine::new("Idle", Style::PLAIN),
            input: StyledLine::new(input, Style::PLAIN),
            cursor: 2,
        }
    }

    fn written(renderer: &mut Renderer<Vec<u8>>) -> String {
        String::from_utf8(std::mem::take(&mut renderer.out)).unwrap()
    }

    #[test]
    fn test_first_draw_writes_everything() {
        let mut renderer = Renderer::new(Vec::new(), 20, 5);
        renderer.draw(&screen(&["hello", "world"], "> ")).unwrap();
        let out = written(&mut renderer);
        assert!(out.contains("hello"));
        assert!(out.contains("world"));
        assert!(out.contains("Idle"));
        assert!(out.contains("\x1b[2J"));
    }

    #[test]
    fn test_unchanged_rows_are_skipped() {
        let mut renderer = Renderer::new(Vec::new(), 20, 5);
        renderer.draw(&screen(&["hello", "world"], "> ")).unwrap();
        written(&mut renderer);

        renderer.draw(&screen(&["hello", "there"], "> ")).unwrap();
        let out = written(&mut renderer);
        assert!(!out.contains("hello"));
        assert!(out.contains("there"));
        assert!(!out.contains("\x1b[2J"));
    }

    #[test]
    fn test_resize_forces_full_redraw() {
        let mut renderer = Renderer::new(Vec::new(), 20, 5);
        renderer.draw(&screen(&["hello"], "> ")).unwrap();
        written(&mut renderer);

        renderer.resize(30, 6);
        renderer.draw(&screen(&["hello"], "> ")).unwrap();
        let out = written(&mut renderer);
        assert!(out.contains("hello"));
        assert!(out.contains("\x1b[2J"));
    }

    #[test]
    fn test_lines_are_clipped() {
        let mut renderer = Renderer::new(Vec::new(), 4, 3);
        renderer.draw(&screen(&["abcdefgh"], "")).unwrap();
        let out = written(&mut renderer);
        assert!(out.contains("abcd"));
        assert!(!out.contains("abcde"));
    }

    #[test]
    fn test_body_overflow_is_cut() {
        let mut renderer = Renderer::new(Vec::new(), 20, 4);
        renderer.draw(&screen(&["one", "two", "three"], "")).unwrap();
        let out = written(&mut renderer);
        assert!(out.contains("two"));
        assert!(!out.contains("three"));
    }

    #[test]
    fn test_styled_span_sets_color() {
        let mut renderer = Renderer::new(Vec::new(), 40, 3);
        let mut s = screen(&[], "");
        s.body = vec![StyledLine::new("Error: x", Style::fg(Rgb::new(1, 2, 3)))];
        renderer.draw(&s).unwrap();
        let out = written(&mut renderer);
        assert!(out.contains("\x1b[38;2;1;2;3m"));
    }
}
