//! Single-line prompt with editing and submitted-command history.

use super::style::{Modifiers, Rgb, Style, StyledLine};
use crate::actor::{KeyCode, KeyModifiers};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const PROMPT: &str = "❯ ";
const PLACEHOLDER: &str = "Type your request...";

/// The input line: text, cursor, and previously submitted entries.
#[derive(Debug, Clone, Default)]
pub struct InputLine {
    content: String,
    /// Byte offset, always on a grapheme boundary.
    cursor: usize,
    submitted: Vec<String>,
    /// Index into `submitted` while browsing with Up/Down.
    browsing: Option<usize>,
}

impl InputLine {
    /// Empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the line is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Replace the text and move the cursor to the end.
    pub fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
        self.cursor = self.content.len();
    }

    /// Clear the text.
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Previously submitted entries, oldest first.
    pub fn submitted(&self) -> &[String] {
        &self.submitted
    }

    /// Take the current text if it holds anything but whitespace, and
    /// remember it for Up/Down browsing.
    pub fn submit(&mut self) -> Option<String> {
        let text = self.content.trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.submitted.push(text.clone());
        self.browsing = None;
        self.clear();
        Some(text)
    }

    /// Apply a key. Returns whether the key was used.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match code {
            KeyCode::Char(c) if !modifiers.control && !modifiers.alt => self.insert(&c.to_string()),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.cursor = self.prev_boundary(),
            KeyCode::Right => self.cursor = self.next_boundary(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.content.len(),
            KeyCode::Up => return self.history_prev(),
            KeyCode::Down => return self.history_next(),
            _ => return false,
        }
        true
    }

    /// Insert pasted text; line breaks become spaces.
    pub fn paste(&mut self, text: &str) {
        let flat: String = text
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        self.insert(&flat);
    }

    fn insert(&mut self, text: &str) {
        self.content.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    fn backspace(&mut self) {
        let prev = self.prev_boundary();
        self.content.replace_range(prev..self.cursor, "");
        self.cursor = prev;
    }

    fn delete(&mut self) {
        let next = self.next_boundary();
        self.content.replace_range(self.cursor..next, "");
    }

    fn prev_boundary(&self) -> usize {
        self.content[..self.cursor]
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(at, _)| at)
    }

    fn next_boundary(&self) -> usize {
        self.content[self.cursor..]
            .graphemes(true)
            .next()
            .map_or(self.cursor, |g| self.cursor + g.len())
    }

    /// Step back through submitted entries.
    fn history_prev(&mut self) -> bool {
        if self.submitted.is_empty() {
            return false;
        }
        let index = match self.browsing {
            None => self.submitted.len() - 1,
            Some(index) => index.saturating_sub(1),
        };
        self.browsing = Some(index);
        let entry = self.submitted[index].clone();
        self.set_content(&entry);
        true
    }

    /// Step forward; past the newest entry the line is cleared.
    fn history_next(&mut self) -> bool {
        let Some(index) = self.browsing else {
            return false;
        };
        if index + 1 < self.submitted.len() {
            self.browsing = Some(index + 1);
            let entry = self.submitted[index + 1].clone();
            self.set_content(&entry);
        } else {
            self.browsing = None;
            self.clear();
        }
        true
    }

    /// Render into `width` columns. Returns the line and the cursor column.
    ///
    /// Long input scrolls horizontally so the cursor stays visible.
    pub fn render(&self, width: usize) -> (StyledLine, usize) {
        let prompt_style = Style::fg(Rgb::GREEN).with(Modifiers::BOLD);
        let prompt_width = PROMPT.width();
        let room = width.saturating_sub(prompt_width).max(1);

        if self.content.is_empty() {
            let line = StyledLine::new(PROMPT, prompt_style)
                .push(PLACEHOLDER, Style::fg(Rgb::DARK_GREY).with(Modifiers::DIM));
            return (line, prompt_width);
        }

        let before = self.content[..self.cursor].width();
        // Drop whole graphemes from the left until the cursor fits.
        let mut skip_width = 0;
        let mut start = 0;
        for (at, grapheme) in self.content.grapheme_indices(true) {
            if before - skip_width < room {
                break;
            }
            skip_width += grapheme.width();
            start = at + grapheme.len();
        }

        let line = StyledLine::new(PROMPT, prompt_style).push(&self.content[start..], Style::PLAIN);
        (line, prompt_width + before - skip_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(input: &mut InputLine, code: KeyCode) -> bool {
        input.handle_key(code, KeyModifiers::NONE)
    }

    fn type_str(input: &mut InputLine, text: &str) {
        for c in text.chars() {
            key(input, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_typing_and_editing() {
        let mut input = InputLine::new();
        type_str(&mut input, "Helo");
        key(&mut input, KeyCode::Left);
        type_str(&mut input, "l");
        assert_eq!(input.content(), "Hello");

        key(&mut input, KeyCode::Backspace);
        assert_eq!(input.content(), "Helo");

        key(&mut input, KeyCode::Home);
        key(&mut input, KeyCode::Delete);
        assert_eq!(input.content(), "elo");
    }

    #[test]
    fn test_control_chars_not_inserted() {
        let mut input = InputLine::new();
        let ctrl = KeyModifiers {
            control: true,
            ..KeyModifiers::NONE
        };
        assert!(!input.handle_key(KeyCode::Char('c'), ctrl));
        assert!(input.is_empty());
    }

    #[test]
    fn test_multibyte_cursor() {
        let mut input = InputLine::new();
        type_str(&mut input, "héllo");
        key(&mut input, KeyCode::Home);
        key(&mut input, KeyCode::Right);
        key(&mut input, KeyCode::Right);
        key(&mut input, KeyCode::Backspace);
        assert_eq!(input.content(), "hllo");
    }

    #[test]
    fn test_submit_trims_and_records() {
        let mut input = InputLine::new();
        type_str(&mut input, "  hi  ");
        assert_eq!(input.submit().as_deref(), Some("hi"));
        assert!(input.is_empty());
        assert_eq!(input.submitted(), ["hi"]);

        type_str(&mut input, "   ");
        assert_eq!(input.submit(), None);
    }

    #[test]
    fn test_history_browsing() {
        let mut input = InputLine::new();
        for entry in ["first", "second", "third"] {
            input.set_content(entry);
            input.submit();
        }

        key(&mut input, KeyCode::Up);
        assert_eq!(input.content(), "third");
        key(&mut input, KeyCode::Up);
        key(&mut input, KeyCode::Up);
        key(&mut input, KeyCode::Up);
        assert_eq!(input.content(), "first");

        key(&mut input, KeyCode::Down);
        assert_eq!(input.content(), "second");
        key(&mut input, KeyCode::Down);
        key(&mut input, KeyCode::Down);
        assert!(input.is_empty());
        assert!(!key(&mut input, KeyCode::Down));
    }

    #[test]
    fn test_up_without_history_is_unused() {
        let mut input = InputLine::new();
        assert!(!key(&mut input, KeyCode::Up));
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let mut input = InputLine::new();
        input.paste("a\nb\r\nc");
        assert_eq!(input.content(), "a b  c");
    }

    #[test]
    fn test_render_placeholder() {
        let (line, cursor) = InputLine::new().render(40);
        assert_eq!(line.text(), "❯ Type your request...");
        assert_eq!(cursor, 2);
    }

    #[test]
    fn test_render_scrolls_to_cursor() {
        let mut input = InputLine::new();
        input.set_content("abcdefghij");
        let (line, cursor) = input.render(7);
        // 5 columns of room: the tail plus the cursor cell.
        assert_eq!(line.text(), "❯ ghij");
        assert_eq!(cursor, 6);
    }
}
