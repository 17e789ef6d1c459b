//! Colors, text modifiers and styled lines.

use bitflags::bitflags;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// A 24-bit color.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Create a color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From a hex literal such as `0xFF5500`.
    #[inline]
    pub const fn from_u32(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }

    /// Plain body text.
    pub const TEXT: Self = Self::from_u32(0xE0E0E0);
    /// Errors.
    pub const RED: Self = Self::from_u32(0xE0605A);
    /// Status and progress lines.
    pub const YELLOW: Self = Self::from_u32(0xE5C07B);
    /// Answer header.
    pub const GREEN: Self = Self::from_u32(0x98C379);
    /// Banner and prompt accent.
    pub const CYAN: Self = Self::from_u32(0x56B6C2);
    /// User input.
    pub const WHITE: Self = Self::from_u32(0xFFFFFF);
    /// Thinking body.
    pub const GREY: Self = Self::from_u32(0x9DA5B4);
    /// Thinking header.
    pub const DARK_GREY: Self = Self::from_u32(0x5C6370);
}

impl std::fmt::Debug for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

bitflags! {
    /// Text modifiers, combined with `|`.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Bold.
        const BOLD = 0b0000_0001;
        /// Faint.
        const DIM = 0b0000_0010;
        /// Italic.
        const ITALIC = 0b0000_0100;
        /// Reversed colors.
        const REVERSED = 0b0000_1000;
    }
}

impl std::fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// Foreground color plus modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    /// Text color; `None` leaves the terminal default.
    pub fg: Option<Rgb>,
    /// Modifiers.
    pub modifiers: Modifiers,
}

impl Style {
    /// Terminal defaults.
    pub const PLAIN: Self = Self {
        fg: None,
        modifiers: Modifiers::empty(),
    };

    /// Colored, no modifiers.
    pub const fn fg(color: Rgb) -> Self {
        Self {
            fg: Some(color),
            modifiers: Modifiers::empty(),
        }
    }

    /// Add modifiers.
    #[must_use]
    pub const fn with(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = self.modifiers.union(modifiers);
        self
    }
}

/// A run of text in one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Text without newlines.
    pub text: String,
    /// How to draw it.
    pub style: Style,
}

/// One display line made of styled spans.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledLine {
    /// Spans, left to right.
    pub spans: Vec<Span>,
}

impl StyledLine {
    /// An empty line.
    pub const fn blank() -> Self {
        Self { spans: Vec::new() }
    }

    /// A line with a single span.
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            spans: vec![Span {
                text: text.into(),
                style,
            }],
        }
    }

    /// Append another span.
    #[must_use]
    pub fn push(mut self, text: impl Into<String>, style: Style) -> Self {
        self.spans.push(Span {
            text: text.into(),
            style,
        });
        self
    }

    /// Concatenated text of all spans.
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    /// Display width in terminal columns.
    pub fn width(&self) -> usize {
        self.spans.iter().map(|span| span.text.width()).sum()
    }

    /// Spans cut to at most `max_width` columns.
    ///
    /// Cuts fall between grapheme clusters, so a wide character that would
    /// straddle the edge is dropped rather than split.
    pub fn clipped(&self, max_width: usize) -> Vec<Span> {
        let mut remaining = max_width;
        let mut out = Vec::with_capacity(self.spans.len());
        for span in &self.spans {
            if remaining == 0 {
                break;
            }
            let mut text = String::new();
            for grapheme in span.text.graphemes(true) {
                let width = grapheme.width();
                if width > remaining {
                    remaining = 0;
                    break;
                }
                remaining -= width;
                text.push_str(grapheme);
            }
            if !text.is_empty() {
                out.push(Span {
                    text,
                    style: span.style,
                });
            }
        }
        out
    }

    /// Split into rows of at most `max_width` columns. Always returns at
    /// least one row.
    pub fn wrapped(&self, max_width: usize) -> Vec<Self> {
        let max_width = max_width.max(1);
        if self.width() <= max_width {
            return vec![self.clone()];
        }

        let mut rows = Vec::new();
        let mut row = Self::blank();
        let mut used = 0;
        for span in &self.spans {
            let mut text = String::new();
            for grapheme in span.text.graphemes(true) {
                let width = grapheme.width();
                if used + width > max_width && used > 0 {
                    if !text.is_empty() {
                        row = row.push(std::mem::take(&mut text), span.style);
                    }
                    rows.push(std::mem::take(&mut row));
                    used = 0;
                }
                used += width;
                text.push_str(grapheme);
            }
            if !text.is_empty() {
                row = row.push(text, span.style);
            }
        }
        if !row.spans.is_empty() || rows.is_empty() {
            rows.push(row);
        }
        rows
    }
}

/// Style for a message-log line, chosen by its prefix.
pub fn message_style(line: &str) -> Style {
    if line.starts_with("Error:") {
        Style::fg(Rgb::RED)
    } else if line.starts_with('[') && line.contains(']') {
        Style::fg(Rgb::YELLOW).with(Modifiers::DIM)
    } else if line.starts_with("> ") {
        Style::fg(Rgb::WHITE).with(Modifiers::BOLD)
    } else {
        Style::PLAIN
    }
}
