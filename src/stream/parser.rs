//! Section parser: splits a raw token stream into thinking and answer text.
//!
//! The model emits its reasoning first and closes it with a fixed delimiter.
//! Chunks arrive with arbitrary boundaries, so the delimiter may straddle
//! two (or more) chunks. The parser holds back only the bytes that could
//! still turn out to be the start of a delimiter; everything before them is
//! final and released immediately.
//!
//! ```text
//!  pending: "...reasoning text</th"
//!            └──── safe ────┘└ L-1 ┘   held back until the next chunk
//! ```

/// Literal marker that closes the thinking section.
pub const THINK_CLOSE: &str = "</think>";

/// Which section of the response the stream is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Before the delimiter.
    #[default]
    Thinking,
    /// After the delimiter.
    Answer,
}

/// Text released by one call to [`SectionParser::consume`] or
/// [`SectionParser::finish`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionDelta {
    /// New thinking text, final.
    pub thinking: String,
    /// New answer text, final.
    pub answer: String,
}

impl SectionDelta {
    /// Nothing was released.
    pub fn is_empty(&self) -> bool {
        self.thinking.is_empty() && self.answer.is_empty()
    }
}

/// Incremental, chunk-boundary-safe delimiter detector.
///
/// One parser handles exactly one response stream. Feeding the same bytes
/// with any chunking yields the same accumulated thinking and answer text.
#[derive(Debug, Clone)]
pub struct SectionParser {
    delimiter: String,
    phase: Phase,
    pending: String,
    thinking: String,
    answer: String,
    /// Set on the flip; the first answer byte is dropped if it is `\n`.
    skip_newline: bool,
}

impl Default for SectionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionParser {
    /// Create a parser for the standard `</think>` delimiter.
    pub fn new() -> Self {
        Self::with_delimiter(THINK_CLOSE)
    }

    /// Create a parser for a custom closing delimiter.
    ///
    /// An empty delimiter is treated as already seen: everything is answer.
    pub fn with_delimiter(delimiter: impl Into<String>) -> Self {
        let delimiter = delimiter.into();
        let phase = if delimiter.is_empty() {
            Phase::Answer
        } else {
            Phase::Thinking
        };
        Self {
            delimiter,
            phase,
            pending: String::new(),
            thinking: String::new(),
            answer: String::new(),
            skip_newline: false,
        }
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the delimiter has been seen.
    pub fn saw_delimiter(&self) -> bool {
        self.phase == Phase::Answer
    }

    /// All thinking text released so far.
    pub fn thinking(&self) -> &str {
        &self.thinking
    }

    /// All answer text released so far.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Bytes held back as a possible delimiter prefix.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Whether the answer holds anything other than whitespace.
    pub fn has_answer(&self) -> bool {
        !self.answer.trim().is_empty()
    }

    /// Feed the next raw chunk of the stream.
    pub fn consume(&mut self, chunk: &str) -> SectionDelta {
        let mut delta = SectionDelta::default();

        match self.phase {
            Phase::Answer => self.push_answer(chunk, &mut delta),
            Phase::Thinking => {
                self.pending.push_str(chunk);

                if let Some(at) = self.pending.find(&self.delimiter) {
                    let rest = self.pending.split_off(at);
                    let before = std::mem::take(&mut self.pending);
                    self.push_thinking(before, &mut delta);

                    self.phase = Phase::Answer;
                    self.skip_newline = true;
                    self.push_answer(&rest[self.delimiter.len()..], &mut delta);
                } else {
                    let holdback = self.delimiter.len() - 1;
                    let mut safe_len = self.pending.len().saturating_sub(holdback);
                    while !self.pending.is_char_boundary(safe_len) {
                        safe_len -= 1;
                    }
                    if safe_len > 0 {
                        let held = self.pending.split_off(safe_len);
                        let safe = std::mem::replace(&mut self.pending, held);
                        self.push_thinking(safe, &mut delta);
                    }
                }
            }
        }

        delta
    }

    /// Signal end of stream; releases whatever was held back.
    ///
    /// If the delimiter never arrived the held bytes were thinking after all.
    pub fn finish(&mut self) -> SectionDelta {
        let mut delta = SectionDelta::default();
        if self.phase == Phase::Thinking && !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.push_thinking(rest, &mut delta);
        }
        delta
    }

    fn push_thinking(&mut self, text: String, delta: &mut SectionDelta) {
        if text.is_empty() {
            return;
        }
        self.thinking.push_str(&text);
        delta.thinking.push_str(&text);
    }

    fn push_answer(&mut self, mut text: &str, delta: &mut SectionDelta) {
        if self.skip_newline && !text.is_empty() {
            self.skip_newline = false;
            text = text.strip_prefix('\n').unwrap_or(text);
        }
        if text.is_empty() {
            return;
        }
        self.answer.push_str(text);
        delta.answer.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn feed_all(chunks: &[&str]) -> (String, String) {
        let mut parser = SectionParser::new();
        let mut thinking = String::new();
        let mut answer = String::new();
        for chunk in chunks {
            let delta = parser.consume(chunk);
            thinking.push_str(&delta.thinking);
            answer.push_str(&delta.answer);
        }
        let delta = parser.finish();
        thinking.push_str(&delta.thinking);
        answer.push_str(&delta.answer);

        assert_eq!(thinking, parser.thinking());
        assert_eq!(answer, parser.answer());
        (thinking, answer)
    }

    #[test]
    fn test_single_chunk_split() {
        let (thinking, answer) = feed_all(&["let me see</think>\nThe answer is 4."]);
        assert_eq!(thinking, "let me see");
        assert_eq!(answer, "The answer is 4.");
    }

    #[test]
    fn test_delimiter_straddles_chunks() {
        let (thinking, answer) = feed_all(&["pondering...</thi", "nk>rest of it"]);
        assert_eq!(thinking, "pondering...");
        assert_eq!(answer, "rest of it");
    }

    #[test]
    fn test_delimiter_one_byte_at_a_time() {
        let text = "a</think>b";
        let chunks: Vec<String> = text.chars().map(String::from).collect();
        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        assert_eq!(feed_all(&refs), ("a".to_string(), "b".to_string()));
    }

    #[test]
    fn test_no_delimiter_is_all_thinking() {
        let (thinking, answer) = feed_all(&["just ", "thinking ", "out loud </thin"]);
        assert_eq!(thinking, "just thinking out loud </thin");
        assert!(answer.is_empty());
    }

    #[test]
    fn test_holdback_is_bounded() {
        let mut parser = SectionParser::new();
        let delta = parser.consume("0123456789abcdef");
        assert_eq!(delta.thinking, "012345678");
        assert_eq!(parser.pending(), "9abcdef");
        assert_eq!(parser.pending().len(), THINK_CLOSE.len() - 1);
    }

    #[test]
    fn test_short_chunks_are_held() {
        let mut parser = SectionParser::new();
        assert!(parser.consume("abc").is_empty());
        assert_eq!(parser.pending(), "abc");
        assert_eq!(parser.finish().thinking, "abc");
    }

    #[test]
    fn test_newline_after_delimiter_in_next_chunk() {
        let (_, answer) = feed_all(&["x</think>", "\nhello"]);
        assert_eq!(answer, "hello");
    }

    #[test]
    fn test_only_one_newline_is_skipped() {
        let (_, answer) = feed_all(&["x</think>\n\nhello"]);
        assert_eq!(answer, "\nhello");
    }

    #[test]
    fn test_second_delimiter_is_answer_text() {
        let (thinking, answer) = feed_all(&["a</think>b</think>c"]);
        assert_eq!(thinking, "a");
        assert_eq!(answer, "b</think>c");
    }

    #[test]
    fn test_phase_never_reverses() {
        let mut parser = SectionParser::new();
        parser.consume("x</think>");
        assert_eq!(parser.phase(), Phase::Answer);
        parser.consume("more");
        parser.finish();
        assert_eq!(parser.phase(), Phase::Answer);
    }

    #[test]
    fn test_multibyte_text_near_holdback() {
        let (thinking, answer) = feed_all(&["héllo wörld ✓✓✓", "</think>ça va"]);
        assert_eq!(thinking, "héllo wörld ✓✓✓");
        assert_eq!(answer, "ça va");
    }

    #[test]
    fn test_whitespace_answer_is_not_an_answer() {
        let mut parser = SectionParser::new();
        parser.consume("reasoning</think>\n  \n");
        parser.finish();
        assert!(parser.saw_delimiter());
        assert!(!parser.has_answer());
    }

    fn split_at_points(text: &str, mut points: Vec<usize>) -> Vec<&str> {
        points.retain(|&p| p < text.len() && text.is_char_boundary(p));
        points.sort_unstable();
        points.dedup();
        let mut chunks = Vec::new();
        let mut start = 0;
        for p in points {
            chunks.push(&text[start..p]);
            start = p;
        }
        chunks.push(&text[start..]);
        chunks
    }

    proptest! {
        #[test]
        fn prop_chunking_does_not_change_sections(
            thinking in "[a-z <>/\n]{0,40}",
            answer in "[a-z <>/\n]{0,40}",
            points in proptest::collection::vec(0usize..100, 0..12),
        ) {
            prop_assume!(!thinking.contains(THINK_CLOSE));
            let stream = format!("{thinking}{THINK_CLOSE}{answer}");
            let whole = feed_all(&[stream.as_str()]);
            let chunks = split_at_points(&stream, points);
            let chunked = feed_all(&chunks);
            prop_assert_eq!(whole, chunked);
        }

        #[test]
        fn prop_no_delimiter_keeps_every_byte(
            text in "[a-z<>/ ]{0,60}",
            points in proptest::collection::vec(0usize..60, 0..8),
        ) {
            prop_assume!(!text.contains(THINK_CLOSE));
            let chunks = split_at_points(&text, points);
            let (thinking, answer) = feed_all(&chunks);
            prop_assert_eq!(thinking, text);
            prop_assert!(answer.is_empty());
        }
    }
}
