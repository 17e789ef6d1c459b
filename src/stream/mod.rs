//! Stream parsing for reasoning models.
//!
//! Thinking models answer in two phases: a free-form reasoning section,
//! closed by a literal delimiter, followed by the user-facing answer.
//!
//! # Example
//!
//! ```rust
//! use reverie::stream::SectionParser;
//!
//! let mut parser = SectionParser::new();
//! parser.consume("Two plus two... that is four.</thi");
//! parser.consume("nk>\n4");
//! parser.finish();
//!
//! assert_eq!(parser.thinking(), "Two plus two... that is four.");
//! assert_eq!(parser.answer(), "4");
//! ```

mod parser;

pub use parser::{Phase, SectionDelta, SectionParser, THINK_CLOSE};
