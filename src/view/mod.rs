//! View-model: what the terminal shows, independent of how it is drawn.
//!
//! Everything here is plain data owned by the main loop. The renderer
//! receives finished [`StyledLine`]s and never reaches back in.

mod input_line;
mod scrollback;
mod stage;
mod style;

pub use input_line::InputLine;
pub use scrollback::{Frame, ScrollPosition, ScrollState, Scrollback, SPINNER_FRAMES};
pub use stage::PipelineStage;
pub use style::{message_style, Modifiers, Rgb, Span, Style, StyledLine};
