//! Pipeline stage shown in the status line.

use std::fmt;

/// Where the current request is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStage {
    /// Nothing running.
    #[default]
    Idle,
    /// Waiting for the router model.
    Classifying,
    /// Streaming the thinking section.
    Thinking,
    /// Streaming the answer.
    Answering,
    /// The last request finished.
    Complete,
    /// The last request failed before streaming anything.
    Error,
}

impl PipelineStage {
    /// Whether the spinner should be shown.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Idle | Self::Complete)
    }

    /// Human label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Classifying => "Classifying",
            Self::Thinking => "Thinking",
            Self::Answering => "Answering",
            Self::Complete => "Complete",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_stages() {
        assert!(!PipelineStage::Idle.is_active());
        assert!(!PipelineStage::Complete.is_active());
        assert!(PipelineStage::Classifying.is_active());
        assert!(PipelineStage::Thinking.is_active());
        assert!(PipelineStage::Answering.is_active());
        assert!(PipelineStage::Error.is_active());
    }

    #[test]
    fn test_display() {
        assert_eq!(PipelineStage::Answering.to_string(), "Answering");
    }
}
