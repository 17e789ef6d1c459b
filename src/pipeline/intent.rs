//! Intents and the workflows they dispatch to.

use std::fmt;

/// What the user is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Intent {
    /// Write or change code.
    CodeGeneration,
    /// Talk.
    #[default]
    Chat,
    /// Run a tool.
    Tool,
}

impl Intent {
    /// Labels the classifier may emit, in match order.
    pub const LABELS: [&'static str; 3] = ["CODE", "CHAT", "TOOL"];

    /// Map raw classifier output to an intent.
    ///
    /// Matching is case-insensitive and by substring, checked in the order
    /// code, chat, tool. Anything else is [`Intent::Chat`].
    pub fn from_output(output: &str) -> Self {
        let lowered = output.to_lowercase();
        if lowered.contains("code") {
            Self::CodeGeneration
        } else if lowered.contains("chat") {
            Self::Chat
        } else if lowered.contains("tool") {
            Self::Tool
        } else {
            Self::Chat
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CodeGeneration => "CODE",
            Self::Chat => "CHAT",
            Self::Tool => "TOOL",
        };
        f.write_str(label)
    }
}

/// The workflow an exchange runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowType {
    /// Multi-stage code generation.
    CodePipeline,
    /// Streaming chat with a thinking model.
    ChatMode,
    /// Tool execution.
    ToolMode,
}

impl WorkflowType {
    /// Parse a workflow name. Unknown names fall back to chat.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "code" | "code_pipeline" | "codepipeline" => Self::CodePipeline,
            "tool" | "tool_mode" | "toolmode" => Self::ToolMode,
            _ => Self::ChatMode,
        }
    }

    /// Progress line shown when the workflow starts.
    pub const fn progress_message(self) -> &'static str {
        match self {
            Self::CodePipeline => "Starting code generation pipeline...",
            Self::ChatMode => "Entering chat mode...",
            Self::ToolMode => "Running tools...",
        }
    }
}

/// Map an intent to its workflow, one to one.
pub const fn dispatch(intent: Intent) -> WorkflowType {
    match intent {
        Intent::CodeGeneration => WorkflowType::CodePipeline,
        Intent::Chat => WorkflowType::ChatMode,
        Intent::Tool => WorkflowType::ToolMode,
    }
}
