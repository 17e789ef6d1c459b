//! Request orchestration: classify, dispatch, run the workflow.
//!
//! Runs on the worker thread. Everything it has to say goes out as
//! [`AppEvent`]s; the main loop owns the view.

use super::classifier::IntentClassifier;
use super::intent::{dispatch, WorkflowType};
use crate::actor::AppEvent;
use crate::engine::CancellationToken;
use crate::session::ChatSession;
use crate::stream::Phase;
use crate::view::PipelineStage;
use crossbeam_channel::Sender;

/// Answer for requests routed to code generation.
pub const CODE_PLACEHOLDER: &str = "[Code generation is not available yet]";
/// Answer for requests routed to tools.
pub const TOOL_PLACEHOLDER: &str = "[Tool mode is not available yet]";

/// Classifier plus the workflows it dispatches to.
pub struct Orchestrator {
    classifier: IntentClassifier,
    chat: ChatSession,
}

impl Orchestrator {
    /// Wire up the pipeline.
    pub const fn new(classifier: IntentClassifier, chat: ChatSession) -> Self {
        Self { classifier, chat }
    }

    /// The chat workflow's session.
    pub const fn chat(&self) -> &ChatSession {
        &self.chat
    }

    /// Handle one request end to end.
    ///
    /// A send error means the main loop is gone; the request still runs to
    /// completion so history stays consistent.
    pub fn process(&self, request: &str, events: &Sender<AppEvent>, cancel: &CancellationToken) {
        let emit = |event: AppEvent| {
            let _ = events.send(event);
        };

        emit(AppEvent::Stage(PipelineStage::Classifying));
        emit(AppEvent::Message("[Classifying intent...]".to_string()));
        let intent = self.classifier.classify(request);

        if cancel.is_cancelled() {
            tracing::info!("request cancelled before dispatch");
            return;
        }

        let workflow = dispatch(intent);
        tracing::debug!(%intent, ?workflow, "dispatching");
        emit(AppEvent::Message(format!("[{}]", workflow.progress_message())));

        match workflow {
            WorkflowType::ChatMode => self.run_chat(request, events, cancel),
            WorkflowType::CodePipeline => emit(AppEvent::Message(CODE_PLACEHOLDER.to_string())),
            WorkflowType::ToolMode => emit(AppEvent::Message(TOOL_PLACEHOLDER.to_string())),
        }
    }

    fn run_chat(&self, request: &str, events: &Sender<AppEvent>, cancel: &CancellationToken) {
        let _ = events.send(AppEvent::Stage(PipelineStage::Thinking));

        let mut streamed = false;
        let mut answering = false;
        let response = self.chat.run(
            request,
            &mut |phase, text| {
                streamed = true;
                let event = match phase {
                    Phase::Thinking => AppEvent::Thinking(text.to_string()),
                    Phase::Answer => {
                        if !answering {
                            answering = true;
                            let _ = events.send(AppEvent::Stage(PipelineStage::Answering));
                        }
                        AppEvent::Answer(text.to_string())
                    }
                };
                let _ = events.send(event);
            },
            cancel,
        );

        // Nothing streamed means the session bailed out before generating,
        // and its return value is the only report.
        if !streamed && !response.is_empty() {
            let _ = events.send(AppEvent::Stage(PipelineStage::Error));
            let _ = events.send(AppEvent::Message(response));
        }
    }
}
