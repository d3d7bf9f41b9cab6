//! Accumulates decoded stream events into a complete report text.

use crate::sse::StreamEvent;

/// Final state handed to the persistence sink once the terminal event arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedReport {
    pub content: String,
    pub conversation_id: String,
}

/// Concatenates message fragments and tracks the latest continuation token.
///
/// [`apply`](Self::apply) yields a [`CompletedReport`] exactly once, on the
/// first `message_end` event. Events after that are ignored.
#[derive(Debug, Default)]
pub struct ReportAccumulator {
    full_text: String,
    conversation_id: String,
    finished: bool,
}

impl ReportAccumulator {
    /// Start accumulating, seeded with the inbound continuation token if any.
    pub fn new(conversation_id: Option<&str>) -> Self {
        Self {
            full_text: String::new(),
            conversation_id: conversation_id.unwrap_or_default().to_string(),
            finished: false,
        }
    }

    pub fn apply(&mut self, event: StreamEvent) -> Option<CompletedReport> {
        if self.finished {
            return None;
        }

        match event {
            StreamEvent::Message {
                answer,
                conversation_id,
            } => {
                self.full_text.push_str(&answer);
                self.update_conversation(conversation_id);
                None
            }
            StreamEvent::MessageEnd { conversation_id } => {
                self.update_conversation(conversation_id);
                self.finished = true;
                Some(CompletedReport {
                    content: self.full_text.clone(),
                    conversation_id: self.conversation_id.clone(),
                })
            }
            StreamEvent::Other => None,
        }
    }

    fn update_conversation(&mut self, conversation_id: Option<String>) {
        if let Some(id) = conversation_id.filter(|id| !id.is_empty()) {
            self.conversation_id = id;
        }
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.full_text
    }

    /// Whether the terminal event has been observed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
