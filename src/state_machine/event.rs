//! Events that can occur in a session

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    Send {
        text: String,
    },
    Regenerate,

    // Gateway events
    CompletionSucceeded {
        generation: u64,
        text: String,
    },
    CompletionFailed {
        generation: u64,
        message: String,
    },
}

impl Event {
    pub fn send(text: impl Into<String>) -> Self {
        Event::Send { text: text.into() }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::Send { .. } => "send",
            Event::Regenerate => "regenerate",
            Event::CompletionSucceeded { .. } => "completion_succeeded",
            Event::CompletionFailed { .. } => "completion_failed",
        }
    }
}
