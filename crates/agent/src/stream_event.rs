//! Events produced while replaying an answer to a client.
//!
//! A stream is zero or more `Text` events followed by exactly one terminal
//! event (`Done` or `Error`). Nothing follows a terminal event.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// One word of the answer, with a leading space on all but the first.
    Text { content: String },

    /// The answer was delivered completely.
    Done,

    /// The turn failed; `message` is the error's display text.
    Error { message: String },
}

impl StreamEvent {
    /// Short name used in logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Done => "done",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_text() {
        let event = StreamEvent::Text {
            content: " vecino".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"text","content":" vecino"}"#);
    }

    #[test]
    fn event_serialization_done() {
        assert_eq!(serde_json::to_string(&StreamEvent::Done).unwrap(), r#"{"type":"done"}"#);
    }

    #[test]
    fn event_deserialization() {
        let event: StreamEvent = serde_json::from_str(r#"{"type":"error","message":"boom"}"#).unwrap();
        assert_eq!(event, StreamEvent::Error { message: "boom".into() });
    }

    #[test]
    fn terminal_events() {
        assert!(!StreamEvent::Text { content: "x".into() }.is_terminal());
        assert!(StreamEvent::Done.is_terminal());
        assert!(StreamEvent::Error { message: "x".into() }.is_terminal());
        assert_eq!(StreamEvent::Done.event_type(), "done");
    }
}
