//! Compact-tagged line encoding for streamed answers.
//!
//! One event per line, `<tag>:<json>\n`:
//!
//! | Tag | Event | Payload |
//! |-----|-------|---------|
//! | `0` | text  | JSON string |
//! | `d` | done  | `{"finishReason":"stop"}` |
//! | `3` | error | JSON string |
//!
//! Clients that speak the `x-vercel-ai-data-stream: v1` protocol can consume
//! it directly.

use serde_json::Value;
use tribuna_agent::StreamEvent;

pub const DONE_LINE: &str = "d:{\"finishReason\":\"stop\"}\n";

/// Encode one event as a protocol line, trailing newline included.
pub fn encode_event(event: &StreamEvent) -> String {
    match event {
        StreamEvent::Text { content } => format!("0:{}\n", Value::String(content.clone())),
        StreamEvent::Done => DONE_LINE.to_string(),
        StreamEvent::Error { message } => format!("3:{}\n", Value::String(message.clone())),
    }
}

/// Decode one line (with or without its newline). Unknown tags and
/// malformed payloads yield `None`.
pub fn decode_line(line: &str) -> Option<StreamEvent> {
    let (tag, payload) = line.trim_end_matches('\n').split_once(':')?;
    match tag {
        "0" => serde_json::from_str(payload).ok().map(|content| StreamEvent::Text { content }),
        "3" => serde_json::from_str(payload).ok().map(|message| StreamEvent::Error { message }),
        "d" => Some(StreamEvent::Done),
        _ => None,
    }
}
