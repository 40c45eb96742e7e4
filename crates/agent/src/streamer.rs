//! Replays an agent answer to a client as a stream of word events.
//!
//! The agent runs to completion inside a spawned task. Its final answer is
//! then split on whitespace and sent one word at a time, with a short pause
//! between words, followed by a single `Done`. Any failure becomes a single
//! `Error` event instead. Dropping the receiver cancels the turn.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{Instrument, debug, error, info, warn};
use tribuna_core::message::ChatMessage;

use crate::react::ReactAgent;
use crate::stream_event::StreamEvent;

const CHANNEL_CAPACITY: usize = 128;

/// Error event text when the turn panicked instead of returning.
pub const TURN_PANICKED: &str = "Error interno: el agente se detuvo inesperadamente";

/// Split `text` into word events: the first word bare, every following word
/// with a single leading space. Runs of whitespace (including newlines)
/// collapse to one space.
pub fn segment_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .enumerate()
        .map(|(i, word)| if i == 0 { word.to_string() } else { format!(" {word}") })
        .collect()
}

#[derive(Clone)]
pub struct ChatStreamer {
    agent: Arc<ReactAgent>,
    word_delay: Duration,
}

impl ChatStreamer {
    pub fn new(agent: Arc<ReactAgent>, word_delay: Duration) -> Self {
        Self { agent, word_delay }
    }

    /// Use the `[agent]` word delay from config.
    pub fn from_config(config: &tribuna_config::AppConfig, agent: Arc<ReactAgent>) -> Self {
        Self::new(agent, Duration::from_millis(config.agent.word_delay_ms))
    }

    pub fn agent(&self) -> &Arc<ReactAgent> {
        &self.agent
    }

    /// Start a turn and return the receiving end of its event stream.
    ///
    /// The stream yields zero or more `Text` events and then exactly one
    /// terminal event. If the receiver is dropped the background task stops
    /// at its next await point and nothing further is sent. The task runs in
    /// the caller's current tracing span.
    pub fn stream(&self, input: String, history: Vec<ChatMessage>) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel::<StreamEvent>(CHANNEL_CAPACITY);
        let agent = self.agent.clone();
        let word_delay = self.word_delay;

        tokio::spawn(async move {
            // The turn gets its own task so a panic inside it still ends the
            // stream with an `Error`.
            let mut turn = tokio::spawn(
                async move { agent.run(&input, &history).await }.instrument(tracing::Span::current()),
            );

            let joined = tokio::select! {
                joined = &mut turn => joined,
                _ = tx.closed() => {
                    turn.abort();
                    info!("Client disconnected before the answer was ready, turn cancelled");
                    return;
                }
            };

            let result = match joined {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    warn!(error = %e, "Agent turn failed");
                    let _ = tx.send(StreamEvent::Error { message: e.to_string() }).await;
                    return;
                }
                Err(e) => {
                    error!(error = %e, "Agent turn panicked");
                    let _ = tx.send(StreamEvent::Error { message: TURN_PANICKED.to_string() }).await;
                    return;
                }
            };

            let words = segment_words(&result.output);
            debug!(
                words = words.len(),
                iterations = result.iterations,
                stop = ?result.stop,
                "Streaming answer"
            );

            for (i, word) in words.into_iter().enumerate() {
                if i > 0 && !word_delay.is_zero() {
                    tokio::time::sleep(word_delay).await;
                }
                if tx.send(StreamEvent::Text { content: word }).await.is_err() {
                    info!("Client disconnected mid-answer, stream stopped");
                    return;
                }
            }

            let _ = tx.send(StreamEvent::Done).await;
        }
        .instrument(tracing::Span::current()));

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::Persona;
    use crate::test_helpers::*;
    use tribuna_core::tool::ToolRegistry;
    use tribuna_tools::TOOL_NAME;

    fn streamer_with(provider: SequentialMockProvider, registry: Arc<ToolRegistry>) -> ChatStreamer {
        let agent = ReactAgent::new(Arc::new(provider), "mock-model", 0.7, registry, Persona::builtin());
        ChatStreamer::new(Arc::new(agent), Duration::ZERO)
    }

    async fn collect(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn text_of(events: &[StreamEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Text { content } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn segment_words_prefixes_spaces() {
        assert_eq!(segment_words("Hola vecinos de El Alto"), vec!["Hola", " vecinos", " de", " El", " Alto"]);
    }

    #[test]
    fn segment_words_collapses_whitespace() {
        assert_eq!(segment_words("  uno\n\ndos\tsalto  "), vec!["uno", " dos", " salto"]);
        assert!(segment_words("   ").is_empty());
    }

    #[tokio::test]
    async fn words_arrive_in_order_then_done() {
        let answer = "Mi propuesta es un hospital de tercer nivel para El Alto.";
        let streamer = streamer_with(
            SequentialMockProvider::single_text(answer),
            registry_over(FixedStore::with_texts(&[])),
        );

        let events = collect(streamer.stream("salud".into(), vec![])).await;
        assert_eq!(events.last(), Some(&StreamEvent::Done));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert_eq!(text_of(&events), answer);
        assert_eq!(events.len(), answer.split_whitespace().count() + 1);
    }

    #[tokio::test]
    async fn backend_failure_yields_single_error() {
        let provider = SequentialMockProvider::new(vec![Ok(make_tool_call_response(
            vec![make_tool_call(TOOL_NAME, serde_json::json!({"query": "salud"}))],
            "",
        ))]);
        let streamer = streamer_with(provider, registry_over(FixedStore::failing()));

        let events = collect(streamer.stream("salud".into(), vec![])).await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::Error { message } => assert!(message.contains("database unavailable")),
            other => panic!("expected error event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn panicking_tool_yields_single_error() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(PanickingTool));
        let provider = SequentialMockProvider::new(vec![Ok(make_tool_call_response(
            vec![make_tool_call(TOOL_NAME, serde_json::json!({"query": "salud"}))],
            "",
        ))]);
        let streamer = streamer_with(provider, Arc::new(registry));

        let events = collect(streamer.stream("salud".into(), vec![])).await;
        assert_eq!(events, vec![StreamEvent::Error { message: TURN_PANICKED.to_string() }]);
    }

    #[tokio::test(start_paused = true)]
    async fn word_delay_is_applied_between_words() {
        let agent = ReactAgent::new(
            Arc::new(SequentialMockProvider::single_text("uno dos tres")),
            "mock-model",
            0.7,
            registry_over(FixedStore::with_texts(&[])),
            Persona::builtin(),
        );
        let streamer = ChatStreamer::new(Arc::new(agent), Duration::from_millis(10));

        let start = tokio::time::Instant::now();
        let events = collect(streamer.stream("x".into(), vec![])).await;
        assert_eq!(events.len(), 4);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn dropping_receiver_cancels_turn() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(HangingTool));
        let provider = SequentialMockProvider::new(vec![Ok(make_tool_call_response(
            vec![make_tool_call(TOOL_NAME, serde_json::json!({"query": "salud"}))],
            "",
        ))]);
        let streamer = streamer_with(provider, Arc::new(registry));

        let rx = streamer.stream("salud".into(), vec![]);
        // Give the task time to reach the hanging tool.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(Arc::strong_count(streamer.agent()), 2);

        drop(rx);
        let released = tokio::time::timeout(Duration::from_secs(2), async {
            while Arc::strong_count(streamer.agent()) > 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(released.is_ok(), "background turn kept running after disconnect");
    }
}
