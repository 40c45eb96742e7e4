//! `POST /api/chat` — one agent turn streamed back word by word.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE, HeaderName};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;
use tribuna_core::message::ChatMessage;

use crate::protocol::encode_event;
use crate::{ApiError, SharedState};

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");
const X_VERCEL_DATA_STREAM: HeaderName = HeaderName::from_static("x-vercel-ai-data-stream");

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(rename = "conversationHistory", default)]
    pub conversation_history: Vec<ChatMessage>,
}

pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("El mensaje no puede estar vacío"));
    }

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("chat", request_id = %request_id);
    span.in_scope(|| {
        info!(
            message_len = request.message.len(),
            history = request.conversation_history.len(),
            "Chat request received"
        )
    });

    let rx = span.in_scope(|| {
        state
            .streamer
            .stream(request.message, request.conversation_history)
    });

    let body = ReceiverStream::new(rx).map(move |event| {
        if event.is_terminal() {
            info!(request_id = %request_id, event = event.event_type(), "Chat stream finished");
        }
        Ok::<_, Infallible>(encode_event(&event))
    });

    Ok((
        [
            (CONTENT_TYPE, "text/event-stream"),
            (CACHE_CONTROL, "no-cache"),
            (CONNECTION, "keep-alive"),
            (X_ACCEL_BUFFERING, "no"),
            (X_VERCEL_DATA_STREAM, "v1"),
        ],
        Body::from_stream(body),
    )
        .into_response())
}
