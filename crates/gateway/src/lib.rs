//! HTTP API gateway for Tribuna.
//!
//! Exposes the chat stream, PDF ingestion, and the health endpoints.
//! Every collaborator (providers, store, agent, pipeline) is built once at
//! startup and shared by all requests through [`AppState`].
//!
//! Built on Axum for high performance async HTTP.

pub mod chat;
pub mod ingest;
pub mod protocol;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use tribuna_agent::{ChatStreamer, Persona, ReactAgent};
use tribuna_config::AppConfig;
use tribuna_ingest::IngestPipeline;

/// Shared application state for the gateway.
pub struct AppState {
    pub config: AppConfig,
    pub streamer: ChatStreamer,
    pub pipeline: Arc<IngestPipeline>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire providers, store, tools, agent and pipeline from `config`.
    ///
    /// Fails only when a configured persona file cannot be read.
    pub fn from_config(config: AppConfig) -> std::io::Result<Self> {
        let planner = tribuna_providers::planner_from_config(&config);
        let embeddings = tribuna_providers::embedder_from_config(&config);
        let store = tribuna_store::store_from_config(&config, embeddings);
        let tools = Arc::new(tribuna_tools::default_registry(store.clone(), config.retrieval.top_k));
        let persona = Persona::load(config.agent.persona_file.as_deref())?;

        let agent = Arc::new(ReactAgent::from_config(&config, planner, tools, persona));
        let streamer = ChatStreamer::from_config(&config, agent);
        let pipeline = Arc::new(IngestPipeline::from_config(&config, store));

        Ok(Self {
            config,
            streamer,
            pipeline,
        })
    }
}

/// JSON error body `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: &self.detail })).into_response()
    }
}

/// CORS from the configured origins; `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.gateway.cors_origins);
    let body_limit = state.config.ingest.max_upload_bytes;

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat::chat_handler))
        .route("/ingest", post(ingest::ingest_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(AppState::from_config(config)?);
    info!(
        model = %state.config.llm.model,
        store = state.pipeline.store().name(),
        top_k = state.config.retrieval.top_k,
        "Components ready"
    );

    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct RootResponse {
    status: &'static str,
    message: &'static str,
    version: &'static str,
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok",
        message: "Dr. Wilmer Gálvez Chatbot API",
        version: "1.0.0",
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "chatbot-api",
    })
}
