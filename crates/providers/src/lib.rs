//! LLM Provider implementations for Tribuna.
//!
//! Both the planner (Groq) and the embedder (OpenAI) speak the OpenAI
//! chat-completions / embeddings wire format, so one client covers both.

pub mod openai_compat;

use std::sync::Arc;

use tribuna_config::AppConfig;
use tribuna_core::Provider;

pub use openai_compat::OpenAiCompatProvider;

/// Build the planner provider from the `[llm]` section.
pub fn planner_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    Arc::new(OpenAiCompatProvider::new(
        "groq",
        &config.llm.api_url,
        config.llm.api_key.clone().unwrap_or_default(),
    ))
}

/// Build the embedding provider from the `[embeddings]` section.
pub fn embedder_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    Arc::new(OpenAiCompatProvider::new(
        "openai",
        &config.embeddings.api_url,
        config.embeddings.api_key.clone().unwrap_or_default(),
    ))
}
