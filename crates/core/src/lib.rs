//! # Tribuna Core
//!
//! Domain types, traits, and error definitions for the Tribuna candidate
//! chatbot. This crate has **zero framework dependencies**: it defines the
//! domain model that the provider, store, tool, agent and HTTP crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here:
//! - [`Provider`] for the planner LLM and the embedding model
//! - [`KnowledgeStore`] for the candidate's document index
//! - [`Tool`] for capabilities the planner may invoke
//!
//! Implementations live in their own crates and are wired together once at
//! startup, so tests can swap any of them for an in-process double.

pub mod error;
pub mod knowledge;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, KnowledgeError, ProviderError, Result, ToolError};
pub use knowledge::{KnowledgeChunk, KnowledgeStore, ReplaceOutcome, ScoredChunk};
pub use message::{ChatMessage, ChatRole, Message, MessageToolCall, Role};
pub use provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
    ToolDefinition, Usage,
};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
