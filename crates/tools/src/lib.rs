//! Agent tool implementations for Tribuna.
//!
//! The planner gets exactly one capability: searching the candidate's
//! knowledge base. The registry is assembled once at startup and shared.

pub mod knowledge_search;

use std::sync::Arc;

use tribuna_core::knowledge::KnowledgeStore;
use tribuna_core::tool::ToolRegistry;

pub use knowledge_search::{KnowledgeSearchTool, NO_RESULTS, TOOL_NAME};

/// Create the registry with every tool the agent may call.
pub fn default_registry(store: Arc<dyn KnowledgeStore>, top_k: usize) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(KnowledgeSearchTool::new(store, top_k)));
    registry
}
