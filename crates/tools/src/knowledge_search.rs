//! Knowledge base search tool — retrieval over the candidate's documents.
//!
//! Runs a top-k similarity search and renders the hits as numbered text
//! blocks with their source file and page, ready to be quoted by the planner.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use tribuna_core::error::ToolError;
use tribuna_core::knowledge::{KnowledgeStore, ScoredChunk};
use tribuna_core::tool::{Tool, ToolResult};

/// Name the planner uses to call this tool.
pub const TOOL_NAME: &str = "buscar_propuestas";

/// Observation returned when nothing relevant is stored.
pub const NO_RESULTS: &str = "No se encontró información relevante en la base de conocimiento.";

const DESCRIPTION: &str = "Busca información sobre las propuestas, planes de gobierno, \
compromisos y posiciones del Dr. Wilmer Gálvez. \
Usa esta herramienta SIEMPRE que el usuario pregunte sobre \
propuestas específicas, planes, o cualquier tema relacionado \
con el programa de gobierno. \
Input: pregunta o tema a buscar en formato de texto.";

pub struct KnowledgeSearchTool {
    store: Arc<dyn KnowledgeStore>,
    top_k: usize,
}

impl KnowledgeSearchTool {
    pub fn new(store: Arc<dyn KnowledgeStore>, top_k: usize) -> Self {
        Self {
            store,
            top_k: top_k.max(1),
        }
    }

    /// Search the store and render the observation text.
    pub async fn search_knowledge_base(&self, query: &str) -> Result<String, ToolError> {
        if query.trim().is_empty() {
            return Ok(NO_RESULTS.to_string());
        }

        let hits = self
            .store
            .search(query, self.top_k)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: TOOL_NAME.into(),
                reason: e.to_string(),
            })?;

        debug!(query, hits = hits.len(), store = self.store.name(), "Knowledge search finished");
        Ok(format_results(&hits))
    }
}

/// Extract the query from the planner's arguments.
///
/// Accepts `{"query": ...}`, the positional `{"__arg1": ...}` shape some
/// models emit for single-input tools, or a bare JSON string.
fn query_argument(arguments: &serde_json::Value) -> Result<&str, ToolError> {
    match arguments {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Object(map) => map
            .get("query")
            .or_else(|| map.get("__arg1"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into())),
        _ => Err(ToolError::InvalidArguments(
            "Expected an object with a 'query' string".into(),
        )),
    }
}

/// Render hits as `[Resultado i]` blocks separated by `---`.
pub fn format_results(hits: &[ScoredChunk]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }

    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let chunk = &hit.chunk;
            let filename = if chunk.filename.is_empty() {
                "Desconocido"
            } else {
                chunk.filename.as_str()
            };
            let mut source = format!("Fuente: {filename}");
            if let Some(page) = chunk.page {
                source.push_str(&format!(", Página {page}"));
            }
            format!("[Resultado {}]\n{source}\nContenido: {}\n", i + 1, chunk.text)
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Pregunta o tema a buscar en la base de conocimiento"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = query_argument(&arguments)?;
        let output = self.search_knowledge_base(query).await?;

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output,
        })
    }
}
