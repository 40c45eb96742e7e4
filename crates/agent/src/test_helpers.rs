//! Shared test helpers for agent tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tribuna_core::error::{KnowledgeError, ProviderError, ToolError};
use tribuna_core::knowledge::{KnowledgeChunk, KnowledgeStore, ReplaceOutcome, ScoredChunk};
use tribuna_core::message::{Message, MessageToolCall};
use tribuna_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use tribuna_core::tool::{Tool, ToolRegistry, ToolResult};

/// A mock provider that returns a sequence of scripted outcomes.
///
/// Each call to `complete` returns the next outcome in the queue and records
/// the request. Panics if more calls are made than outcomes provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that returns a single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(make_text_response(text))])
    }

    /// Create a provider that first returns a tool call, then a final answer.
    pub fn tool_then_answer(tool_call: MessageToolCall, thought: &str, answer: &str) -> Self {
        Self::new(vec![
            Ok(make_tool_call_response(vec![tool_call], thought)),
            Ok(make_text_response(answer)),
        ])
    }

    /// A provider that asks for the same tool on every call.
    pub fn always_tool(tool_call: MessageToolCall, thought: &str, calls: usize) -> Self {
        Self::new(
            (0..calls)
                .map(|_| Ok(make_tool_call_response(vec![tool_call.clone()], thought)))
                .collect(),
        )
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let index = requests.len();

        if index >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                index,
                responses.len()
            );
        }

        requests.push(request);
        responses[index].clone()
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    make_tool_call_response(vec![], text)
}

/// Create a response with tool calls and optional thought content.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    let mut msg = Message::assistant(thought);
    msg.tool_calls = tool_calls;
    ProviderResponse {
        message: msg,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Helper to create a tool call.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{}", name),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

/// Knowledge store with fixed hits that counts searches.
pub struct FixedStore {
    hits: Vec<ScoredChunk>,
    fail: bool,
    pub searches: AtomicUsize,
}

impl FixedStore {
    pub fn with_texts(texts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            hits: texts
                .iter()
                .enumerate()
                .map(|(i, text)| ScoredChunk {
                    chunk: KnowledgeChunk {
                        text: text.to_string(),
                        filename: "plan_de_gobierno.pdf".into(),
                        page: Some(i as u32 + 1),
                        total_pages: Some(texts.len() as u32),
                    },
                    score: 0.9,
                })
                .collect(),
            fail: false,
            searches: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            hits: vec![],
            fail: true,
            searches: AtomicUsize::new(0),
        })
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KnowledgeStore for FixedStore {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn search(&self, _query: &str, k: usize) -> Result<Vec<ScoredChunk>, KnowledgeError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(KnowledgeError::Query("database unavailable".into()));
        }
        Ok(self.hits.iter().take(k).cloned().collect())
    }

    async fn replace_all(&self, _chunks: Vec<KnowledgeChunk>) -> Result<ReplaceOutcome, KnowledgeError> {
        Ok(ReplaceOutcome::default())
    }

    async fn count(&self) -> Result<usize, KnowledgeError> {
        Ok(self.hits.len())
    }
}

/// Registry holding only the knowledge search tool over `store`.
pub fn registry_over(store: Arc<dyn KnowledgeStore>) -> Arc<ToolRegistry> {
    Arc::new(tribuna_tools::default_registry(store, 4))
}

/// A tool that never returns, for cancellation tests.
pub struct HangingTool;

#[async_trait]
impl Tool for HangingTool {
    fn name(&self) -> &str {
        "buscar_propuestas"
    }
    fn description(&self) -> &str {
        "never finishes"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        std::future::pending::<()>().await;
        unreachable!()
    }
}

/// A tool that panics mid-call.
pub struct PanickingTool;

#[async_trait]
impl Tool for PanickingTool {
    fn name(&self) -> &str {
        "buscar_propuestas"
    }
    fn description(&self) -> &str {
        "panics"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        panic!("search backend bug")
    }
}
