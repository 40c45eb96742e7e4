//! ReAct loop — Plan → Act → Observe, bounded by a hard cycle cap.
//!
//! Each planner step is classified as one of:
//! - **Finish**: a text-only reply, which becomes the answer
//! - **Act**: a tool call; only the first call of a step is executed
//! - **Format error**: the provider reported unparseable output, which is
//!   handed to [`recover_final_answer`]
//!
//! Unknown tools and bad arguments are fed back to the planner as `Error: ...`
//! observations so it can correct itself. Backend failures end the turn.

use std::sync::Arc;

use tracing::{debug, info, warn};
use tribuna_core::error::{Error, ProviderError};
use tribuna_core::message::{ChatMessage, Message, MessageToolCall};
use tribuna_core::provider::{Provider, ProviderRequest, ToolDefinition};
use tribuna_core::tool::{ToolCall, ToolRegistry};
use tribuna_config::AppConfig;

use crate::persona::Persona;
use crate::recovery::recover_final_answer;

/// Returned when the cycle cap is hit before the planner produced any text.
pub const ITERATION_LIMIT_MESSAGE: &str = "Me detuve porque alcancé el límite de pasos de razonamiento. Por favor, reformula tu pregunta.";

/// The ReAct agent. Built once at startup and shared across requests.
pub struct ReactAgent {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Arc<ToolRegistry>,
    persona: Persona,
    max_iterations: usize,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The planner returned a final answer.
    Finished,
    /// The planner broke the output format and the answer was salvaged.
    Recovered,
    /// The act/observe cycle cap was reached.
    IterationCap,
}

/// The result of one agent turn.
#[derive(Debug, Clone)]
pub struct ReactResult {
    /// The final answer text.
    pub output: String,
    /// Act/observe cycles completed.
    pub iterations: usize,
    /// Total tool calls executed.
    pub tool_calls_made: usize,
    pub stop: StopReason,
}

/// One classified planner step.
enum Step {
    Finish(String),
    Act { thought: String, call: MessageToolCall },
    FormatError(String),
}

impl ReactAgent {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<ToolRegistry>,
        persona: Persona,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            tools,
            persona,
            max_iterations: 5,
        }
    }

    /// Build the agent from the `[llm]` and `[agent]` config sections.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        persona: Persona,
    ) -> Self {
        let agent = Self::new(provider, &config.llm.model, config.llm.temperature, tools, persona)
            .with_max_iterations(config.agent.max_iterations);
        match config.llm.max_tokens {
            Some(max) => agent.with_max_tokens(max),
            None => agent,
        }
    }

    /// Set the act/observe cycle cap (minimum 1).
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Set the default max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Initial context: system persona, prior turns, then the new input.
    fn initial_messages(&self, input: &str, history: &[ChatMessage], tools: &[ToolDefinition]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(self.persona.system_message(tools)));
        messages.extend(history.iter().map(Message::from));
        messages.push(Message::user(input));
        messages
    }

    async fn plan(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<Step, Error> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: tools.to_vec(),
        };

        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(ProviderError::MalformedOutput { raw }) => return Ok(Step::FormatError(raw)),
            Err(e) => return Err(e.into()),
        };

        let message = response.message;
        let mut calls = message.tool_calls.into_iter();
        match calls.next() {
            None if message.content.trim().is_empty() => Ok(Step::FormatError(message.content)),
            None => Ok(Step::Finish(message.content)),
            Some(call) => {
                let dropped = calls.count();
                if dropped > 0 {
                    debug!(dropped, tool = %call.name, "Ignoring extra tool calls in one step");
                }
                Ok(Step::Act {
                    thought: message.content,
                    call,
                })
            }
        }
    }

    /// Execute one tool call and return the observation text.
    async fn act(&self, call: &MessageToolCall) -> Result<String, Error> {
        // Models sometimes send a bare string instead of a JSON object.
        let arguments = serde_json::from_str(&call.arguments)
            .unwrap_or_else(|_| serde_json::Value::String(call.arguments.clone()));

        let tool_call = ToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments,
        };

        match self.tools.execute(&tool_call).await {
            Ok(result) => Ok(result.output),
            Err(e) if e.is_recoverable() => {
                warn!(tool = %call.name, error = %e, "Recoverable tool error, reporting to planner");
                Ok(format!("Error: {e}"))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run one turn for `input` given the caller's conversation `history`.
    pub async fn run(&self, input: &str, history: &[ChatMessage]) -> Result<ReactResult, Error> {
        let tool_defs = self.tools.definitions();
        let mut messages = self.initial_messages(input, history, &tool_defs);
        let mut cycles = 0usize;
        let mut last_thought: Option<String> = None;

        info!(model = %self.model, max_iter = self.max_iterations, history = history.len(), "ReAct loop starting");

        while cycles < self.max_iterations {
            debug!(iteration = cycles + 1, "ReAct planning step");

            match self.plan(&messages, &tool_defs).await? {
                Step::Finish(answer) => {
                    info!(iterations = cycles, tool_calls = cycles, "ReAct loop completed");
                    return Ok(ReactResult {
                        output: answer,
                        iterations: cycles,
                        tool_calls_made: cycles,
                        stop: StopReason::Finished,
                    });
                }
                Step::FormatError(raw) => {
                    warn!(iterations = cycles, raw_len = raw.len(), "Planner output unparseable, recovering answer");
                    return Ok(ReactResult {
                        output: recover_final_answer(&raw),
                        iterations: cycles,
                        tool_calls_made: cycles,
                        stop: StopReason::Recovered,
                    });
                }
                Step::Act { thought, call } => {
                    debug!(tool = %call.name, arguments = %call.arguments, "ReAct action");
                    let observation = self.act(&call).await?;
                    cycles += 1;

                    if !thought.trim().is_empty() {
                        last_thought = Some(thought.clone());
                    }

                    let mut assistant = Message::assistant(thought);
                    let call_id = call.id.clone();
                    assistant.tool_calls = vec![call];
                    messages.push(assistant);
                    messages.push(Message::tool_result(call_id, observation));
                }
            }
        }

        warn!(max_iterations = self.max_iterations, "ReAct: max iterations reached");
        Ok(ReactResult {
            output: last_thought.unwrap_or_else(|| ITERATION_LIMIT_MESSAGE.to_string()),
            iterations: cycles,
            tool_calls_made: cycles,
            stop: StopReason::IterationCap,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
