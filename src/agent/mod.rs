//! Per-turn conversation orchestration.
//!
//! Each turn runs a small state machine: gather time + retrieved context,
//! invoke the model with the tool definitions, execute any requested tool
//! calls and re-invoke, then return the final text. The tool loop is bounded
//! — when the cap is hit the turn ends with whatever partial answer exists
//! rather than spinning.

pub mod prompt;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::ValetConfig;
use crate::llm::{ChatMessage, ChatModel, ChatRequest, Role};
use crate::tools::{self, ToolRegistry};

/// Notice returned when the tool loop cap is reached with nothing to show.
const PARTIAL_ANSWER: &str =
    "I wasn't able to finish working through that — here is what I have so far.";

pub struct Orchestrator {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    clock: Clock,
    history: Vec<ChatMessage>,
    max_tool_rounds: usize,
    temperature: f32,
    max_tokens: u32,
    context_results: usize,
    query_token_budget: usize,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: Arc<ToolRegistry>,
        clock: Clock,
        config: &ValetConfig,
    ) -> Self {
        Self {
            model,
            tools,
            clock,
            history: Vec::new(),
            max_tool_rounds: config.assistant.max_tool_rounds,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            context_results: config.retrieval.context_results,
            query_token_budget: config.retrieval.query_token_budget,
        }
    }

    /// Conversation history so far (user and assistant turns only).
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Run one full turn and return the assistant's reply.
    pub async fn respond(&mut self, user_input: &str) -> Result<String> {
        let system = self.load_context(user_input).await?;

        let mut messages = self.history.clone();
        messages.push(ChatMessage::user(user_input));

        let mut rounds = 0usize;
        let final_text = loop {
            let request = ChatRequest {
                system: Some(system.clone()),
                messages: messages.clone(),
                tools: tools::definitions(),
                temperature: Some(self.temperature),
                max_tokens: Some(self.max_tokens),
            };
            let response = self
                .model
                .complete(request)
                .await
                .context("model invocation failed")?;

            if !response.wants_tools() {
                break response.content;
            }

            rounds += 1;
            if rounds > self.max_tool_rounds {
                warn!(rounds, "tool loop cap reached — returning partial answer");
                break if response.content.trim().is_empty() {
                    PARTIAL_ANSWER.to_string()
                } else {
                    response.content
                };
            }

            debug!(round = rounds, calls = response.tool_calls.len(), "executing tool calls");
            messages.push(ChatMessage::assistant_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                let result = self.tools.dispatch(&call.name, &call.arguments).await;
                messages.push(ChatMessage::tool_result(call.id.clone(), result));
            }
        };

        self.history.push(ChatMessage::user(user_input));
        self.history.push(ChatMessage::assistant(final_text.clone()));
        Ok(final_text)
    }

    /// LOAD_CONTEXT: current time plus top-K memory and task snippets for a
    /// query derived from the recent conversation.
    async fn load_context(&self, user_input: &str) -> Result<String> {
        let time = self.clock.context();
        let query = derive_query(&self.history, user_input, self.query_token_budget);

        let (memories, tasks) = if query.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            let memories = self
                .tools
                .recall_memories(&query, self.context_results)
                .await
                .context("memory context retrieval failed")?;
            let tasks = self
                .tools
                .recall_tasks(&query, self.context_results)
                .await
                .context("task context retrieval failed")?;
            (
                memories
                    .into_iter()
                    .map(|hit| format!("- {} (saved {})", hit.content, hit.meta.created_at))
                    .collect(),
                tasks
                    .into_iter()
                    .map(|hit| format!("- {}", hit.content.replace('\n', " | ")))
                    .collect(),
            )
        };

        Ok(format!(
            "{}\n\n{}",
            prompt::SYSTEM_PROMPT,
            prompt::context_block(&time.formatted, &memories, &tasks)
        ))
    }
}

/// Rough token estimate used for context budgeting.
fn estimate_tokens(text: &str) -> usize {
    text.len() / 4
}

/// Build the retrieval query from the newest conversation tail that fits the
/// token budget. The current input is always included.
fn derive_query(history: &[ChatMessage], user_input: &str, token_budget: usize) -> String {
    let mut parts = Vec::new();
    let mut used = 0usize;

    if !user_input.trim().is_empty() {
        parts.push(user_input.trim().to_string());
        used += estimate_tokens(user_input);
    }

    for msg in history.iter().rev() {
        if !matches!(msg.role, Role::User | Role::Assistant) || msg.content.trim().is_empty() {
            continue;
        }
        let cost = estimate_tokens(&msg.content);
        if used + cost > token_budget {
            break;
        }
        used += cost;
        parts.push(msg.content.trim().to_string());
    }

    parts.reverse();
    parts.join("\n")
}
