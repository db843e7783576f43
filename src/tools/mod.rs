//! Tool definitions and dispatch.
//!
//! Every operation the model can invoke lives here: the parameter structs
//! (one file per tool, JSON schemas generated with schemars) and the
//! [`ToolRegistry`] that owns the repositories and routes calls to them.
//!
//! Tool results are strings rendered for the model. Recoverable problems —
//! a key that didn't match, a validation mistake, an unconfigured delegate —
//! come back as messages the model can read and react to; they never abort
//! the conversation turn. An empty search result is its own message, distinct
//! from any error.

pub mod delete_memory;
pub mod delete_task;
pub mod parse_date;
pub mod save_memory;
pub mod save_tasks;
pub mod search_memories;
pub mod search_tasks;
pub mod update_memory;
pub mod update_task;
pub mod web_research;

use tokio::sync::Mutex;
use tracing::info;

use crate::clock::Clock;
use crate::llm::ToolDefinition;
use crate::memory::memories::{MemoryHit, MemoryRepository};
use crate::memory::tasks::{TaskHit, TaskRepository};
use crate::memory::RepoError;

use delete_memory::DeleteMemoryParams;
use delete_task::DeleteTaskParams;
use parse_date::ParseDateParams;
use save_memory::SaveMemoryParams;
use save_tasks::SaveTasksParams;
use search_memories::SearchMemoriesParams;
use search_tasks::SearchTasksParams;
use update_memory::UpdateMemoryParams;
use update_task::UpdateTaskParams;
use web_research::{TavilyResearcher, WebResearchParams};

/// Message returned when a memory search matches nothing.
pub const NO_MEMORIES: &str = "No memories found, memory list is empty";
/// Message returned when a task search matches nothing.
pub const NO_TASKS: &str = "No tasks found";

/// The full set of tool definitions advertised to the model.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        definition(
            "save_memory",
            "Save one or more memories for later semantic retrieval.",
            schemars::schema_for!(SaveMemoryParams),
        ),
        definition(
            "search_memories",
            "Search saved memories by semantic similarity.",
            schemars::schema_for!(SearchMemoriesParams),
        ),
        definition(
            "delete_memory",
            "Delete memories by their exact text. Only an exact match is deleted.",
            schemars::schema_for!(DeleteMemoryParams),
        ),
        definition(
            "update_memory",
            "Replace a memory with new text, preserving its original creation time.",
            schemars::schema_for!(UpdateMemoryParams),
        ),
        definition(
            "save_tasks",
            "Store one or more structured tasks (title, dates, recurrence, completion).",
            schemars::schema_for!(SaveTasksParams),
        ),
        definition(
            "search_tasks",
            "Search stored tasks by semantic similarity.",
            schemars::schema_for!(SearchTasksParams),
        ),
        definition(
            "delete_task",
            "Delete tasks by id, exact title, or exact stored text.",
            schemars::schema_for!(DeleteTaskParams),
        ),
        definition(
            "update_task",
            "Replace a task with updated data, preserving its original creation time.",
            schemars::schema_for!(UpdateTaskParams),
        ),
        definition(
            "parse_date",
            "Validate and format a date in the assistant's reference timezone.",
            schemars::schema_for!(ParseDateParams),
        ),
        definition(
            "web_research",
            "Research current information on the web.",
            schemars::schema_for!(WebResearchParams),
        ),
    ]
}

fn definition(
    name: &str,
    description: &str,
    schema: schemars::Schema,
) -> ToolDefinition {
    ToolDefinition {
        name: name.into(),
        description: description.into(),
        parameters: serde_json::to_value(schema)
            .unwrap_or_else(|_| serde_json::json!({"type": "object"})),
    }
}

/// Owns the repositories and collaborators, and executes tool calls.
pub struct ToolRegistry {
    memories: Mutex<MemoryRepository>,
    tasks: Mutex<TaskRepository>,
    clock: Clock,
    researcher: Option<TavilyResearcher>,
    default_limit: usize,
}

impl ToolRegistry {
    pub fn new(
        memories: MemoryRepository,
        tasks: TaskRepository,
        clock: Clock,
        researcher: Option<TavilyResearcher>,
        default_limit: usize,
    ) -> Self {
        Self {
            memories: Mutex::new(memories),
            tasks: Mutex::new(tasks),
            clock,
            researcher,
            default_limit,
        }
    }

    /// Execute one tool call and render its result for the model.
    pub async fn dispatch(&self, name: &str, arguments: &str) -> String {
        info!(tool = name, "dispatching tool call");
        match name {
            "save_memory" => match parse::<SaveMemoryParams>(name, arguments) {
                Ok(params) => match self.memories.lock().await.save(params.memories).await {
                    Ok(report) => to_json(&report),
                    Err(e) => render_err(e),
                },
                Err(msg) => msg,
            },
            "search_memories" => match parse::<SearchMemoriesParams>(name, arguments) {
                Ok(params) => {
                    let limit = params.limit.unwrap_or(self.default_limit);
                    match self.memories.lock().await.search(&params.query, limit).await {
                        Ok(hits) if hits.is_empty() => NO_MEMORIES.into(),
                        Ok(hits) => to_json(&hits),
                        Err(e) => render_err(e),
                    }
                }
                Err(msg) => msg,
            },
            "delete_memory" => match parse::<DeleteMemoryParams>(name, arguments) {
                Ok(params) => match self.memories.lock().await.delete(params.targets).await {
                    Ok(report) => report.summary(),
                    Err(e) => render_err(e),
                },
                Err(msg) => msg,
            },
            "update_memory" => match parse::<UpdateMemoryParams>(name, arguments) {
                Ok(params) => {
                    let result = self
                        .memories
                        .lock()
                        .await
                        .update(&params.old_memory_text, &params.new_memory_text)
                        .await;
                    match result {
                        Ok(message) => message,
                        Err(RepoError::NotFound(key)) => {
                            format!("Could not find exact memory to update: {key}")
                        }
                        Err(e) => render_err(e),
                    }
                }
                Err(msg) => msg,
            },
            "save_tasks" => match parse::<SaveTasksParams>(name, arguments) {
                Ok(params) => match self.tasks.lock().await.save(params.tasks).await {
                    Ok(report) => to_json(&report),
                    Err(e) => render_err(e),
                },
                Err(msg) => msg,
            },
            "search_tasks" => match parse::<SearchTasksParams>(name, arguments) {
                Ok(params) => {
                    let limit = params.limit.unwrap_or(self.default_limit);
                    match self.tasks.lock().await.search(&params.query, limit).await {
                        Ok(hits) if hits.is_empty() => NO_TASKS.into(),
                        Ok(hits) => to_json(&hits),
                        Err(e) => render_err(e),
                    }
                }
                Err(msg) => msg,
            },
            "delete_task" => match parse::<DeleteTaskParams>(name, arguments) {
                Ok(params) => match self.tasks.lock().await.delete(params.targets).await {
                    Ok(report) => report.summary(),
                    Err(e) => render_err(e),
                },
                Err(msg) => msg,
            },
            "update_task" => match parse::<UpdateTaskParams>(name, arguments) {
                Ok(params) => {
                    let result = self
                        .tasks
                        .lock()
                        .await
                        .update(&params.old_task_text, params.task)
                        .await;
                    match result {
                        Ok(message) => message,
                        Err(RepoError::NotFound(key)) => {
                            format!("Could not find task matching: {key}")
                        }
                        Err(e) => render_err(e),
                    }
                }
                Err(msg) => msg,
            },
            "parse_date" => match parse::<ParseDateParams>(name, arguments) {
                Ok(params) => self.run_parse_date(params.date_input.as_deref()),
                Err(msg) => msg,
            },
            "web_research" => match parse::<WebResearchParams>(name, arguments) {
                Ok(params) => match &self.researcher {
                    Some(researcher) => match researcher.research(&params.instruction).await {
                        Ok(text) => text,
                        Err(e) => format!("Error during web research: {e:#}"),
                    },
                    None => {
                        "Web research is not configured — set TAVILY_API_KEY to enable it."
                            .into()
                    }
                },
                Err(msg) => msg,
            },
            other => format!("Error: unknown tool: {other}"),
        }
    }

    /// Context retrieval for the orchestrator: memory snippets, nearest first.
    pub async fn recall_memories(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MemoryHit>, RepoError> {
        self.memories.lock().await.search(query, limit).await
    }

    /// Context retrieval for the orchestrator: task snippets, nearest first.
    pub async fn recall_tasks(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<TaskHit>, RepoError> {
        self.tasks.lock().await.search(query, limit).await
    }

    fn run_parse_date(&self, input: Option<&str>) -> String {
        let instant = match input {
            None => Ok(self.clock.now()),
            Some(raw) => self.clock.parse(raw),
        };
        match instant {
            Ok(dt) => to_json(&self.clock.context_for(dt)),
            Err(e) => to_json(&serde_json::json!({
                "error": format!("Could not parse date input: {e}"),
                "valid_formats": [
                    "2024-02-20",
                    "2024-02-20 15:30",
                    "2024-02-20T15:30:00-05:00",
                    "today",
                    "tomorrow",
                    "friday",
                ],
            })),
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(name: &str, arguments: &str) -> Result<T, String> {
    serde_json::from_str(arguments)
        .map_err(|e| format!("Error: invalid arguments for {name}: {e}"))
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: {e}"))
}

fn render_err(err: RepoError) -> String {
    format!("Error: {err}")
}
