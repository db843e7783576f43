//! Entry metadata and the structured task payload.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata carried by every stored entry, memory or task.
///
/// `original_created_at` survives updates: when an entry is replaced, the
/// replacement inherits the replaced entry's origin timestamp even though it
/// gets a brand-new `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMeta {
    pub id: String,
    /// RFC 3339, in the reference timezone.
    pub created_at: String,
    /// Set on the first update; `None` until then.
    #[serde(default)]
    pub edited_at: Option<String>,
    #[serde(default)]
    pub is_edited: bool,
    pub original_created_at: String,
}

impl EntryMeta {
    /// Metadata for a freshly created entry.
    pub fn new(id: String, now_rfc3339: &str) -> Self {
        Self {
            id,
            created_at: now_rfc3339.to_string(),
            edited_at: None,
            is_edited: false,
            original_created_at: now_rfc3339.to_string(),
        }
    }

    /// Metadata for the replacement entry of an update, inheriting the
    /// replaced entry's origin timestamp.
    pub fn edited_from(previous: &EntryMeta, id: String, now_rfc3339: &str) -> Self {
        Self {
            id,
            created_at: now_rfc3339.to_string(),
            edited_at: Some(now_rfc3339.to_string()),
            is_edited: true,
            original_created_at: previous.original_created_at.clone(),
        }
    }
}

/// Structured task payload, as supplied by the model's tool calls.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskData {
    #[schemars(description = "Short task title, e.g. 'Finish report'")]
    pub title: String,

    #[schemars(description = "Longer description of what needs to happen")]
    #[serde(default)]
    pub description: String,

    #[schemars(description = "Category, e.g. 'work', 'school', 'personal'")]
    #[serde(default)]
    pub category: String,

    #[schemars(description = "Subject or project the task belongs to")]
    #[serde(default)]
    pub subject: String,

    #[schemars(description = "Whether the task is done")]
    #[serde(default)]
    pub completed: bool,

    #[schemars(description = "Date to work on the task, YYYY-MM-DD")]
    #[serde(default)]
    pub do_date: String,

    #[schemars(description = "Deadline, YYYY-MM-DD")]
    #[serde(default)]
    pub due_date: String,

    #[schemars(description = "Whether the task repeats")]
    #[serde(default)]
    pub recurring: bool,

    #[schemars(description = "Recurrence schedule; required when recurring is true")]
    #[serde(default)]
    pub recurrence_pattern: Option<Recurrence>,
}

/// Recurrence schedule for a repeating task.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recurrence {
    /// Repeats on the named weekdays, e.g. `["tuesday", "thursday"]`.
    Weekly {
        days: Vec<String>,
        #[serde(default)]
        end_date: Option<String>,
    },
    /// Repeats on one day of the month (1–31).
    Monthly {
        day_of_month: u8,
        #[serde(default)]
        end_date: Option<String>,
    },
}

/// Full metadata record persisted for a task document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(flatten)]
    pub meta: EntryMeta,
    #[serde(flatten)]
    pub task: TaskData,
}
