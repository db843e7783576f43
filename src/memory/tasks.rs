//! Structured task repository.
//!
//! Tasks share the memory repository's CRUD-over-similarity-search contract
//! but carry a structured payload ([`TaskData`]). The embedded and searched
//! text is a rendered multi-line form of the task; the structured fields ride
//! along in the document metadata and come back typed.

use chrono::{NaiveDate, Weekday};
use serde::Serialize;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::{Clock, TimeContext};
use crate::memory::normalize;
use crate::memory::types::{EntryMeta, Recurrence, TaskData, TaskRecord};
use crate::memory::{BatchReport, RepoError};
use crate::store::EmbeddingStore;

/// Result of a batched task save.
#[derive(Debug, Serialize)]
pub struct TaskSaveReport {
    pub status: String,
    pub ids: Vec<String>,
    pub titles: Vec<String>,
    pub message: String,
}

/// One task search result: rendered text plus the typed record.
#[derive(Debug, Clone, Serialize)]
pub struct TaskHit {
    pub content: String,
    #[serde(flatten)]
    pub record: TaskRecord,
}

/// Repository of structured tasks over one embedding store.
pub struct TaskRepository {
    store: EmbeddingStore,
    clock: Clock,
    candidate_k: usize,
}

impl TaskRepository {
    pub fn new(store: EmbeddingStore, clock: Clock, candidate_k: usize) -> Self {
        Self {
            store,
            clock,
            candidate_k,
        }
    }

    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    /// Save a batch of tasks. Every task is validated before anything is
    /// written; the index is persisted once at the end.
    pub async fn save(&mut self, tasks: Vec<TaskData>) -> Result<TaskSaveReport, RepoError> {
        if tasks.is_empty() {
            return Err(RepoError::Validation("no tasks provided".into()));
        }
        for task in &tasks {
            validate_task(task)?;
        }

        let now = self.clock.context();
        let mut ids = Vec::with_capacity(tasks.len());
        let mut titles = Vec::with_capacity(tasks.len());
        for task in tasks {
            let id = Uuid::now_v7().to_string();
            let content = render_task(&task, "Stored on", &now);
            let record = TaskRecord {
                meta: EntryMeta::new(id.clone(), &now.rfc3339),
                task,
            };
            self.store
                .add(
                    &id,
                    &content,
                    &serde_json::to_value(&record).expect("record serializes"),
                )
                .await?;
            titles.push(record.task.title.clone());
            ids.push(id);
        }
        self.store.persist()?;

        info!(count = ids.len(), "tasks saved");
        Ok(TaskSaveReport {
            status: "success".into(),
            message: format!("Tasks stored successfully: {}", titles.join(", ")),
            ids,
            titles,
        })
    }

    /// Nearest-first search. No matches is an empty vec, never an error.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<TaskHit>, RepoError> {
        if query.trim().is_empty() {
            return Err(RepoError::Validation(
                "query must be a non-empty string".into(),
            ));
        }
        if limit == 0 {
            return Err(RepoError::Validation(
                "limit must be a positive integer".into(),
            ));
        }

        let hits = self.store.similarity_search(query, limit).await?;
        debug!(query, found = hits.len(), "task search");

        hits.into_iter()
            .map(|hit| {
                let record = parse_record(&hit.document.id, &hit.document.metadata)?;
                Ok(TaskHit {
                    content: hit.document.content,
                    record,
                })
            })
            .collect()
    }

    /// Delete tasks by id, exact rendered text, or exact title. Unresolved
    /// keys are reported per item without aborting the batch.
    pub async fn delete(&mut self, keys: Vec<String>) -> Result<BatchReport, RepoError> {
        if keys.is_empty() {
            return Err(RepoError::Validation("no delete targets provided".into()));
        }

        let mut report = BatchReport::default();
        for key in &keys {
            match self.resolve(key).await? {
                Some((id, _content, record)) => {
                    self.store.delete(&id)?;
                    report.deleted += 1;
                    report
                        .messages
                        .push(format!("Successfully deleted task: {}", record.task.title));
                }
                None => {
                    report
                        .messages
                        .push(format!("Could not find exact task: {key}"));
                }
            }
        }

        if report.deleted > 0 {
            self.store.persist()?;
        }
        info!(deleted = report.deleted, requested = keys.len(), "tasks deleted");
        Ok(report)
    }

    /// Replace a task while preserving its original creation time. The
    /// replacement gets a new id and an `Updated on:` footer in its rendered
    /// text.
    pub async fn update(
        &mut self,
        old_key: &str,
        updated: TaskData,
    ) -> Result<String, RepoError> {
        validate_task(&updated)?;

        let (old_id, _content, old_record) = self
            .resolve(old_key)
            .await?
            .ok_or_else(|| RepoError::NotFound(old_key.to_string()))?;

        self.store.delete(&old_id)?;

        let now = self.clock.context();
        let content = render_task(&updated, "Updated on", &now);
        let id = Uuid::now_v7().to_string();
        let record = TaskRecord {
            meta: EntryMeta::edited_from(&old_record.meta, id.clone(), &now.rfc3339),
            task: updated,
        };
        self.store
            .add(
                &id,
                &content,
                &serde_json::to_value(&record).expect("record serializes"),
            )
            .await?;
        self.store.persist()?;

        info!(old_id = %old_id, new_id = %id, "task updated");
        Ok(format!("Successfully updated task:\n{content}"))
    }

    /// Resolve a key against the store: direct id lookup first, then a
    /// similarity candidate list decided by exact rendered-text or exact
    /// title equality.
    async fn resolve(
        &self,
        key: &str,
    ) -> Result<Option<(String, String, TaskRecord)>, RepoError> {
        if Uuid::parse_str(key.trim()).is_ok() {
            if let Some(doc) = self.store.get(key.trim())? {
                let record = parse_record(&doc.id, &doc.metadata)?;
                return Ok(Some((doc.id, doc.content, record)));
            }
        }

        let candidates = self
            .store
            .similarity_search(key, self.candidate_k)
            .await?;

        for hit in candidates {
            let record = parse_record(&hit.document.id, &hit.document.metadata)?;
            let exact = normalize::matches(&hit.document.content, key)
                || record.task.title.trim() == key.trim();
            if exact {
                return Ok(Some((hit.document.id, hit.document.content, record)));
            }
        }
        Ok(None)
    }
}

/// Reject malformed tasks before anything touches the store.
fn validate_task(task: &TaskData) -> Result<(), RepoError> {
    if task.title.trim().is_empty() {
        return Err(RepoError::Validation("task title must not be empty".into()));
    }
    for (label, value) in [("do_date", &task.do_date), ("due_date", &task.due_date)] {
        if !value.trim().is_empty()
            && NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_err()
        {
            return Err(RepoError::Validation(format!(
                "{label} must be YYYY-MM-DD, got: {value}"
            )));
        }
    }
    if task.recurring {
        match &task.recurrence_pattern {
            None => {
                return Err(RepoError::Validation(
                    "recurring tasks need a recurrence_pattern".into(),
                ));
            }
            Some(Recurrence::Weekly { days, .. }) => {
                if days.is_empty() {
                    return Err(RepoError::Validation(
                        "weekly recurrence needs at least one day".into(),
                    ));
                }
                for day in days {
                    if Weekday::from_str(day).is_err() {
                        return Err(RepoError::Validation(format!(
                            "unknown weekday in recurrence: {day}"
                        )));
                    }
                }
            }
            Some(Recurrence::Monthly { day_of_month, .. }) => {
                if !(1..=31).contains(day_of_month) {
                    return Err(RepoError::Validation(format!(
                        "day_of_month must be 1-31, got {day_of_month}"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Render the text form of a task — what gets embedded and searched.
fn render_task(task: &TaskData, footer_label: &str, now: &TimeContext) -> String {
    let mut out = format!(
        "Title: {}\nDo: {}\nDue: {}\nCompleted: {}\nDescription: {}\nCategory: {}\nSubject: {}\nRecurring: {}\n",
        task.title.trim(),
        task.do_date,
        task.due_date,
        task.completed,
        task.description,
        task.category,
        task.subject,
        task.recurring,
    );
    if task.recurring {
        match &task.recurrence_pattern {
            Some(Recurrence::Weekly { days, end_date }) => {
                out.push_str(&format!("Recurs weekly on: {}\n", days.join(", ")));
                if let Some(end) = end_date {
                    out.push_str(&format!("Until: {end}\n"));
                }
            }
            Some(Recurrence::Monthly {
                day_of_month,
                end_date,
            }) => {
                out.push_str(&format!("Recurs monthly on day {day_of_month}\n"));
                if let Some(end) = end_date {
                    out.push_str(&format!("Until: {end}\n"));
                }
            }
            None => {}
        }
    }
    out.push_str(&format!("{footer_label}: {}", now.formatted));
    out
}

fn parse_record(id: &str, metadata: &serde_json::Value) -> Result<TaskRecord, RepoError> {
    serde_json::from_value(metadata.clone()).map_err(|e| RepoError::Malformed {
        id: id.to_string(),
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(title: &str) -> TaskData {
        TaskData {
            title: title.into(),
            description: String::new(),
            category: String::new(),
            subject: String::new(),
            completed: false,
            do_date: String::new(),
            due_date: String::new(),
            recurring: false,
            recurrence_pattern: None,
        }
    }

    fn now() -> TimeContext {
        Clock::new("America/Montreal").unwrap().context()
    }

    #[test]
    fn render_includes_all_fields() {
        let mut t = task("Finish report");
        t.do_date = "2024-04-20".into();
        t.due_date = "2024-04-30".into();
        t.description = "Quarterly numbers".into();
        t.category = "work".into();

        let text = render_task(&t, "Stored on", &now());
        assert!(text.starts_with("Title: Finish report\n"));
        assert!(text.contains("Do: 2024-04-20\n"));
        assert!(text.contains("Due: 2024-04-30\n"));
        assert!(text.contains("Completed: false\n"));
        assert!(text.contains("Description: Quarterly numbers\n"));
        assert!(text.contains("Stored on: "));
    }

    #[test]
    fn render_weekly_recurrence() {
        let mut t = task("Water plants");
        t.recurring = true;
        t.recurrence_pattern = Some(Recurrence::Weekly {
            days: vec!["tuesday".into(), "thursday".into()],
            end_date: Some("2024-12-31".into()),
        });

        let text = render_task(&t, "Stored on", &now());
        assert!(text.contains("Recurs weekly on: tuesday, thursday\n"));
        assert!(text.contains("Until: 2024-12-31\n"));
    }

    #[test]
    fn render_monthly_recurrence() {
        let mut t = task("Pay rent");
        t.recurring = true;
        t.recurrence_pattern = Some(Recurrence::Monthly {
            day_of_month: 1,
            end_date: None,
        });

        let text = render_task(&t, "Updated on", &now());
        assert!(text.contains("Recurs monthly on day 1\n"));
        assert!(text.contains("Updated on: "));
    }

    #[test]
    fn validate_rejects_empty_title() {
        assert!(validate_task(&task("  ")).is_err());
    }

    #[test]
    fn validate_rejects_bad_dates() {
        let mut t = task("Dentist");
        t.due_date = "next tuesday".into();
        assert!(validate_task(&t).is_err());

        t.due_date = "2024-06-15".into();
        assert!(validate_task(&t).is_ok());
    }

    #[test]
    fn validate_rejects_recurring_without_pattern() {
        let mut t = task("Gym");
        t.recurring = true;
        assert!(validate_task(&t).is_err());

        t.recurrence_pattern = Some(Recurrence::Weekly {
            days: vec!["monday".into()],
            end_date: None,
        });
        assert!(validate_task(&t).is_ok());
    }

    #[test]
    fn validate_rejects_unknown_weekday() {
        let mut t = task("Gym");
        t.recurring = true;
        t.recurrence_pattern = Some(Recurrence::Weekly {
            days: vec!["someday".into()],
            end_date: None,
        });
        assert!(validate_task(&t).is_err());
    }

    #[test]
    fn validate_rejects_day_of_month_out_of_range() {
        let mut t = task("Invoices");
        t.recurring = true;
        t.recurrence_pattern = Some(Recurrence::Monthly {
            day_of_month: 32,
            end_date: None,
        });
        assert!(validate_task(&t).is_err());
    }
}
