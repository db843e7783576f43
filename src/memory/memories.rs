//! Free-text memory repository.
//!
//! Save, search, delete, and update over an [`EmbeddingStore`], with
//! edit-preserving metadata: an update physically replaces the entry but the
//! replacement keeps the original creation time.

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::memory::normalize;
use crate::memory::types::EntryMeta;
use crate::memory::{BatchReport, RepoError};
use crate::store::EmbeddingStore;

/// Result of a batched save.
#[derive(Debug, Serialize)]
pub struct SaveReport {
    pub status: String,
    pub ids: Vec<String>,
    pub message: String,
}

/// One search result with its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryHit {
    pub content: String,
    #[serde(flatten)]
    pub meta: EntryMeta,
}

/// Repository of free-text memories over one embedding store.
pub struct MemoryRepository {
    store: EmbeddingStore,
    clock: Clock,
    candidate_k: usize,
}

impl MemoryRepository {
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

    /// Save a batch of memories. Validation covers the whole batch before any
    /// entry is written; the index is persisted once at the end.
    pub async fn save(&mut self, memories: Vec<String>) -> Result<SaveReport, RepoError> {
        if memories.is_empty() {
            return Err(RepoError::Validation("no memories provided".into()));
        }
        for memory in &memories {
            if memory.trim().is_empty() {
                return Err(RepoError::Validation(
                    "memory must be a non-empty string".into(),
                ));
            }
        }

        let now = self.clock.context();
        let mut ids = Vec::with_capacity(memories.len());
        for memory in &memories {
            let id = Uuid::now_v7().to_string();
            let meta = EntryMeta::new(id.clone(), &now.rfc3339);
            self.store
                .add(&id, memory.trim(), &serde_json::to_value(&meta).expect("meta serializes"))
                .await?;
            ids.push(id);
        }
        self.store.persist()?;

        info!(count = ids.len(), "memories saved");
        Ok(SaveReport {
            status: "success".into(),
            message: format!("Saved {} memor{}", ids.len(), plural_y(ids.len())),
            ids,
        })
    }

    /// Nearest-first search. No matches is an empty vec, never an error.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MemoryHit>, RepoError> {
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
        debug!(query, found = hits.len(), "memory search");

        hits.into_iter()
            .map(|hit| {
                let meta = parse_meta(&hit.document.id, &hit.document.metadata)?;
                Ok(MemoryHit {
                    content: hit.document.content,
                    meta,
                })
            })
            .collect()
    }

    /// Delete one or more memories by exact text (or id). Keys that resolve
    /// are deleted; keys that do not are reported per item — a bad key never
    /// aborts the rest of the batch.
    pub async fn delete(&mut self, keys: Vec<String>) -> Result<BatchReport, RepoError> {
        if keys.is_empty() {
            return Err(RepoError::Validation("no delete targets provided".into()));
        }

        let mut report = BatchReport::default();
        for key in &keys {
            match self.resolve(key).await? {
                Some((id, content, _meta)) => {
                    self.store.delete(&id)?;
                    report.deleted += 1;
                    report.messages.push(format!("Successfully deleted: {content}"));
                }
                None => {
                    report
                        .messages
                        .push(format!("Could not find exact memory: {key}"));
                }
            }
        }

        if report.deleted > 0 {
            self.store.persist()?;
        }
        info!(deleted = report.deleted, requested = keys.len(), "memories deleted");
        Ok(report)
    }

    /// Replace a memory while preserving its original creation time. The
    /// replacement gets a new id and an edit annotation in its content.
    pub async fn update(
        &mut self,
        old_text: &str,
        new_text: &str,
    ) -> Result<String, RepoError> {
        if new_text.trim().is_empty() {
            return Err(RepoError::Validation(
                "replacement memory must be a non-empty string".into(),
            ));
        }

        let (old_id, _content, old_meta) = self
            .resolve(old_text)
            .await?
            .ok_or_else(|| RepoError::NotFound(old_text.to_string()))?;

        self.store.delete(&old_id)?;

        let now = self.clock.context();
        let edited = format!("{} (Edited on {})", new_text.trim(), now.rfc3339);
        let id = Uuid::now_v7().to_string();
        let meta = EntryMeta::edited_from(&old_meta, id.clone(), &now.rfc3339);
        self.store
            .add(&id, &edited, &serde_json::to_value(&meta).expect("meta serializes"))
            .await?;
        self.store.persist()?;

        info!(old_id = %old_id, new_id = %id, "memory updated");
        Ok(format!("Successfully updated memory: {edited}"))
    }

    /// Resolve a key to a stored memory: similarity search narrows to a
    /// candidate short-list, exact normalized equality (or an id match)
    /// decides.
    async fn resolve(
        &self,
        key: &str,
    ) -> Result<Option<(String, String, EntryMeta)>, RepoError> {
        // An id key is looked up directly; no similarity needed.
        if Uuid::parse_str(key.trim()).is_ok() {
            if let Some(doc) = self.store.get(key.trim())? {
                let meta = parse_meta(&doc.id, &doc.metadata)?;
                return Ok(Some((doc.id, doc.content, meta)));
            }
        }

        let candidates = self
            .store
            .similarity_search(key, self.candidate_k)
            .await?;

        for hit in candidates {
            if !normalize::matches(&hit.document.content, key) {
                continue;
            }
            let meta = parse_meta(&hit.document.id, &hit.document.metadata)?;
            return Ok(Some((hit.document.id, hit.document.content, meta)));
        }
        Ok(None)
    }
}

fn parse_meta(id: &str, metadata: &serde_json::Value) -> Result<EntryMeta, RepoError> {
    serde_json::from_value(metadata.clone()).map_err(|e| RepoError::Malformed {
        id: id.to_string(),
        detail: e.to_string(),
    })
}

fn plural_y(n: usize) -> &'static str {
    if n == 1 {
        "y"
    } else {
        "ies"
    }
}
