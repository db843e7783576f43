//! Memory and task repositories.
//!
//! Both repositories share the same contract on top of an
//! [`EmbeddingStore`](crate::store::EmbeddingStore): save a batch, search by
//! similarity, and delete/update by key. A key resolves to a stored entry via
//! a short similarity-candidate list followed by an exact match — similarity
//! only narrows the field, equality decides. That keeps a delete from landing
//! on a near-duplicate neighbor.

pub mod memories;
pub mod normalize;
pub mod tasks;
pub mod types;

use thiserror::Error;

use crate::store::StoreError;

/// Repository-level errors. `NotFound` and `Validation` are recovered at the
/// tool boundary and rendered as messages for the model; store and embedding
/// failures stay typed all the way up.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Validation(String),

    #[error("no exact match found for: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("stored metadata malformed for {id}: {detail}")]
    Malformed { id: String, detail: String },
}

/// Outcome of a batched delete: which keys resolved, which did not.
#[derive(Debug, Default, serde::Serialize)]
pub struct BatchReport {
    pub deleted: usize,
    pub messages: Vec<String>,
}

impl BatchReport {
    /// Joined per-key messages, one line each.
    pub fn summary(&self) -> String {
        self.messages.join("\n")
    }
}
