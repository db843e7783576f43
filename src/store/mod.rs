//! Persistent similarity index over text documents.
//!
//! An [`EmbeddingStore`] is one directory on disk holding a SQLite database:
//! a `documents` table for content + metadata and a sqlite-vec `documents_vec`
//! table for KNN search. The store owns its [`Embedder`] — callers hand it
//! text, never vectors.
//!
//! Opening a store never fails just because nothing exists yet: the first-run
//! path creates the database, seeds it with a placeholder document so the
//! index is never empty, and reports [`LoadOutcome::Created`]. A database that
//! cannot be read is moved aside and rebuilt ([`LoadOutcome::Recovered`]).

pub mod schema;

use rusqlite::{params, Connection};
use sqlite_vec::sqlite3_vec_init;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use thiserror::Error;
use tracing::{info, warn};

use crate::embedding::{EmbedError, Embedder};

static SQLITE_VEC_INIT: Once = Once::new();

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Convert an f32 embedding slice to raw bytes for sqlite-vec.
fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            embedding.len() * std::mem::size_of::<f32>(),
        )
    }
}

/// Filename of the index database inside a store directory.
const INDEX_FILE: &str = "index.db";

/// Content of the placeholder document seeded into a brand-new store.
const SEED_CONTENT: &str = "Store initialized.";

/// How an [`EmbeddingStore::open_or_create`] call found its database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// An existing, structurally valid database was loaded.
    Loaded,
    /// No database existed; a fresh one was created and seeded.
    Created,
    /// An existing database could not be read; it was moved aside and a
    /// fresh one was created in its place.
    Recovered,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Embedding(#[from] EmbedError),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored document: content plus its caller-supplied metadata.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: serde_json::Value,
}

/// One similarity-search result, nearest-first ordering by `distance`.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub document: Document,
    pub distance: f64,
}

/// Durable, similarity-searchable index over text documents.
pub struct EmbeddingStore {
    conn: Connection,
    embedder: Arc<dyn Embedder>,
    db_path: PathBuf,
}

impl EmbeddingStore {
    /// Open the store at `dir`, creating and seeding it if nothing valid
    /// exists there. Missing files are the expected first-run path, never an
    /// error.
    pub async fn open_or_create(
        dir: impl AsRef<Path>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<(Self, LoadOutcome), StoreError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let db_path = dir.join(INDEX_FILE);
        let existed = db_path.exists();

        load_sqlite_vec();

        let dimensions = embedder.dimensions();
        let (conn, outcome) = match open_and_init(&db_path, dimensions) {
            Ok(conn) => {
                let outcome = if existed {
                    LoadOutcome::Loaded
                } else {
                    LoadOutcome::Created
                };
                (conn, outcome)
            }
            Err(err) if existed => {
                warn!(
                    path = %db_path.display(),
                    error = %err,
                    "index unreadable — moving it aside and rebuilding"
                );
                quarantine(&db_path)?;
                (open_and_init(&db_path, dimensions)?, LoadOutcome::Recovered)
            }
            Err(err) => return Err(err),
        };

        if let Ok(Some(stored)) = schema::stored_dimensions(&conn) {
            if stored != dimensions {
                warn!(
                    stored,
                    configured = dimensions,
                    "embedding dimension changed since this index was created"
                );
            }
        }

        let mut store = Self {
            conn,
            embedder,
            db_path,
        };
        store.seed_if_empty().await?;

        info!(path = %store.db_path.display(), ?outcome, "store ready");
        Ok((store, outcome))
    }

    /// Insert one document. The content is embedded here; the index is not
    /// checkpointed — call [`persist`](Self::persist) after a batch.
    pub async fn add(
        &mut self,
        id: &str,
        content: &str,
        metadata: &serde_json::Value,
    ) -> Result<(), StoreError> {
        self.insert(id, content, metadata, false).await
    }

    /// Nearest-first KNN search. Returns at most `k` hits; the bootstrap
    /// placeholder is never among them. Read-only.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed(query).await?;

        // Fetch one extra candidate so the seed row can be dropped without
        // shrinking the caller's k.
        let mut stmt = self.conn.prepare(
            "SELECT id, distance FROM documents_vec \
             WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
        )?;
        let candidates: Vec<(String, f64)> = stmt
            .query_map(
                params![embedding_to_bytes(&embedding), (k + 1) as i64],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);

        let mut hits = Vec::new();
        for (id, distance) in candidates {
            let row: Option<(String, String, i64)> = {
                use rusqlite::OptionalExtension;
                self.conn
                    .query_row(
                        "SELECT content, metadata, seed FROM documents WHERE id = ?1",
                        params![id],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                    )
                    .optional()?
            };
            let Some((content, metadata, seed)) = row else {
                continue;
            };
            if seed != 0 {
                continue;
            }
            let metadata = serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null);
            hits.push(SearchHit {
                document: Document {
                    id,
                    content,
                    metadata,
                },
                distance,
            });
            if hits.len() == k {
                break;
            }
        }
        Ok(hits)
    }

    /// Fetch one document by id. The bootstrap placeholder is not visible.
    pub fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        use rusqlite::OptionalExtension;
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT content, metadata FROM documents WHERE id = ?1 AND seed = 0",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row.map(|(content, metadata)| Document {
            id: id.to_string(),
            content,
            metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
        }))
    }

    /// Remove one document by id. The id must exist.
    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let rows = self
            .conn
            .execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.conn
            .execute("DELETE FROM documents_vec WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Flush the index to stable storage. Idempotent; overwrites in place.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        self.conn
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        Ok(())
    }

    /// Number of live documents, excluding the bootstrap placeholder.
    pub fn len(&self) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE seed = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Path of the underlying database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn insert(
        &mut self,
        id: &str,
        content: &str,
        metadata: &serde_json::Value,
        seed: bool,
    ) -> Result<(), StoreError> {
        let embedding = self.embedder.embed(content).await?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO documents (id, content, metadata, seed, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, content, metadata.to_string(), seed as i64, now],
        )?;
        self.conn.execute(
            "INSERT INTO documents_vec (id, embedding) VALUES (?1, ?2)",
            params![id, embedding_to_bytes(&embedding)],
        )?;
        Ok(())
    }

    /// Seed the placeholder document when the documents table is empty, so a
    /// freshly created (or wiped) index always has at least one entry.
    async fn seed_if_empty(&mut self) -> Result<(), StoreError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }
        let id = uuid::Uuid::now_v7().to_string();
        self.insert(&id, SEED_CONTENT, &serde_json::json!({"seed": true}), true)
            .await?;
        self.persist()?;
        Ok(())
    }
}

fn open_and_init(db_path: &Path, dimensions: usize) -> Result<Connection, StoreError> {
    let conn = Connection::open(db_path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    schema::init_schema(&conn, dimensions)?;
    // Probe the tables so a valid SQLite file with a foreign schema is caught
    // here, inside the recovery envelope.
    conn.query_row("SELECT COUNT(*) FROM documents", [], |_| Ok(()))?;
    Ok(conn)
}

/// Move an unreadable database (and any WAL sidecars) out of the way.
fn quarantine(db_path: &Path) -> Result<(), StoreError> {
    let corrupt = db_path.with_extension("db.corrupt");
    std::fs::rename(db_path, &corrupt)?;
    for suffix in ["-wal", "-shm"] {
        let sidecar = PathBuf::from(format!("{}{suffix}", db_path.display()));
        if sidecar.exists() {
            let _ = std::fs::remove_file(sidecar);
        }
    }
    warn!(moved_to = %corrupt.display(), "quarantined unreadable index");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Deterministic test embedder: token-count hashing into a small vector.
    /// Identical text maps to identical vectors; overlapping text is near.
    struct HashEmbedder;

    #[async_trait]
    impl Embedder for HashEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            let mut v = vec![0.0f32; 16];
            for token in text.to_lowercase().split_whitespace() {
                let mut h: u64 = 0xcbf29ce484222325;
                for b in token.bytes() {
                    h ^= b as u64;
                    h = h.wrapping_mul(0x100000001b3);
                }
                v[(h % 16) as usize] += 1.0;
            }
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                v.iter_mut().for_each(|x| *x /= norm);
            }
            Ok(v)
        }

        fn dimensions(&self) -> usize {
            16
        }
    }

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(HashEmbedder)
    }

    #[tokio::test]
    async fn create_then_load() {
        let dir = tempfile::tempdir().unwrap();

        let (store, outcome) = EmbeddingStore::open_or_create(dir.path(), embedder())
            .await
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Created);
        assert_eq!(store.len().unwrap(), 0); // seed is not a live document
        drop(store);

        let (_store, outcome) = EmbeddingStore::open_or_create(dir.path(), embedder())
            .await
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded);
    }

    #[tokio::test]
    async fn garbage_file_is_recovered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), b"this is not a database").unwrap();

        let (mut store, outcome) = EmbeddingStore::open_or_create(dir.path(), embedder())
            .await
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Recovered);
        assert!(dir.path().join("index.db.corrupt").exists());

        // The rebuilt store works
        store
            .add("a", "hello world", &serde_json::json!({}))
            .await
            .unwrap();
        store.persist().unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn add_search_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _) = EmbeddingStore::open_or_create(dir.path(), embedder())
            .await
            .unwrap();

        store
            .add("a", "the cat sat on the mat", &serde_json::json!({"k": 1}))
            .await
            .unwrap();
        store
            .add("b", "quarterly report deadline", &serde_json::json!({"k": 2}))
            .await
            .unwrap();
        store.persist().unwrap();

        let hits = store
            .similarity_search("the cat sat on the mat", 2)
            .await
            .unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].document.id, "a");
        assert_eq!(hits[0].document.metadata["k"], 1);
        assert!(hits[0].distance < 1e-4);
    }

    #[tokio::test]
    async fn seed_document_is_never_returned() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _) = EmbeddingStore::open_or_create(dir.path(), embedder())
            .await
            .unwrap();

        // Even a query matching the seed text exactly must not surface it.
        let hits = store.similarity_search(SEED_CONTENT, 10).await.unwrap();
        assert!(hits.is_empty());

        store
            .add("a", "something real", &serde_json::json!({}))
            .await
            .unwrap();
        let hits = store.similarity_search("anything at all", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.id, "a");
    }

    #[tokio::test]
    async fn delete_removes_exactly_one() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _) = EmbeddingStore::open_or_create(dir.path(), embedder())
            .await
            .unwrap();

        store.add("a", "alpha", &serde_json::json!({})).await.unwrap();
        store.add("b", "beta", &serde_json::json!({})).await.unwrap();
        store.delete("a").unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert!(matches!(
            store.delete("a"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn persist_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _) = EmbeddingStore::open_or_create(dir.path(), embedder())
            .await
            .unwrap();
        store
            .add("a", "durable fact", &serde_json::json!({"n": 7}))
            .await
            .unwrap();
        store.persist().unwrap();
        store.persist().unwrap();
        drop(store);

        // Reload and verify nothing was lost or duplicated.
        let (store, outcome) = EmbeddingStore::open_or_create(dir.path(), embedder())
            .await
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(store.len().unwrap(), 1);
        let hits = store.similarity_search("durable fact", 5).await.unwrap();
        assert_eq!(hits[0].document.content, "durable fact");
        assert_eq!(hits[0].document.metadata["n"], 7);
    }
}
