//! [`HotStore`] adapter over a dedicated redb table.
//!
//! Each session's window is kept as a single postcard-encoded
//! `Vec<Turn>` blob under its session id key, mirroring the
//! one-key-per-entity shape the episode/pattern tables use — a window
//! is small (bounded by `window_size`) so a whole-blob rewrite per push
//! is cheap next to a real multi-row table.

use crate::with_db_timeout;
use async_trait::async_trait;
use memory_core::storage::HotStore;
use memory_core::types::Turn;
use memory_core::{Error, Result};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const TURNS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("hot_turns");

/// redb-backed [`HotStore`]: one bounded, TTL-sweepable turn window per
/// session, persisted to a local embedded database.
pub struct RedbHotStore {
    db: Arc<Database>,
}

impl RedbHotStore {
    /// Open (or create) the redb database at `path` and ensure the
    /// turns table exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TierStorageError`] if the database cannot be
    /// created or the table cannot be opened.
    pub async fn new(path: &Path) -> Result<Self> {
        info!("Opening redb hot store at {}", path.display());
        let path_buf = path.to_path_buf();
        let db = with_db_timeout(move || {
            Database::create(&path_buf)
                .map_err(|e| Error::TierStorageError(format!("failed to create redb database: {e}")))
        })
        .await?;

        let store = Self { db: Arc::new(db) };
        store.ensure_table().await?;
        Ok(store)
    }

    async fn ensure_table(&self) -> Result<()> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let write_txn = db.begin_write().map_err(|e| {
                Error::TierStorageError(format!("failed to begin write transaction: {e}"))
            })?;
            {
                let _ = write_txn.open_table(TURNS_TABLE).map_err(|e| {
                    Error::TierStorageError(format!("failed to open turns table: {e}"))
                })?;
            }
            write_txn
                .commit()
                .map_err(|e| Error::TierStorageError(format!("failed to commit transaction: {e}")))?;
            Ok::<(), Error>(())
        })
        .await
    }

    fn read_window(db: &Database, session_id: &str) -> Result<Vec<Turn>> {
        let read_txn = db
            .begin_read()
            .map_err(|e| Error::TierStorageError(format!("failed to begin read transaction: {e}")))?;
        let table = read_txn
            .open_table(TURNS_TABLE)
            .map_err(|e| Error::TierStorageError(format!("failed to open turns table: {e}")))?;

        match table
            .get(session_id)
            .map_err(|e| Error::TierStorageError(format!("failed to read turn window: {e}")))?
        {
            Some(bytes) => postcard::from_bytes(bytes.value())
                .map_err(|e| Error::TierStorageError(format!("failed to deserialize window: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    fn write_window(db: &Database, session_id: &str, turns: &[Turn]) -> Result<()> {
        let write_txn = db
            .begin_write()
            .map_err(|e| Error::TierStorageError(format!("failed to begin write transaction: {e}")))?;
        {
            let mut table = write_txn
                .open_table(TURNS_TABLE)
                .map_err(|e| Error::TierStorageError(format!("failed to open turns table: {e}")))?;
            if turns.is_empty() {
                table.remove(session_id).map_err(|e| {
                    Error::TierStorageError(format!("failed to remove empty window: {e}"))
                })?;
            } else {
                let bytes = postcard::to_allocvec(turns).map_err(|e| {
                    Error::TierStorageError(format!("failed to serialize window: {e}"))
                })?;
                table.insert(session_id, bytes.as_slice()).map_err(|e| {
                    Error::TierStorageError(format!("failed to write turn window: {e}"))
                })?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| Error::TierStorageError(format!("failed to commit transaction: {e}")))
    }
}

#[async_trait]
impl HotStore for RedbHotStore {
    async fn push_turn(&self, session_id: &str, turn: &Turn, window_size: usize) -> Result<()> {
        let db = Arc::clone(&self.db);
        let session_id = session_id.to_string();
        let turn = turn.clone();
        with_db_timeout(move || {
            let mut window = Self::read_window(&db, &session_id)?;
            window.push(turn);
            if window.len() > window_size {
                let drop_count = window.len() - window_size;
                window.drain(0..drop_count);
            }
            Self::write_window(&db, &session_id, &window)
        })
        .await
    }

    async fn get_window(&self, session_id: &str) -> Result<Vec<Turn>> {
        let db = Arc::clone(&self.db);
        let session_id = session_id.to_string();
        with_db_timeout(move || Self::read_window(&db, &session_id)).await
    }

    async fn expire_older_than(&self, session_id: &str, ttl: Duration) -> Result<u64> {
        let db = Arc::clone(&self.db);
        let session_id = session_id.to_string();
        with_db_timeout(move || {
            let window = Self::read_window(&db, &session_id)?;
            let cutoff = chrono::Utc::now() - chrono::Duration::from_std(ttl).unwrap_or_default();
            let before = window.len();
            let kept: Vec<Turn> = window.into_iter().filter(|t| t.timestamp >= cutoff).collect();
            let removed = (before - kept.len()) as u64;
            if removed > 0 {
                Self::write_window(&db, &session_id, &kept)?;
                debug!(session_id, removed, "expired hot-store turns");
            }
            Ok(removed)
        })
        .await
    }

    async fn clear_session(&self, session_id: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let session_id = session_id.to_string();
        with_db_timeout(move || Self::write_window(&db, &session_id, &[])).await
    }

    async fn health_check(&self) -> Result<()> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            db.begin_read()
                .map(|_| ())
                .map_err(|e| Error::TierStorageError(format!("redb health check failed: {e}")))
        })
        .await
    }
}
