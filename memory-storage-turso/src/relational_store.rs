//! [`RelationalStore`] adapter over a Turso/libSQL connection.
//!
//! Turns and facts are kept as narrow indexed columns (session, score,
//! timestamp) plus a JSON payload column, the same shape the episode
//! table uses for its `context`/`steps`/`outcome` fields — structured
//! enough to filter in SQL, permissive enough to evolve the record
//! shape without a migration per field.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memory_core::storage::RelationalStore;
use memory_core::types::{Fact, Turn};
use memory_core::{Error, Result};
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const CREATE_TURNS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS turns (
    session_id TEXT NOT NULL,
    turn_id INTEGER NOT NULL,
    payload TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (session_id, turn_id)
)
"#;

const CREATE_TURNS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_turns_session_created
    ON turns (session_id, created_at)
"#;

const CREATE_FACTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS facts (
    fact_id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    ciar_score REAL NOT NULL,
    extracted_at INTEGER NOT NULL,
    payload TEXT NOT NULL
)
"#;

const CREATE_FACTS_SCORE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_facts_session_score
    ON facts (session_id, ciar_score)
"#;

const CREATE_FACTS_EXTRACTED_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_facts_session_extracted
    ON facts (session_id, extracted_at)
"#;

/// Turso/libSQL-backed [`RelationalStore`]: the durable write-through
/// target for L1 turns and the system of record for L2 facts.
pub struct TursoRelationalStore {
    db: Arc<Database>,
}

impl TursoRelationalStore {
    /// Connect to `url` (`libsql://`, `file:`, or `:memory:`) and create
    /// the turns/facts schema if it doesn't already exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] for a disallowed URL scheme or
    /// a missing remote auth token, [`Error::TierStorageError`] if the
    /// connection or schema creation fails.
    pub async fn connect(url: &str, token: &str) -> Result<Self> {
        if !url.starts_with("libsql://") && !url.starts_with("file:") && !url.starts_with(":memory:")
        {
            return Err(Error::ValidationError(format!(
                "unsupported database url scheme: {url}"
            )));
        }
        if url.starts_with("libsql://") && token.trim().is_empty() {
            return Err(Error::ValidationError(
                "authentication token required for remote turso connections".into(),
            ));
        }

        info!("connecting to turso relational store at {}", url);
        let db = if url.starts_with("libsql://") {
            Builder::new_remote(url.to_string(), token.to_string())
                .build()
                .await
        } else {
            let path = url.strip_prefix("file:").unwrap_or(url);
            Builder::new_local(path).build().await
        }
        .map_err(|e| Error::TierStorageError(format!("failed to connect to turso: {e}")))?;

        let store = Self { db: Arc::new(db) };
        store.initialize_schema().await?;
        Ok(store)
    }

    fn connection(&self) -> Result<Connection> {
        self.db
            .connect()
            .map_err(|e| Error::TierStorageError(format!("failed to open connection: {e}")))
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection()?;
        for statement in [
            CREATE_TURNS_TABLE,
            CREATE_TURNS_INDEX,
            CREATE_FACTS_TABLE,
            CREATE_FACTS_SCORE_INDEX,
            CREATE_FACTS_EXTRACTED_INDEX,
        ] {
            conn.execute(statement, ())
                .await
                .map_err(|e| Error::TierStorageError(format!("failed to initialize schema: {e}")))?;
        }
        Ok(())
    }

    fn turn_to_row(turn: &Turn) -> Result<(String, i64, String, i64)> {
        let payload = serde_json::to_string(turn)
            .map_err(|e| Error::TierStorageError(format!("failed to serialize turn: {e}")))?;
        Ok((
            turn.session_id.clone(),
            turn.turn_id as i64,
            payload,
            turn.timestamp.timestamp(),
        ))
    }

    fn row_to_turn(payload: &str) -> Result<Turn> {
        serde_json::from_str(payload)
            .map_err(|e| Error::TierStorageError(format!("failed to deserialize turn: {e}")))
    }

    fn row_to_fact(payload: &str) -> Result<Fact> {
        serde_json::from_str(payload)
            .map_err(|e| Error::TierStorageError(format!("failed to deserialize fact: {e}")))
    }
}

#[async_trait]
impl RelationalStore for TursoRelationalStore {
    async fn store_turn(&self, turn: &Turn) -> Result<()> {
        let conn = self.connection()?;
        let (session_id, turn_id, payload, created_at) = Self::turn_to_row(turn)?;
        conn.execute(
            "INSERT OR REPLACE INTO turns (session_id, turn_id, payload, created_at) VALUES (?, ?, ?, ?)",
            libsql::params![session_id, turn_id, payload, created_at],
        )
        .await
        .map_err(|e| Error::TierStorageError(format!("failed to store turn: {e}")))?;
        Ok(())
    }

    async fn query_recent_turns(&self, session_id: &str, limit: usize) -> Result<Vec<Turn>> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT payload FROM turns WHERE session_id = ? ORDER BY turn_id DESC LIMIT ?",
                libsql::params![session_id.to_string(), limit as i64],
            )
            .await
            .map_err(|e| Error::TierStorageError(format!("failed to query recent turns: {e}")))?;

        let mut turns = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| Error::TierStorageError(format!("failed to fetch turn row: {e}")))?
        {
            let payload: String = row
                .get(0)
                .map_err(|e| Error::TierStorageError(format!("malformed turn row: {e}")))?;
            turns.push(Self::row_to_turn(&payload)?);
        }
        turns.reverse();
        Ok(turns)
    }

    async fn store_fact(&self, fact: &Fact) -> Result<()> {
        let conn = self.connection()?;
        let payload = serde_json::to_string(fact)
            .map_err(|e| Error::TierStorageError(format!("failed to serialize fact: {e}")))?;
        conn.execute(
            "INSERT OR REPLACE INTO facts (fact_id, session_id, ciar_score, extracted_at, payload) VALUES (?, ?, ?, ?, ?)",
            libsql::params![
                fact.fact_id.to_string(),
                fact.session_id.clone(),
                f64::from(fact.ciar_score),
                fact.extracted_at.timestamp(),
                payload,
            ],
        )
        .await
        .map_err(|e| Error::TierStorageError(format!("failed to store fact: {e}")))?;
        Ok(())
    }

    async fn get_fact(&self, id: Uuid) -> Result<Option<Fact>> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT payload FROM facts WHERE fact_id = ?",
                libsql::params![id.to_string()],
            )
            .await
            .map_err(|e| Error::TierStorageError(format!("failed to query fact: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| Error::TierStorageError(format!("failed to fetch fact row: {e}")))?
        {
            Some(row) => {
                let payload: String = row
                    .get(0)
                    .map_err(|e| Error::TierStorageError(format!("malformed fact row: {e}")))?;
                Ok(Some(Self::row_to_fact(&payload)?))
            }
            None => Ok(None),
        }
    }

    async fn query_facts_by_score(&self, session_id: &str, min_score: f32) -> Result<Vec<Fact>> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT payload FROM facts WHERE session_id = ? AND ciar_score >= ? ORDER BY ciar_score DESC",
                libsql::params![session_id.to_string(), f64::from(min_score)],
            )
            .await
            .map_err(|e| Error::TierStorageError(format!("failed to query facts by score: {e}")))?;

        let mut facts = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| Error::TierStorageError(format!("failed to fetch fact row: {e}")))?
        {
            let payload: String = row
                .get(0)
                .map_err(|e| Error::TierStorageError(format!("malformed fact row: {e}")))?;
            facts.push(Self::row_to_fact(&payload)?);
        }
        debug!(session_id, count = facts.len(), "facts above CIAR threshold");
        Ok(facts)
    }

    async fn query_facts_older_than(
        &self,
        session_id: &str,
        before: DateTime<Utc>,
    ) -> Result<Vec<Fact>> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT payload FROM facts WHERE session_id = ? AND extracted_at <= ?",
                libsql::params![session_id.to_string(), before.timestamp()],
            )
            .await
            .map_err(|e| Error::TierStorageError(format!("failed to query stale facts: {e}")))?;

        let mut facts = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| Error::TierStorageError(format!("failed to fetch fact row: {e}")))?
        {
            let payload: String = row
                .get(0)
                .map_err(|e| Error::TierStorageError(format!("malformed fact row: {e}")))?;
            facts.push(Self::row_to_fact(&payload)?);
        }
        Ok(facts)
    }

    async fn delete_fact(&self, id: Uuid) -> Result<bool> {
        let conn = self.connection()?;
        let affected = conn
            .execute(
                "DELETE FROM facts WHERE fact_id = ?",
                libsql::params![id.to_string()],
            )
            .await
            .map_err(|e| Error::TierStorageError(format!("failed to delete fact: {e}")))?;
        Ok(affected > 0)
    }

    async fn health_check(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.query("SELECT 1", ())
            .await
            .map_err(|e| Error::TierStorageError(format!("turso health check failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::types::{AccessStats, CiarComponents, FactType, Role};

    async fn store() -> TursoRelationalStore {
        TursoRelationalStore::connect(":memory:", "").await.unwrap()
    }

    fn turn(session: &str, id: u64) -> Turn {
        Turn::new(session.to_string(), id, Role::User, format!("turn {id}"))
    }

    fn fact(session: &str, score: f32) -> Fact {
        Fact {
            fact_id: Uuid::new_v4(),
            session_id: session.to_string(),
            content: "likes dark mode".to_string(),
            fact_type: FactType::Preference,
            fact_category: "ui".to_string(),
            ciar: CiarComponents {
                certainty: 0.9,
                impact: 0.8,
                age_decay: 1.0,
                recency_boost: 1.0,
            },
            ciar_score: score,
            access: AccessStats::default(),
            extracted_at: Utc::now(),
            source_turn_ids: vec![0],
            topic_segment_id: None,
            topic_label: None,
            source_uri: None,
        }
    }

    #[tokio::test]
    async fn store_and_query_recent_turns() {
        let store = store().await;
        store.store_turn(&turn("s1", 0)).await.unwrap();
        store.store_turn(&turn("s1", 1)).await.unwrap();

        let turns = store.query_recent_turns("s1", 10).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].turn_id, 0);
        assert_eq!(turns[1].turn_id, 1);
    }

    #[tokio::test]
    async fn store_and_filter_facts_by_score() {
        let store = store().await;
        store.store_fact(&fact("s1", 0.9)).await.unwrap();
        store.store_fact(&fact("s1", 0.2)).await.unwrap();

        let high = store.query_facts_by_score("s1", 0.5).await.unwrap();
        assert_eq!(high.len(), 1);
    }

    #[tokio::test]
    async fn get_and_delete_fact_roundtrip() {
        let store = store().await;
        let f = fact("s1", 0.9);
        store.store_fact(&f).await.unwrap();

        let fetched = store.get_fact(f.fact_id).await.unwrap();
        assert!(fetched.is_some());

        assert!(store.delete_fact(f.fact_id).await.unwrap());
        assert!(store.get_fact(f.fact_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn health_check_succeeds_against_in_memory_db() {
        let store = store().await;
        store.health_check().await.unwrap();
    }
}
