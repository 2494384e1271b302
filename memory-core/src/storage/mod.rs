//! # Storage Abstraction
//!
//! The five storage adapter contracts consumed by the tiers (§6):
//! `HotStore` (L1 hot), `RelationalStore` (L1 cold / L2), `VectorStore`
//! (L3a), `GraphStore` (L3b), `FullTextStore` (L4). Each is a thin,
//! capability-specific trait rather than one do-everything interface —
//! adapters implement only the contract their backend actually serves
//! (redb as `HotStore`, Turso as `RelationalStore`, in-memory doubles
//! for the rest in tests).
//!
//! Real vector/graph/full-text backends (Qdrant, Neo4j, Typesense) are
//! out of scope for this crate; only the trait contracts and reference
//! test doubles live here.

pub mod circuit_breaker;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{Episode, Fact, KnowledgeDocument, Turn};
use crate::Result;

/// L1 hot storage: bounded, TTL'd turn windows keyed by session.
///
/// Models a Redis-analogue list store: `push_turn` is an atomic
/// push-then-trim so the window never exceeds `window_size`.
#[async_trait]
pub trait HotStore: Send + Sync {
    /// Append a turn to `session_id`'s window, trimming the oldest
    /// entries beyond `window_size`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn push_turn(&self, session_id: &str, turn: &Turn, window_size: usize) -> Result<()>;

    /// Read the current window for a session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn get_window(&self, session_id: &str) -> Result<Vec<Turn>>;

    /// Drop turns older than `ttl` relative to now. Returns the number
    /// of turns removed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn expire_older_than(&self, session_id: &str, ttl: std::time::Duration) -> Result<u64>;

    /// Remove the entire window for a session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn clear_session(&self, session_id: &str) -> Result<()>;

    /// Lightweight connectivity probe for health reporting.
    async fn health_check(&self) -> Result<()>;
}

/// Relational storage for L1-cold write-through and L2 working memory:
/// CRUD plus filtered query by session, fact type, and CIAR threshold.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Durably persist a turn (L1 cold write-through path).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn store_turn(&self, turn: &Turn) -> Result<()>;

    /// Fetch the most recent `limit` turns for a session, chronological
    /// order, used by L1's hot-store-miss fallback path.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn query_recent_turns(&self, session_id: &str, limit: usize) -> Result<Vec<Turn>>;

    /// Insert or update a fact.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn store_fact(&self, fact: &Fact) -> Result<()>;

    /// Fetch a fact by ID.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn get_fact(&self, id: Uuid) -> Result<Option<Fact>>;

    /// Facts for a session whose CIAR score is at least `min_score`,
    /// used by the consolidation window scan.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn query_facts_by_score(
        &self,
        session_id: &str,
        min_score: f32,
    ) -> Result<Vec<Fact>>;

    /// Facts extracted on or before `before`, still present regardless
    /// of score — used by the TTL sweep.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn query_facts_older_than(
        &self,
        session_id: &str,
        before: DateTime<Utc>,
    ) -> Result<Vec<Fact>>;

    /// Delete a fact by ID. Returns `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn delete_fact(&self, id: Uuid) -> Result<bool>;

    /// Lightweight connectivity probe for health reporting.
    async fn health_check(&self) -> Result<()>;
}

/// L3a vector storage: one collection per deployment, upsert by ID
/// with payload, k-NN search with payload filter.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite the vector and payload for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn upsert(&self, id: &str, vector: Vec<f32>, payload: serde_json::Value) -> Result<()>;

    /// Nearest-neighbor search, optionally filtered by a payload
    /// predicate expressed as a JSON fragment the adapter understands.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn search(
        &self,
        query: Vec<f32>,
        k: usize,
        filter: Option<serde_json::Value>,
    ) -> Result<Vec<(String, f32, serde_json::Value)>>;

    /// Remove a vector by ID. Returns `true` if present.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Lightweight connectivity probe for health reporting.
    async fn health_check(&self) -> Result<()>;
}

/// L3b graph storage: episode nodes with labeled relationships.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create (or overwrite) a node for an episode, with its entities
    /// and relationships attached as edges/properties.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn upsert_episode_node(&self, episode: &Episode) -> Result<String>;

    /// Fetch related episode IDs by traversing from `node_id`, up to
    /// `depth` hops.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn related(&self, node_id: &str, depth: usize) -> Result<Vec<String>>;

    /// Remove a node and its incident edges ("detach delete").
    /// Returns `true` if present.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn delete(&self, node_id: &str) -> Result<bool>;

    /// Lightweight connectivity probe for health reporting.
    async fn health_check(&self) -> Result<()>;
}

/// L4 full-text storage: knowledge documents searchable by query,
/// facet, and sortable confidence.
#[async_trait]
pub trait FullTextStore: Send + Sync {
    /// Index (or reindex) a knowledge document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn index(&self, document: &KnowledgeDocument) -> Result<()>;

    /// Full-text search with an optional `knowledge_type` facet filter,
    /// sorted by confidence descending.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn search(
        &self,
        query: &str,
        knowledge_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<KnowledgeDocument>>;

    /// Fetch a document by ID.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeDocument>>;

    /// Remove a document by ID. Returns `true` if present.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Lightweight connectivity probe for health reporting.
    async fn health_check(&self) -> Result<()>;
}
