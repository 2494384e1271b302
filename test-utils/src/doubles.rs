//! In-memory [`HotStore`]/[`RelationalStore`]/[`VectorStore`]/[`GraphStore`]/[`FullTextStore`]
//! doubles.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memory_core::storage::{FullTextStore, GraphStore, HotStore, RelationalStore, VectorStore};
use memory_core::types::{Episode, Fact, KnowledgeDocument, Turn};
use memory_core::{Error, Result};
use uuid::Uuid;

/// In-memory [`HotStore`]: one trimmed `Vec<Turn>` per session.
#[derive(Default)]
pub struct InMemoryHotStore {
    windows: Mutex<HashMap<String, Vec<Turn>>>,
}

impl InMemoryHotStore {
    /// Build an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HotStore for InMemoryHotStore {
    async fn push_turn(&self, session_id: &str, turn: &Turn, window_size: usize) -> Result<()> {
        let mut windows = self.windows.lock().unwrap();
        let window = windows.entry(session_id.to_string()).or_default();
        window.push(turn.clone());
        if window.len() > window_size {
            let excess = window.len() - window_size;
            window.drain(0..excess);
        }
        Ok(())
    }

    async fn get_window(&self, session_id: &str) -> Result<Vec<Turn>> {
        Ok(self.windows.lock().unwrap().get(session_id).cloned().unwrap_or_default())
    }

    async fn expire_older_than(&self, session_id: &str, ttl: Duration) -> Result<u64> {
        let mut windows = self.windows.lock().unwrap();
        let Some(window) = windows.get_mut(session_id) else {
            return Ok(0);
        };
        let cutoff = Utc::now() - chrono::Duration::from_std(ttl).unwrap_or_default();
        let before = window.len();
        window.retain(|t| t.timestamp >= cutoff);
        Ok((before - window.len()) as u64)
    }

    async fn clear_session(&self, session_id: &str) -> Result<()> {
        self.windows.lock().unwrap().remove(session_id);
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// In-memory [`RelationalStore`]: turns keyed by session, facts keyed by
/// ID. Supports an optional induced failure for circuit-breaker tests.
#[derive(Default)]
pub struct InMemoryRelationalStore {
    turns: Mutex<HashMap<String, Vec<Turn>>>,
    facts: Mutex<HashMap<Uuid, Fact>>,
    fail: bool,
}

impl InMemoryRelationalStore {
    /// Build an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store whose every method returns
    /// [`Error::TierStorageError`], for exercising fallback/rollback
    /// paths.
    #[must_use]
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            return Err(Error::TierStorageError("induced failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RelationalStore for InMemoryRelationalStore {
    async fn store_turn(&self, turn: &Turn) -> Result<()> {
        self.check()?;
        self.turns.lock().unwrap().entry(turn.session_id.clone()).or_default().push(turn.clone());
        Ok(())
    }

    async fn query_recent_turns(&self, session_id: &str, limit: usize) -> Result<Vec<Turn>> {
        self.check()?;
        let turns = self.turns.lock().unwrap();
        let mut window = turns.get(session_id).cloned().unwrap_or_default();
        if window.len() > limit {
            let start = window.len() - limit;
            window = window.split_off(start);
        }
        Ok(window)
    }

    async fn store_fact(&self, fact: &Fact) -> Result<()> {
        self.check()?;
        self.facts.lock().unwrap().insert(fact.fact_id, fact.clone());
        Ok(())
    }

    async fn get_fact(&self, id: Uuid) -> Result<Option<Fact>> {
        self.check()?;
        Ok(self.facts.lock().unwrap().get(&id).cloned())
    }

    async fn query_facts_by_score(&self, session_id: &str, min_score: f32) -> Result<Vec<Fact>> {
        self.check()?;
        Ok(self
            .facts
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.session_id == session_id && f.ciar_score >= min_score)
            .cloned()
            .collect())
    }

    async fn query_facts_older_than(
        &self,
        session_id: &str,
        before: DateTime<Utc>,
    ) -> Result<Vec<Fact>> {
        self.check()?;
        Ok(self
            .facts
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.session_id == session_id && f.extracted_at <= before)
            .cloned()
            .collect())
    }

    async fn delete_fact(&self, id: Uuid) -> Result<bool> {
        self.check()?;
        Ok(self.facts.lock().unwrap().remove(&id).is_some())
    }

    async fn health_check(&self) -> Result<()> {
        self.check()
    }
}

/// In-memory [`VectorStore`]: a flat `Vec` of `(id, vector, payload)`,
/// nearest-neighbor search by cosine similarity.
#[derive(Default)]
pub struct InMemoryVectorStore {
    entries: Mutex<Vec<(String, Vec<f32>, serde_json::Value)>>,
}

impl InMemoryVectorStore {
    /// Build an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        if a.is_empty() || b.is_empty() || a.len() != b.len() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            0.0
        } else {
            dot / (norm_a * norm_b)
        }
    }

    fn matches_filter(payload: &serde_json::Value, filter: &serde_json::Value) -> bool {
        let Some(filter) = filter.as_object() else { return true };
        let Some(payload) = payload.as_object() else { return false };
        filter.iter().all(|(k, v)| payload.get(k) == Some(v))
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, id: &str, vector: Vec<f32>, payload: serde_json::Value) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|(existing_id, _, _)| existing_id != id);
        entries.push((id.to_string(), vector, payload));
        Ok(())
    }

    async fn search(
        &self,
        query: Vec<f32>,
        k: usize,
        filter: Option<serde_json::Value>,
    ) -> Result<Vec<(String, f32, serde_json::Value)>> {
        let entries = self.entries.lock().unwrap();
        let mut scored: Vec<(String, f32, serde_json::Value)> = entries
            .iter()
            .filter(|(_, _, payload)| {
                filter.as_ref().map_or(true, |f| Self::matches_filter(payload, f))
            })
            .map(|(id, vector, payload)| {
                let score = if query.is_empty() { 1.0 } else { Self::cosine(&query, vector) };
                (id.clone(), score, payload.clone())
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|(existing_id, _, _)| existing_id != id);
        Ok(entries.len() != before)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// In-memory [`GraphStore`]: one node per episode, entities as
/// adjacency lists. `failing()` makes every write fail, for exercising
/// [`EpisodicMemoryTier`](memory_core::tiers::EpisodicMemoryTier)'s
/// compensating rollback.
#[derive(Default)]
pub struct InMemoryGraphStore {
    nodes: Mutex<HashMap<String, Vec<String>>>,
    fail: bool,
}

impl InMemoryGraphStore {
    /// Build an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store whose writes always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn upsert_episode_node(&self, episode: &Episode) -> Result<String> {
        if self.fail {
            return Err(Error::TierStorageError("induced failure".into()));
        }
        let node_id = episode.episode_id.to_string();
        self.nodes.lock().unwrap().insert(node_id.clone(), episode.entities.clone());
        Ok(node_id)
    }

    async fn related(&self, node_id: &str, _depth: usize) -> Result<Vec<String>> {
        if self.fail {
            return Err(Error::TierStorageError("induced failure".into()));
        }
        Ok(self.nodes.lock().unwrap().get(node_id).cloned().unwrap_or_default())
    }

    async fn delete(&self, node_id: &str) -> Result<bool> {
        if self.fail {
            return Err(Error::TierStorageError("induced failure".into()));
        }
        Ok(self.nodes.lock().unwrap().remove(node_id).is_some())
    }

    async fn health_check(&self) -> Result<()> {
        if self.fail {
            return Err(Error::TierStorageError("induced failure".into()));
        }
        Ok(())
    }
}

/// In-memory [`FullTextStore`]: substring match over title+content,
/// sorted by confidence descending.
#[derive(Default)]
pub struct InMemoryFullTextStore {
    documents: Mutex<HashMap<Uuid, KnowledgeDocument>>,
}

impl InMemoryFullTextStore {
    /// Build an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FullTextStore for InMemoryFullTextStore {
    async fn index(&self, document: &KnowledgeDocument) -> Result<()> {
        self.documents.lock().unwrap().insert(document.knowledge_id, document.clone());
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        knowledge_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<KnowledgeDocument>> {
        let query = query.to_lowercase();
        let documents = self.documents.lock().unwrap();
        let mut matches: Vec<KnowledgeDocument> = documents
            .values()
            .filter(|doc| {
                (query.is_empty()
                    || doc.title.to_lowercase().contains(&query)
                    || doc.content.to_lowercase().contains(&query))
                    && knowledge_type.map_or(true, |t| doc.knowledge_type == t)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            b.confidence_score.partial_cmp(&a.confidence_score).unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);
        Ok(matches)
    }

    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeDocument>> {
        Ok(self.documents.lock().unwrap().get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.documents.lock().unwrap().remove(&id).is_some())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::types::{AccessStats, ProvenanceLink, Role};

    #[tokio::test]
    async fn hot_store_trims_window() {
        let store = InMemoryHotStore::new();
        for i in 0..5u64 {
            let turn = Turn::new("s1".into(), i, Role::User, format!("turn {i}"));
            store.push_turn("s1", &turn, 3).await.unwrap();
        }
        let window = store.get_window("s1").await.unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].turn_id, 2);
    }

    #[tokio::test]
    async fn relational_store_failing_rejects_everything() {
        let store = InMemoryRelationalStore::failing();
        let turn = Turn::new("s1".into(), 0, Role::User, "hi".into());
        assert!(store.store_turn(&turn).await.is_err());
        assert!(store.health_check().await.is_err());
    }

    #[tokio::test]
    async fn vector_store_search_ranks_by_similarity() {
        let store = InMemoryVectorStore::new();
        store.upsert("a", vec![1.0, 0.0], serde_json::json!({"tag": "a"})).await.unwrap();
        store.upsert("b", vec![0.0, 1.0], serde_json::json!({"tag": "b"})).await.unwrap();

        let hits = store.search(vec![1.0, 0.0], 1, None).await.unwrap();
        assert_eq!(hits[0].0, "a");
    }

    #[tokio::test]
    async fn graph_store_failing_errors_on_every_call() {
        let store = InMemoryGraphStore::failing();
        let episode = Episode {
            episode_id: Uuid::new_v4(),
            session_id: "s1".into(),
            summary: "test".into(),
            entities: vec![],
            relationships: vec![],
            source_fact_ids: vec![],
            fact_valid_from: Utc::now(),
            fact_valid_to: None,
            source_observation_timestamp: Utc::now(),
            vector_id: None,
            graph_node_id: None,
            embedding: None,
            consolidated_at: Utc::now(),
        };
        assert!(store.upsert_episode_node(&episode).await.is_err());
    }

    #[tokio::test]
    async fn full_text_store_finds_by_substring() {
        let store = InMemoryFullTextStore::new();
        let doc = KnowledgeDocument {
            knowledge_id: Uuid::new_v4(),
            title: "Coffee preference".into(),
            content: "Prefers coffee over tea".into(),
            knowledge_type: "preference".into(),
            confidence_score: 0.9,
            source_episode_ids: vec![Uuid::new_v4()],
            provenance_links: vec![ProvenanceLink {
                episode_id: Uuid::new_v4(),
                note: "note".into(),
            }],
            access: AccessStats::default(),
            usefulness_score: 0.0,
            distilled_at: Utc::now(),
        };
        store.index(&doc).await.unwrap();
        let hits = store.search("coffee", None, 10).await.unwrap();
        assert_eq!(hits.len(), 1);
    }
}
