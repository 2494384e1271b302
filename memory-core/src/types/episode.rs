use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A subject-predicate-object triple extracted during consolidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Subject entity.
    pub subject: String,
    /// Predicate/relation name.
    pub predicate: String,
    /// Object entity.
    pub object: String,
}

/// A narrative summary of a time-cluster of L2 facts, kept in L3
/// (`EpisodicMemoryTier`) with bi-temporal metadata and dual indexing
/// (§3, §4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Unique identifier, assigned by `L3.store`.
    pub episode_id: Uuid,
    /// Owning session.
    pub session_id: String,
    /// Narrative summary, at least 10 characters.
    pub summary: String,
    /// Named entities mentioned across the cluster.
    pub entities: Vec<String>,
    /// Subject-predicate-object triples extracted from the cluster.
    pub relationships: Vec<Relationship>,
    /// L2 fact IDs that make up this episode.
    pub source_fact_ids: Vec<Uuid>,
    /// Earliest timestamp of the described facts (bi-temporal: valid-time
    /// axis).
    pub fact_valid_from: DateTime<Utc>,
    /// Latest timestamp of the described facts, if the cluster spans a
    /// range.
    pub fact_valid_to: Option<DateTime<Utc>>,
    /// When the consolidation that produced this episode ran
    /// (bi-temporal: transaction-time axis).
    pub source_observation_timestamp: DateTime<Utc>,
    /// Opaque ID in the vector store. Set once the dual-index write
    /// completes.
    pub vector_id: Option<String>,
    /// Opaque ID in the graph store. Set once the dual-index write
    /// completes.
    pub graph_node_id: Option<String>,
    /// Precomputed dense embedding, if available.
    pub embedding: Option<Vec<f32>>,
    /// When this episode was consolidated.
    pub consolidated_at: DateTime<Utc>,
}

impl Episode {
    /// Validate the §3 structural invariants.
    ///
    /// Does **not** check `vector_id`/`graph_node_id` presence — that
    /// invariant only holds for *persisted* episodes and is enforced by
    /// `L3.store` at the point of commit (§4.3), not on construction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if `summary` is too short or if
    /// `fact_valid_from > fact_valid_to`.
    pub fn validate(&self) -> Result<()> {
        if self.summary.chars().count() < 10 {
            return Err(Error::ValidationError(
                "episode.summary must be at least 10 characters".into(),
            ));
        }
        if let Some(valid_to) = self.fact_valid_to {
            if self.fact_valid_from > valid_to {
                return Err(Error::ValidationError(
                    "episode.fact_valid_from must be <= fact_valid_to".into(),
                ));
            }
        }
        Ok(())
    }

    /// Whether both halves of the dual index are present — the
    /// persistence invariant from §3/§8 (invariant 4).
    #[must_use]
    pub fn is_fully_indexed(&self) -> bool {
        self.vector_id.is_some() && self.graph_node_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_episode() -> Episode {
        let now = Utc::now();
        Episode {
            episode_id: Uuid::new_v4(),
            session_id: "s1".into(),
            summary: "User discussed scheduling preferences.".into(),
            entities: vec!["standup".into()],
            relationships: vec![],
            source_fact_ids: vec![Uuid::new_v4()],
            fact_valid_from: now - Duration::minutes(10),
            fact_valid_to: Some(now),
            source_observation_timestamp: now,
            vector_id: None,
            graph_node_id: None,
            embedding: None,
            consolidated_at: now,
        }
    }

    #[test]
    fn valid_episode_passes() {
        assert!(sample_episode().validate().is_ok());
    }

    #[test]
    fn short_summary_fails() {
        let mut ep = sample_episode();
        ep.summary = "short".into();
        assert!(ep.validate().is_err());
    }

    #[test]
    fn inverted_temporal_range_fails() {
        let mut ep = sample_episode();
        ep.fact_valid_to = Some(ep.fact_valid_from - Duration::minutes(5));
        assert!(ep.validate().is_err());
    }

    #[test]
    fn not_fully_indexed_until_both_ids_set() {
        let mut ep = sample_episode();
        assert!(!ep.is_fully_indexed());
        ep.vector_id = Some("v1".into());
        assert!(!ep.is_fully_indexed());
        ep.graph_node_id = Some("g1".into());
        assert!(ep.is_fully_indexed());
    }
}
