//! L2 `WorkingMemoryTier` (§4.2): session-scoped facts queryable by
//! CIAR score, with 7-day TTL and access-driven recency boosting.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::ciar::CiarScorer;
use crate::error::Error;
use crate::storage::RelationalStore;
use crate::types::{Fact, FactType, L2Config};
use crate::Result;

/// Working-memory store for CIAR-scored facts promoted from L1.
pub struct WorkingMemoryTier {
    store: Arc<dyn RelationalStore>,
    scorer: CiarScorer,
    config: L2Config,
}

/// Filters accepted by [`WorkingMemoryTier::query`].
#[derive(Debug, Clone, Default)]
pub struct FactQuery {
    /// Restrict to a session.
    pub session_id: Option<String>,
    /// Restrict to a fact type.
    pub fact_type: Option<FactType>,
    /// Minimum CIAR score (overrides the tier's configured threshold
    /// if higher).
    pub min_ciar: Option<f32>,
    /// Cap on returned facts.
    pub limit: Option<usize>,
}

impl WorkingMemoryTier {
    /// Build a tier over the given relational store, scorer, and
    /// config.
    #[must_use]
    pub fn new(store: Arc<dyn RelationalStore>, scorer: CiarScorer, config: L2Config) -> Self {
        Self { store, scorer, config }
    }

    /// Persist a fact, rejecting it if its CIAR score falls below the
    /// configured threshold.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CIARThresholdError`] — an expected
    /// rejection, not a failure — if `fact.ciar_score` is below
    /// `ciar_threshold`. Returns [`crate::Error::ValidationError`] if
    /// the fact is structurally invalid, or
    /// [`crate::Error::TierStorageError`] on backend failure.
    pub async fn store(&self, fact: &Fact) -> Result<()> {
        fact.validate()?;
        if fact.ciar_score < self.config.ciar_threshold {
            return Err(Error::CIARThresholdError {
                score: fact.ciar_score,
                threshold: self.config.ciar_threshold,
            });
        }
        self.store.store_fact(fact).await
    }

    /// Retrieve a fact by ID, bumping its access stats and
    /// recomputing `recency_boost`/`ciar_score` in the same call.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    pub async fn retrieve(&self, fact_id: Uuid) -> Result<Option<Fact>> {
        let Some(mut fact) = self.store.get_fact(fact_id).await? else {
            return Ok(None);
        };
        fact.access.bump();
        let (ciar, score) = self.scorer.rescore(
            fact.ciar.certainty,
            fact.ciar.impact,
            fact.extracted_at,
            fact.access.access_count,
        )?;
        fact.ciar = ciar;
        fact.ciar_score = score;
        self.store.store_fact(&fact).await?;
        Ok(Some(fact))
    }

    /// Query facts ordered by `ciar_score` descending, filtered per
    /// `query`. Excludes TTL-expired records.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    pub async fn query(&self, query: &FactQuery) -> Result<Vec<Fact>> {
        let session_id = query.session_id.as_deref().unwrap_or("");
        let min_score = query.min_ciar.unwrap_or(self.config.ciar_threshold);
        let mut facts = self.store.query_facts_by_score(session_id, min_score).await?;

        let cutoff = Utc::now() - chrono::Duration::days(self.config.ttl_days);
        facts.retain(|f| f.extracted_at >= cutoff);

        if let Some(fact_type) = query.fact_type {
            facts.retain(|f| f.fact_type == fact_type);
        }

        facts.sort_by(|a, b| b.ciar_score.partial_cmp(&a.ciar_score).unwrap_or(std::cmp::Ordering::Equal));

        if let Some(limit) = query.limit {
            facts.truncate(limit);
        }
        Ok(facts)
    }

    /// Delete a fact by ID.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    pub async fn delete(&self, fact_id: Uuid) -> Result<bool> {
        self.store.delete_fact(fact_id).await
    }

    /// Sweep and delete facts older than the configured TTL for a
    /// session. Returns the number of facts removed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    pub async fn delete_expired(&self, session_id: &str) -> Result<u64> {
        let cutoff = Utc::now() - chrono::Duration::days(self.config.ttl_days);
        let expired = self.store.query_facts_older_than(session_id, cutoff).await?;
        let mut removed = 0u64;
        for fact in expired {
            if self.store.delete_fact(fact.fact_id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
