//! L1 `ActiveContextTier` (§4.1): the most recent N turns per session,
//! with write-through dual storage and a 24-hour TTL.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::storage::{HotStore, RelationalStore};
use crate::types::{L1Config, Turn};
use crate::Result;

/// Sub-10ms conversational turn buffer backed by a hot KV/list store,
/// write-through to a relational store for recovery.
pub struct ActiveContextTier {
    hot: Arc<dyn HotStore>,
    durable: Arc<dyn RelationalStore>,
    config: L1Config,
}

impl ActiveContextTier {
    /// Build a tier over the given hot/durable adapters and config.
    #[must_use]
    pub fn new(hot: Arc<dyn HotStore>, durable: Arc<dyn RelationalStore>, config: L1Config) -> Self {
        Self { hot, durable, config }
    }

    /// Append a turn, trimming the session's window to `window_size`
    /// and renewing its TTL. Write-through: the durable store is
    /// always written; a hot-store failure is logged and the call
    /// still succeeds (reads fall back to durable on a hot-store
    /// miss).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ValidationError`] if the turn is
    /// structurally invalid, or [`crate::Error::TierStorageError`] if
    /// the durable write fails.
    pub async fn store(&self, turn: &Turn) -> Result<()> {
        turn.validate()?;

        self.durable.store_turn(turn).await?;

        if let Err(e) = self
            .hot
            .push_turn(&turn.session_id, turn, self.config.window_size)
            .await
        {
            warn!(session_id = %turn.session_id, error = %e, "hot-store write failed, downgrading to durable-only");
        }

        Ok(())
    }

    /// Return the session's turns in chronological order. Falls back
    /// to the durable store on a hot-store miss, logging the
    /// fallback. Unknown sessions yield an empty list, never an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] only if both stores
    /// fail.
    pub async fn retrieve(&self, session_id: &str) -> Result<Vec<Turn>> {
        match self.hot.get_window(session_id).await {
            Ok(turns) if !turns.is_empty() => Ok(turns),
            Ok(_) => self.retrieve_from_durable(session_id).await,
            Err(e) => {
                debug!(session_id, error = %e, "hot-store miss, falling back to durable store");
                self.retrieve_from_durable(session_id).await
            }
        }
    }

    async fn retrieve_from_durable(&self, session_id: &str) -> Result<Vec<Turn>> {
        self.durable
            .query_recent_turns(session_id, self.config.window_size)
            .await
    }

    /// Same as [`Self::retrieve`] with an optional smaller limit.
    ///
    /// # Errors
    ///
    /// See [`Self::retrieve`].
    pub async fn query(&self, session_id: &str, limit: Option<usize>) -> Result<Vec<Turn>> {
        let mut turns = self.retrieve(session_id).await?;
        if let Some(limit) = limit {
            if turns.len() > limit {
                let start = turns.len() - limit;
                turns = turns.split_off(start);
            }
        }
        Ok(turns)
    }

    /// Remove a session's window from both stores.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    pub async fn delete(&self, session_id: &str) -> Result<()> {
        self.hot.clear_session(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{InMemoryHotStore, InMemoryRelationalStore};

    use crate::types::Role;

    fn tier() -> ActiveContextTier {
        ActiveContextTier::new(
            Arc::new(InMemoryHotStore::new()),
            Arc::new(InMemoryRelationalStore::new()),
            L1Config {
                window_size: 3,
                ttl_hours: 24,
            },
        )
    }

    #[tokio::test]
    async fn store_then_retrieve_preserves_order() {
        let tier = tier();
        for i in 0..3 {
            let turn = Turn::new("s1".into(), i, Role::User, format!("turn {i}"));
            tier.store(&turn).await.unwrap();
        }
        let turns = tier.retrieve("s1").await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].turn_id, 0);
        assert_eq!(turns[2].turn_id, 2);
    }

    #[tokio::test]
    async fn window_trims_to_configured_size() {
        let tier = tier();
        for i in 0..5 {
            let turn = Turn::new("s1".into(), i, Role::User, format!("turn {i}"));
            tier.store(&turn).await.unwrap();
        }
        let turns = tier.retrieve("s1").await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].turn_id, 2);
    }

    #[tokio::test]
    async fn unknown_session_returns_empty_not_error() {
        let tier = tier();
        let turns = tier.retrieve("unknown").await.unwrap();
        assert!(turns.is_empty());
    }

    #[tokio::test]
    async fn query_applies_smaller_limit() {
        let tier = tier();
        for i in 0..3 {
            let turn = Turn::new("s1".into(), i, Role::User, format!("turn {i}"));
            tier.store(&turn).await.unwrap();
        }
        let turns = tier.query("s1", Some(1)).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].turn_id, 2);
    }

    #[tokio::test]
    async fn delete_clears_session() {
        let tier = tier();
        let turn = Turn::new("s1".into(), 0, Role::User, "hi".into());
        tier.store(&turn).await.unwrap();
        tier.delete("s1").await.unwrap();
        assert!(tier.retrieve("s1").await.unwrap().is_empty());
    }
}
