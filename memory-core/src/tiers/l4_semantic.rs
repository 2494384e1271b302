//! L4 `SemanticMemoryTier` (§4.4): distilled knowledge documents kept
//! in a full-text-searchable index with mandatory episode provenance.

use std::sync::Arc;

use uuid::Uuid;

use crate::storage::FullTextStore;
use crate::types::KnowledgeDocument;
use crate::Result;

/// Declarative knowledge store, distilled from L3 episodes by
/// `DistillationEngine`.
pub struct SemanticMemoryTier {
    store: Arc<dyn FullTextStore>,
}

impl SemanticMemoryTier {
    /// Build a tier over the given full-text adapter.
    #[must_use]
    pub fn new(store: Arc<dyn FullTextStore>) -> Self {
        Self { store }
    }

    /// Index a knowledge document. Validation (non-empty
    /// `source_episode_ids`, length/range bounds) happens in
    /// [`KnowledgeDocument::validate`], called here before the write.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ValidationError`] if the document lacks
    /// provenance or fails its field bounds, or
    /// [`crate::Error::TierStorageError`] on backend failure.
    pub async fn store(&self, document: &KnowledgeDocument) -> Result<()> {
        document.validate()?;
        self.store.index(document).await
    }

    /// Typo-tolerant full-text search, optionally faceted by
    /// `knowledge_type`, sorted by confidence descending.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    pub async fn search(
        &self,
        query: &str,
        knowledge_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<KnowledgeDocument>> {
        self.store.search(query, knowledge_type, limit).await
    }

    /// Retrieve a document by ID, bumping its access stats.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    pub async fn retrieve(&self, knowledge_id: Uuid) -> Result<Option<KnowledgeDocument>> {
        let Some(mut doc) = self.store.get(knowledge_id).await? else {
            return Ok(None);
        };
        doc.access.bump();
        self.store.index(&doc).await?;
        Ok(Some(doc))
    }

    /// Delete a document by ID.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] on backend failure.
    pub async fn delete(&self, knowledge_id: Uuid) -> Result<bool> {
        self.store.delete(knowledge_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::InMemoryFullTextStore;

    use crate::types::{AccessStats, ProvenanceLink};

    fn tier() -> SemanticMemoryTier {
        SemanticMemoryTier::new(Arc::new(InMemoryFullTextStore::new()))
    }

    fn document() -> KnowledgeDocument {
        KnowledgeDocument {
            knowledge_id: Uuid::new_v4(),
            title: "Coffee preference".into(),
            content: "The user consistently prefers coffee over tea in the morning.".into(),
            knowledge_type: "preference".into(),
            confidence_score: 0.8,
            source_episode_ids: vec![Uuid::new_v4()],
            provenance_links: vec![ProvenanceLink {
                episode_id: Uuid::new_v4(),
                note: "observed across three episodes".into(),
            }],
            access: AccessStats::default(),
            usefulness_score: 0.0,
            distilled_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn store_then_retrieve_bumps_access() {
        let tier = tier();
        let doc = document();
        let id = doc.knowledge_id;
        tier.store(&doc).await.unwrap();

        let retrieved = tier.retrieve(id).await.unwrap().unwrap();
        assert_eq!(retrieved.access.access_count, 1);
    }

    #[tokio::test]
    async fn orphaned_document_rejected() {
        let tier = tier();
        let mut doc = document();
        doc.source_episode_ids.clear();
        assert!(tier.store(&doc).await.is_err());
    }

    #[tokio::test]
    async fn search_finds_by_query() {
        let tier = tier();
        tier.store(&document()).await.unwrap();
        let results = tier.search("coffee", None, 10).await.unwrap();
        assert!(!results.is_empty());
    }
}
