use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fact::AccessStats;
use crate::error::{Error, Result};

/// An explicit pointer from a [`KnowledgeDocument`] back to the episode
/// that supports it (§3, §4.10).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceLink {
    /// The supporting episode.
    pub episode_id: Uuid,
    /// Short human-readable excerpt/justification.
    pub note: String,
}

/// A distilled, generalized statement backed by episode provenance, kept
/// in L4 (`SemanticMemoryTier`) (§3, §4.4, §4.10).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    /// Unique identifier.
    pub knowledge_id: Uuid,
    /// Title, at least 5 characters.
    pub title: String,
    /// Body text, at least 10 characters.
    pub content: String,
    /// Free-form classification (facetable in the full-text index).
    pub knowledge_type: String,
    /// Confidence in `[0, 1]`.
    pub confidence_score: f32,
    /// Episodes this knowledge was distilled from. Must be non-empty.
    pub source_episode_ids: Vec<Uuid>,
    /// Detailed provenance notes, one per (or fewer than) source episode.
    pub provenance_links: Vec<ProvenanceLink>,
    /// Read-access bookkeeping.
    pub access: AccessStats,
    /// Running measure of how useful retrieval found this document.
    pub usefulness_score: f32,
    /// When this document was distilled.
    pub distilled_at: DateTime<Utc>,
}

impl KnowledgeDocument {
    /// Validate the §3 invariants: non-orphaned provenance and field
    /// length/range bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if `source_episode_ids` is
    /// empty, `title`/`content` are too short, or `confidence_score` is
    /// outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.source_episode_ids.is_empty() {
            return Err(Error::ValidationError(
                "knowledge_document.source_episode_ids must not be empty".into(),
            ));
        }
        if self.title.chars().count() < 5 {
            return Err(Error::ValidationError(
                "knowledge_document.title must be at least 5 characters".into(),
            ));
        }
        if self.content.chars().count() < 10 {
            return Err(Error::ValidationError(
                "knowledge_document.content must be at least 10 characters".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_score) || self.confidence_score.is_nan() {
            return Err(Error::ValidationError(format!(
                "knowledge_document.confidence_score {} out of range [0, 1]",
                self.confidence_score
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KnowledgeDocument {
        KnowledgeDocument {
            knowledge_id: Uuid::new_v4(),
            title: "Coffee preference".into(),
            content: "The user consistently prefers coffee over tea in the morning.".into(),
            knowledge_type: "preference".into(),
            confidence_score: 0.8,
            source_episode_ids: vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()],
            provenance_links: vec![],
            access: AccessStats::default(),
            usefulness_score: 0.0,
            distilled_at: Utc::now(),
        }
    }

    #[test]
    fn valid_document_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn empty_provenance_fails() {
        let mut doc = sample();
        doc.source_episode_ids.clear();
        assert!(doc.validate().is_err());
    }

    #[test]
    fn short_title_fails() {
        let mut doc = sample();
        doc.title = "ab".into();
        assert!(doc.validate().is_err());
    }
}
