use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Classification of a [`Fact`], used by [`crate::ciar::CiarScorer`] to pick
/// the impact prior (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactType {
    /// A stated preference ("I prefer dark mode").
    Preference,
    /// A constraint the user operates under ("I only have 30 minutes").
    Constraint,
    /// A named entity reference.
    Entity,
    /// An event ("My team standup is Monday at 10am").
    Event,
    /// A subject–predicate–object relationship between entities.
    Relationship,
    /// A passing mention with low standalone significance.
    Mention,
    /// Anything that doesn't fit the above.
    Other,
}

impl FactType {
    /// Domain-weighted impact score for this fact type (§4.5 recommended
    /// defaults).
    #[must_use]
    pub fn default_impact(self) -> f32 {
        match self {
            FactType::Preference => crate::constants::ciar::IMPACT_PREFERENCE,
            FactType::Constraint => crate::constants::ciar::IMPACT_CONSTRAINT,
            FactType::Entity => crate::constants::ciar::IMPACT_ENTITY,
            FactType::Event => crate::constants::ciar::IMPACT_EVENT,
            FactType::Relationship => crate::constants::ciar::IMPACT_RELATIONSHIP,
            FactType::Mention => crate::constants::ciar::IMPACT_MENTION,
            FactType::Other => crate::constants::ciar::IMPACT_OTHER,
        }
    }
}

/// Bookkeeping shared by record types that track read access (L2 facts, L4
/// knowledge documents): bumped on every `retrieve`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccessStats {
    /// Number of times the record has been retrieved.
    pub access_count: u64,
    /// Timestamp of the most recent retrieval, if any.
    pub last_accessed: Option<DateTime<Utc>>,
}

impl Default for AccessStats {
    fn default() -> Self {
        Self {
            access_count: 0,
            last_accessed: None,
        }
    }
}

impl AccessStats {
    /// Record an access, bumping the counter and timestamp.
    pub fn bump(&mut self) {
        self.access_count += 1;
        self.last_accessed = Some(Utc::now());
    }
}

/// The CIAR components that combine into [`Fact::ciar_score`] (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CiarComponents {
    /// Confidence of the source extraction, in `[0, 1]`.
    pub certainty: f32,
    /// Domain-weighted significance of the fact type, in `[0, 1]`.
    pub impact: f32,
    /// Exponential age decay, in `[0, 1]`.
    pub age_decay: f64,
    /// Access-driven boost, `>= 1.0`.
    pub recency_boost: f64,
}

/// A structured statement extracted from a [`crate::types::TopicSegment`],
/// kept in L2 (`WorkingMemoryTier`).
///
/// Created by `PromotionEngine`; mutated only by access-bump and periodic
/// CIAR recomputation; deleted on TTL expiry (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Unique identifier.
    pub fact_id: Uuid,
    /// Owning session.
    pub session_id: String,
    /// The fact's text content.
    pub content: String,
    /// Structural classification.
    pub fact_type: FactType,
    /// Free-form sub-category (e.g. "scheduling", "ui-preference").
    pub fact_category: String,
    /// The CIAR components this score was computed from.
    pub ciar: CiarComponents,
    /// `clip01((certainty * impact) * age_decay * recency_boost)`.
    pub ciar_score: f32,
    /// Read-access bookkeeping.
    pub access: AccessStats,
    /// When the fact was extracted.
    pub extracted_at: DateTime<Utc>,
    /// L1 turn indices the fact was derived from.
    pub source_turn_ids: Vec<u64>,
    /// The `TopicSegment` that produced this fact, if promoted through the
    /// normal pipeline.
    pub topic_segment_id: Option<Uuid>,
    /// Human-readable label of the originating topic segment.
    pub topic_label: Option<String>,
    /// Opaque pointer to an external source, if any.
    pub source_uri: Option<String>,
}

impl Fact {
    /// Validate the §3 invariants for a `Fact`.
    ///
    /// Does **not** check the CIAR-score/threshold relationship — that is
    /// the responsibility of `L2.store` (§4.2), since it is a storage
    /// policy decision, not a structural invariant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] on empty `session_id`/`content`,
    /// or on a CIAR score outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.session_id.trim().is_empty() {
            return Err(Error::ValidationError("fact.session_id must not be empty".into()));
        }
        if self.content.is_empty() {
            return Err(Error::ValidationError("fact.content must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.ciar_score) || self.ciar_score.is_nan() {
            return Err(Error::ValidationError(format!(
                "fact.ciar_score {} out of range [0, 1]",
                self.ciar_score
            )));
        }
        Ok(())
    }
}
