use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A coherent slice of an L1 batch, produced by `TopicSegmenter` and
/// consumed by `PromotionEngine` (§3, §4.6). Transient: never persisted
/// as a first-class record, but its `segment_id` is carried into the
/// [`crate::types::Fact`] records it produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSegment {
    /// Unique identifier, generated when the segment is accepted.
    pub segment_id: Uuid,
    /// Short topic label, 3-200 chars.
    pub topic: String,
    /// Narrative summary, 10-2000 chars.
    pub summary: String,
    /// 3-10 bullet-point highlights.
    pub key_points: Vec<String>,
    /// Indices (into the L1 batch) of turns covered by this segment.
    pub turn_indices: Vec<usize>,
    /// Confidence prior handed to `FactExtractor`/`CIARScorer`.
    pub certainty: f32,
    /// Impact prior handed to `CIARScorer`.
    pub impact: f32,
    /// Number of distinct speakers in the segment.
    pub participant_count: usize,
    /// Number of turns in the segment.
    pub message_count: usize,
    /// Free-form temporal context (e.g. "weekday morning").
    pub temporal_context: String,
}

impl TopicSegment {
    /// Validate the §3 bounds on a candidate segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if `topic`, `summary`, or
    /// `key_points` fall outside their allowed length ranges.
    pub fn validate(&self) -> Result<()> {
        let topic_len = self.topic.chars().count();
        if !(3..=200).contains(&topic_len) {
            return Err(Error::ValidationError(format!(
                "segment.topic length {topic_len} outside [3, 200]"
            )));
        }
        let summary_len = self.summary.chars().count();
        if !(10..=2000).contains(&summary_len) {
            return Err(Error::ValidationError(format!(
                "segment.summary length {summary_len} outside [10, 2000]"
            )));
        }
        if !(3..=10).contains(&self.key_points.len()) {
            return Err(Error::ValidationError(format!(
                "segment.key_points count {} outside [3, 10]",
                self.key_points.len()
            )));
        }
        Ok(())
    }

    /// Build the deterministic single-segment fallback used when the LLM
    /// is unavailable or returns invalid JSON (§4.6).
    ///
    /// The fallback intentionally carries low certainty/impact so the
    /// CIAR filter in `PromotionEngine` will usually reject it; its
    /// purpose is to guarantee the batch isn't silently dropped, not to
    /// promote content.
    #[must_use]
    pub fn fallback(turn_indices: Vec<usize>, concatenated_user_text: &str) -> Self {
        let truncated: String = concatenated_user_text
            .chars()
            .take(crate::constants::segmentation::FALLBACK_SUMMARY_MAX_CHARS)
            .collect();
        let summary = if truncated.chars().count() < 10 {
            format!("{truncated:<10}", truncated = truncated)
        } else {
            truncated
        };
        let message_count = turn_indices.len();
        Self {
            segment_id: Uuid::new_v4(),
            topic: "unsegmented batch".to_string(),
            summary,
            key_points: vec![
                "segmentation fallback".to_string(),
                "LLM unavailable or returned invalid output".to_string(),
                "content not individually reviewed".to_string(),
            ],
            turn_indices,
            certainty: crate::constants::segmentation::FALLBACK_CERTAINTY,
            impact: crate::constants::segmentation::FALLBACK_IMPACT,
            participant_count: 1,
            message_count,
            temporal_context: "unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_segment() -> TopicSegment {
        TopicSegment {
            segment_id: Uuid::new_v4(),
            topic: "preferences".into(),
            summary: "User expressed a UI preference for dark mode.".into(),
            key_points: vec!["dark mode".into(), "UI".into(), "preference".into()],
            turn_indices: vec![4],
            certainty: 0.9,
            impact: 0.9,
            participant_count: 1,
            message_count: 1,
            temporal_context: "n/a".into(),
        }
    }

    #[test]
    fn valid_segment_passes() {
        assert!(valid_segment().validate().is_ok());
    }

    #[test]
    fn too_few_key_points_fails() {
        let mut seg = valid_segment();
        seg.key_points = vec!["only one".into()];
        assert!(seg.validate().is_err());
    }

    #[test]
    fn too_short_topic_fails() {
        let mut seg = valid_segment();
        seg.topic = "ab".into();
        assert!(seg.validate().is_err());
    }

    #[test]
    fn fallback_has_low_priors_and_covers_all_turns() {
        let fallback = TopicSegment::fallback(vec![0, 1, 2], "I prefer dark mode and tea.");
        assert_eq!(fallback.certainty, 0.3);
        assert_eq!(fallback.impact, 0.3);
        assert_eq!(fallback.turn_indices, vec![0, 1, 2]);
    }
}
