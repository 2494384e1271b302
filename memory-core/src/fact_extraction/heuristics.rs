//! Rule-based fallback extraction (§4.7), used while the LLM circuit
//! breaker is open. Trades recall for availability: a handful of regex
//! patterns over common preference/constraint/entity phrasing, good
//! enough to keep the pipeline moving, not a substitute for the model.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{FactType, TopicSegment};

fn preference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bI (?:prefer|like|love|want|enjoy) ([^.;,]+)").unwrap()
    })
}

fn constraint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bI (?:only have|need|must|can't|cannot|don't have) ([^.;,]+)").unwrap()
    })
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z][a-zA-Z]+(?: [A-Z][a-zA-Z]+)*)\b").unwrap())
}

/// Pull obvious preferences, constraints, and named entities out of a
/// segment's summary and key points using regex heuristics.
///
/// Returns `(content, fact_type, fact_category)` triples, mirroring the
/// shape the LLM path parses into before CIAR scoring.
#[must_use]
pub fn extract_heuristic(segment: &TopicSegment) -> Vec<(String, FactType, String)> {
    let mut out = Vec::new();
    let text = format!("{} {}", segment.summary, segment.key_points.join(" "));

    for cap in preference_re().captures_iter(&text) {
        out.push((
            cap[1].trim().to_string(),
            FactType::Preference,
            "heuristic".to_string(),
        ));
    }
    for cap in constraint_re().captures_iter(&text) {
        out.push((
            cap[1].trim().to_string(),
            FactType::Constraint,
            "heuristic".to_string(),
        ));
    }
    if out.is_empty() {
        for cap in entity_re().captures_iter(&text) {
            let name = cap[1].trim().to_string();
            if name.chars().count() >= 3 {
                out.push((name, FactType::Entity, "heuristic".to_string()));
            }
        }
    }
    out.truncate(10);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn segment(summary: &str) -> TopicSegment {
        TopicSegment {
            segment_id: Uuid::new_v4(),
            topic: "topic".into(),
            summary: summary.into(),
            key_points: vec!["a".into(), "b".into(), "c".into()],
            turn_indices: vec![0],
            certainty: 0.3,
            impact: 0.3,
            participant_count: 1,
            message_count: 1,
            temporal_context: "n/a".into(),
        }
    }

    #[test]
    fn extracts_preference_phrasing() {
        let facts = extract_heuristic(&segment("I prefer dark mode over light mode for coding."));
        assert!(facts.iter().any(|(_, t, _)| *t == FactType::Preference));
    }

    #[test]
    fn extracts_constraint_phrasing() {
        let facts = extract_heuristic(&segment("I only have 30 minutes before my next meeting."));
        assert!(facts.iter().any(|(_, t, _)| *t == FactType::Constraint));
    }

    #[test]
    fn falls_back_to_entity_capture() {
        let facts = extract_heuristic(&segment("We discussed the Monday Standup schedule."));
        assert!(!facts.is_empty());
    }
}
