//! S2 (spec.md §8): like S1, but the LLM also returns a third
//! low-certainty/impact segment. Its fact is extracted but rejected by
//! CIAR scoring before it reaches L2, leaving L2 with only the
//! original two facts.

#[path = "common.rs"]
mod common;

use std::sync::Arc;

use memory_core::tiers::FactQuery;
use memory_core::types::{Role, Turn};

#[tokio::test]
async fn low_value_segment_is_dropped_before_extraction() {
    let l1 = common::l1();
    let l2 = common::l2();

    for i in 0..12u64 {
        let content = match i {
            4 => "I prefer dark mode".to_string(),
            9 => "My team standup is every Monday at 10am".to_string(),
            _ => format!("turn {i}"),
        };
        let turn = Turn::new("S1".to_string(), i, Role::User, content);
        l1.store(&turn).await.unwrap();
    }

    let llm = Arc::new(common::ScriptedLlm {
        segments: common::segments_batch(vec![
            common::segment_json("preferences", &[4], 0.9, 0.9),
            common::segment_json("schedule", &[9], 0.85, 0.8),
            common::segment_json("low-value-aside", &[6], 0.4, 0.4),
        ]),
        facts_by_topic: vec![
            (
                "preferences",
                common::facts_batch(vec![common::fact_json("prefers dark mode", "preference")]),
            ),
            (
                "schedule",
                common::facts_batch(vec![common::fact_json(
                    "standup every Monday at 10am",
                    "event",
                )]),
            ),
            (
                "low-value-aside",
                common::facts_batch(vec![common::fact_json("should never appear", "mention")]),
            ),
        ],
    });

    let engine = common::promotion_engine(l1, l2.clone(), llm, common::breaker(), None);
    let report = engine.run_cycle_for_session("S1").await.unwrap();

    assert_eq!(report.segments_produced, 3);
    // The low-certainty/impact segment still reaches FactExtractor, but
    // its resulting fact's CIAR score (0.4 * 0.4 = 0.16) falls below
    // L2's 0.6 retention threshold and is rejected rather than stored.
    assert_eq!(report.facts_promoted, 2);
    assert_eq!(report.facts_rejected, 1);

    let facts = l2
        .query(&FactQuery {
            session_id: Some("S1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(facts.len(), 2);
    assert!(facts.iter().all(|f| f.content != "should never appear"));
}
