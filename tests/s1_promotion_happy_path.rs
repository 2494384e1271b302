//! S1 (spec.md §8): ingest 12 turns, run one promotion cycle over two
//! scripted segments, and expect two L2 facts above the CIAR threshold.

#[path = "common.rs"]
mod common;

use std::sync::Arc;

use memory_core::tiers::FactQuery;
use memory_core::types::{Role, Turn};

#[tokio::test]
async fn promotion_cycle_lands_two_facts_above_ciar_threshold() {
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
        ],
    });

    let engine = common::promotion_engine(l1, l2.clone(), llm, common::breaker(), None);
    let report = engine.run_cycle_for_session("S1").await.unwrap();

    assert_eq!(report.segments_produced, 2);
    assert_eq!(report.facts_promoted, 2);
    assert_eq!(report.facts_rejected, 0);

    let facts = l2
        .query(&FactQuery {
            session_id: Some("S1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(facts.len(), 2);
    for fact in &facts {
        assert!(fact.ciar_score >= 0.6, "ciar_score {} below threshold", fact.ciar_score);
        assert!(fact.topic_segment_id.is_some());
    }
}
