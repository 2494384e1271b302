//! S5 (spec.md §8): seed L3 with 4 episodes mentioning "coffee" (3 of
//! them) and "tea" (1). Running distillation with `min_occurrences = 3`
//! should produce exactly one L4 document, sourced from the 3 coffee
//! episodes, with confidence in `[0.5, 1.0]`.

#[path = "common.rs"]
mod common;

use std::sync::Arc;

use uuid::Uuid;

#[tokio::test]
async fn three_coffee_mentions_cross_threshold_one_tea_mention_does_not() {
    let l4 = common::l4();
    let llm = Arc::new(common::ScriptedLlm {
        segments: common::segments_batch(vec![]),
        facts_by_topic: vec![],
    });

    let engine = common::distillation_engine(l4.clone(), llm, common::breaker());

    let coffee_episodes: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    let tea_episode = Uuid::new_v4();

    for (i, episode_id) in coffee_episodes.iter().enumerate() {
        let report = engine
            .run_cycle_for_episode(*episode_id, &format!("episode {i} mentions coffee"), &[
                "coffee".to_string(),
            ])
            .await
            .unwrap();
        if i < 2 {
            assert!(report.documents_distilled.is_empty());
        } else {
            assert_eq!(report.documents_distilled.len(), 1);
        }
    }

    let tea_report = engine
        .run_cycle_for_episode(tea_episode, "one mention of tea", &["tea".to_string()])
        .await
        .unwrap();
    assert!(tea_report.documents_distilled.is_empty());

    let coffee_docs = l4
        .search("coffee", None, 10)
        .await
        .unwrap()
        .into_iter()
        .filter(|doc| doc.title.contains("coffee"))
        .collect::<Vec<_>>();

    assert_eq!(coffee_docs.len(), 1);
    let doc = &coffee_docs[0];
    assert_eq!(doc.source_episode_ids.len(), 3);
    for id in &coffee_episodes {
        assert!(doc.source_episode_ids.contains(id));
    }
    assert!(doc.confidence_score >= 0.5 && doc.confidence_score <= 1.0);
}
