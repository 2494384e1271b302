//! `DistillationEngine` (§4.10): L3→L4. Tracks how often each entity
//! recurs across a session's episodes and, once an entity crosses
//! `min_occurrences`, distills a generalized [`crate::types::KnowledgeDocument`]
//! citing every supporting episode as provenance.
//!
//! Unlike the other two engines, this one is driven by individual
//! episode IDs rather than session IDs: `ConsolidationEngine` calls
//! [`DistillationEngine::notify_episode`] right after writing a new
//! episode, and the worker processes one episode at a time — the same
//! single-item work-queue shape used by the pattern-extraction queue
//! this crate's teacher module implements.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::llm::{GenerationRequest, LlmClient};
use crate::storage::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::telemetry::Telemetry;
use crate::tiers::{EpisodicMemoryTier, SemanticMemoryTier};
use crate::types::{AccessStats, KnowledgeDocument, L4Config, ProvenanceLink};
use crate::Result;

/// Outcome of processing one episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistillationReport {
    /// Entities updated in the occurrence index by this episode.
    pub entities_tracked: usize,
    /// Knowledge documents newly distilled (entities that just crossed
    /// `min_occurrences` for the first time).
    pub documents_distilled: Vec<Uuid>,
}

/// Moves recurring themes from L3 (`EpisodicMemoryTier`) to L4
/// (`SemanticMemoryTier`).
pub struct DistillationEngine {
    l4: Arc<SemanticMemoryTier>,
    llm: Arc<dyn LlmClient>,
    breaker: Arc<CircuitBreaker>,
    config: L4Config,
    telemetry: Arc<Telemetry>,
    interval: Duration,
    queue: Mutex<VecDeque<(Uuid, String, Vec<String>)>>,
    occurrences: Mutex<HashMap<String, Vec<(Uuid, String)>>>,
    distilled: Mutex<HashSet<String>>,
    shutdown: RwLock<bool>,
}

impl DistillationEngine {
    /// Build a distillation engine over L4, an LLM client (used to
    /// synthesize document content, with a heuristic fallback), and
    /// the breaker guarding that LLM.
    #[must_use]
    pub fn new(
        l4: Arc<SemanticMemoryTier>,
        llm: Arc<dyn LlmClient>,
        breaker: Arc<CircuitBreaker>,
        config: L4Config,
        interval: Duration,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            l4,
            llm,
            breaker,
            config,
            telemetry,
            interval,
            queue: Mutex::new(VecDeque::new()),
            occurrences: Mutex::new(HashMap::new()),
            distilled: Mutex::new(HashSet::new()),
            shutdown: RwLock::new(false),
        }
    }

    /// Queue a freshly consolidated episode for entity tracking. Cheap
    /// and non-blocking; the background worker does the actual work.
    pub async fn notify_episode(&self, episode_id: Uuid, summary: String, entities: Vec<String>) {
        self.queue.lock().await.push_back((episode_id, summary, entities));
    }

    /// Process one episode: update the entity occurrence index, and
    /// distill a knowledge document for any entity that just crossed
    /// `min_occurrences` for the first time.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] if writing L4 fails.
    pub async fn run_cycle_for_episode(
        &self,
        episode_id: Uuid,
        summary: &str,
        entities: &[String],
    ) -> Result<DistillationReport> {
        let mut report = DistillationReport {
            entities_tracked: entities.len(),
            ..Default::default()
        };

        for entity in entities {
            let already_distilled = self.distilled.lock().await.contains(entity);
            if already_distilled {
                continue;
            }

            let crossed_threshold = {
                let mut occurrences = self.occurrences.lock().await;
                let entries = occurrences.entry(entity.clone()).or_default();
                if !entries.iter().any(|(id, _)| *id == episode_id) {
                    entries.push((episode_id, summary.to_string()));
                }
                entries.len() >= self.config.min_occurrences
            };

            if crossed_threshold {
                let doc = self.distill_entity(entity).await?;
                report.documents_distilled.push(doc.knowledge_id);
                self.distilled.lock().await.insert(entity.clone());
            }
        }

        self.telemetry.counter("distillation_cycles_total").increment();
        self.telemetry
            .counter("distillation_documents_total")
            .increment_by(report.documents_distilled.len() as u64);

        Ok(report)
    }

    async fn distill_entity(&self, entity: &str) -> Result<KnowledgeDocument> {
        let occurrences = self.occurrences.lock().await.get(entity).cloned().unwrap_or_default();
        let source_episode_ids: Vec<Uuid> = occurrences.iter().map(|(id, _)| *id).collect();
        let provenance_links: Vec<ProvenanceLink> = occurrences
            .iter()
            .map(|(episode_id, summary)| ProvenanceLink {
                episode_id: *episode_id,
                note: summary.chars().take(200).collect(),
            })
            .collect();

        let content = self.generate_content(entity, &occurrences).await;

        let doc = KnowledgeDocument {
            knowledge_id: Uuid::new_v4(),
            title: format!("Recurring theme: {entity}"),
            content,
            knowledge_type: "pattern".to_string(),
            confidence_score: Self::confidence_for(occurrences.len(), self.config.min_occurrences),
            source_episode_ids,
            provenance_links,
            access: AccessStats::default(),
            usefulness_score: 0.0,
            distilled_at: chrono::Utc::now(),
        };

        self.l4.store(&doc).await?;
        Ok(doc)
    }

    async fn generate_content(&self, entity: &str, occurrences: &[(Uuid, String)]) -> String {
        if self.breaker.state().await == CircuitState::Open {
            return Self::heuristic_content(entity, occurrences);
        }

        let prompt = format!(
            "Synthesize a single generalized statement describing the recurring theme \"{entity}\" \
             across these episode summaries:\n{}",
            occurrences.iter().map(|(_, s)| s.as_str()).collect::<Vec<_>>().join("\n")
        );
        let llm = self.llm.clone();
        let request = GenerationRequest::text(prompt);
        match self.breaker.call(|| async move { llm.generate(request).await }).await {
            Ok(response) => response.as_text().to_string(),
            Err(e) => {
                debug!(entity, error = %e, "distillation LLM call failed, using heuristic content");
                Self::heuristic_content(entity, occurrences)
            }
        }
    }

    fn heuristic_content(entity: &str, occurrences: &[(Uuid, String)]) -> String {
        format!(
            "Across {} episodes, \"{entity}\" recurred consistently: {}",
            occurrences.len(),
            occurrences.iter().map(|(_, s)| s.as_str()).collect::<Vec<_>>().join("; ")
        )
    }

    fn confidence_for(occurrence_count: usize, min_occurrences: usize) -> f32 {
        let over = (occurrence_count.saturating_sub(min_occurrences)) as f32;
        (0.5 + 0.1 * over).min(0.95)
    }

    /// Spawn the background worker: pops queued episodes and runs a
    /// cycle for each, sleeping `interval` whenever the queue is empty.
    pub fn start(self: Arc<Self>) {
        tokio::spawn(async move {
            info!("distillation engine worker started");
            loop {
                if *self.shutdown.read().await {
                    info!("distillation engine worker shutting down");
                    break;
                }

                let next = self.queue.lock().await.pop_front();
                match next {
                    Some((episode_id, summary, entities)) => {
                        if let Err(e) = self
                            .run_cycle_for_episode(episode_id, &summary, &entities)
                            .await
                        {
                            warn!(episode_id = %episode_id, error = %e, "distillation cycle failed");
                        }
                    }
                    None => sleep(self.interval).await,
                }
            }
        });
    }

    /// Signal the worker to stop after its current/queued work drains.
    pub async fn stop(&self) {
        *self.shutdown.write().await = true;
    }

    /// Poll until the episode queue is empty or `timeout` elapses.
    pub async fn wait_until_idle(&self, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            if self.queue.lock().await.is_empty() {
                return true;
            }
            sleep(Duration::from_millis(50)).await;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use test_utils::InMemoryFullTextStore;

    use crate::llm::GenerationResponse;
    use crate::storage::circuit_breaker::CircuitBreakerConfig;

    struct StubLlm;

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse> {
            Ok(GenerationResponse::Text("standup scheduling keeps recurring".into()))
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 8])
        }
    }

    fn engine() -> DistillationEngine {
        DistillationEngine::new(
            Arc::new(SemanticMemoryTier::new(Arc::new(InMemoryFullTextStore::new()))),
            Arc::new(StubLlm),
            Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default())),
            L4Config { min_occurrences: 3 },
            Duration::from_millis(10),
            Arc::new(Telemetry::new()),
        )
    }

    #[tokio::test]
    async fn entity_below_threshold_produces_no_document() {
        let engine = engine();
        let report = engine
            .run_cycle_for_episode(Uuid::new_v4(), "standup talk", &["standup".to_string()])
            .await
            .unwrap();
        assert!(report.documents_distilled.is_empty());
    }

    #[tokio::test]
    async fn entity_crossing_threshold_distills_once() {
        let engine = engine();
        for i in 0..3 {
            let report = engine
                .run_cycle_for_episode(Uuid::new_v4(), &format!("episode {i}"), &["standup".to_string()])
                .await
                .unwrap();
            if i < 2 {
                assert!(report.documents_distilled.is_empty());
            } else {
                assert_eq!(report.documents_distilled.len(), 1);
            }
        }

        // A fourth occurrence must not distill a duplicate document.
        let report = engine
            .run_cycle_for_episode(Uuid::new_v4(), "episode 3", &["standup".to_string()])
            .await
            .unwrap();
        assert!(report.documents_distilled.is_empty());
    }

    #[tokio::test]
    async fn same_episode_does_not_double_count_an_entity() {
        let engine = engine();
        let episode_id = Uuid::new_v4();
        engine
            .run_cycle_for_episode(episode_id, "first pass", &["standup".to_string(), "standup".to_string()])
            .await
            .unwrap();
        let occurrences = engine.occurrences.lock().await;
        assert_eq!(occurrences.get("standup").unwrap().len(), 1);
    }
}
