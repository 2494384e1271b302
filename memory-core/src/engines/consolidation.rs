//! `ConsolidationEngine` (§4.9): L2→L3. Clusters a session's working-memory
//! facts into time-bounded groups and consolidates each cluster into an
//! [`crate::types::Episode`], embedding it and writing it through the
//! dual-indexed episodic tier. Consolidated facts are removed from L2 —
//! their content now lives in L3, not duplicated across tiers.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::sleep;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engines::DistillationEngine;
use crate::llm::LlmClient;
use crate::telemetry::Telemetry;
use crate::tiers::{EpisodicMemoryTier, FactQuery, WorkingMemoryTier};
use crate::types::{Episode, Fact, L3Config};
use crate::Result;

/// Outcome of one consolidation cycle for a single session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidationReport {
    /// Facts considered in this cycle.
    pub facts_considered: usize,
    /// Time-clusters formed from those facts.
    pub clusters_formed: usize,
    /// Episodes written to L3.
    pub episodes_created: Vec<Uuid>,
}

/// Moves facts from L2 (`WorkingMemoryTier`) to L3 (`EpisodicMemoryTier`)
/// by clustering them into time-bounded episodes.
pub struct ConsolidationEngine {
    l2: Arc<WorkingMemoryTier>,
    l3: Arc<EpisodicMemoryTier>,
    llm: Arc<dyn LlmClient>,
    l3_config: L3Config,
    telemetry: Arc<Telemetry>,
    interval: Duration,
    queue: Mutex<VecDeque<String>>,
    shutdown: RwLock<bool>,
    distillation: Option<Arc<DistillationEngine>>,
}

impl ConsolidationEngine {
    /// Build a consolidation engine over the given tiers, embedding
    /// client, and clustering config. `distillation`, if set, is
    /// notified with each newly created episode so L3→L4 distillation
    /// can track recurring entities without a separate scan.
    #[must_use]
    pub fn new(
        l2: Arc<WorkingMemoryTier>,
        l3: Arc<EpisodicMemoryTier>,
        llm: Arc<dyn LlmClient>,
        l3_config: L3Config,
        interval: Duration,
        telemetry: Arc<Telemetry>,
        distillation: Option<Arc<DistillationEngine>>,
    ) -> Self {
        Self {
            l2,
            l3,
            llm,
            l3_config,
            telemetry,
            interval,
            queue: Mutex::new(VecDeque::new()),
            shutdown: RwLock::new(false),
            distillation,
        }
    }

    /// Mark a session as having new L2 facts to consolidate.
    pub async fn notify_session(&self, session_id: impl Into<String>) {
        let session_id = session_id.into();
        let mut queue = self.queue.lock().await;
        if !queue.iter().any(|s| s == &session_id) {
            queue.push_back(session_id);
        }
    }

    /// Run one consolidation cycle for `session_id`: pull its facts,
    /// cluster by time gap, consolidate each cluster into an episode,
    /// and drop the source facts from L2.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] or
    /// [`crate::Error::DualIndexError`] if reading L2 or writing L3
    /// fails.
    pub async fn run_cycle_for_session(&self, session_id: &str) -> Result<ConsolidationReport> {
        let mut facts = self
            .l2
            .query(&FactQuery {
                session_id: Some(session_id.to_string()),
                min_ciar: Some(0.0),
                ..Default::default()
            })
            .await?;
        facts.sort_by_key(|f| f.extracted_at);

        let clusters = self.cluster_by_gap(&facts);
        let mut report = ConsolidationReport {
            facts_considered: facts.len(),
            clusters_formed: clusters.len(),
            ..Default::default()
        };

        for cluster in clusters {
            let episode = self.build_episode(session_id, &cluster).await?;
            let stored = self.l3.store(episode).await?;
            report.episodes_created.push(stored.episode_id);

            if let Some(distillation) = &self.distillation {
                distillation
                    .notify_episode(stored.episode_id, stored.summary.clone(), stored.entities.clone())
                    .await;
            }

            for fact in cluster {
                self.l2.delete(fact.fact_id).await?;
            }
        }

        self.telemetry.counter("consolidation_cycles_total").increment();
        self.telemetry
            .counter("consolidation_episodes_created_total")
            .increment_by(report.episodes_created.len() as u64);

        Ok(report)
    }

    fn cluster_by_gap(&self, facts: &[Fact]) -> Vec<Vec<Fact>> {
        let gap = chrono::Duration::minutes(self.l3_config.cluster_gap_minutes);
        let mut clusters: Vec<Vec<Fact>> = Vec::new();

        for fact in facts {
            match clusters.last_mut() {
                Some(current) if fact.extracted_at - current.last().unwrap().extracted_at <= gap => {
                    current.push(fact.clone());
                }
                _ => clusters.push(vec![fact.clone()]),
            }
        }
        clusters
    }

    async fn build_episode(&self, session_id: &str, cluster: &[Fact]) -> Result<Episode> {
        let summary = Self::summarize(cluster);
        let entities = Self::extract_entities(cluster);
        let valid_from = cluster.iter().map(|f| f.extracted_at).min().unwrap_or_else(Utc::now);
        let valid_to = cluster.iter().map(|f| f.extracted_at).max();

        let embedding = self.llm.embed(&summary).await.ok();

        Ok(Episode {
            episode_id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            summary,
            entities,
            relationships: Vec::new(),
            source_fact_ids: cluster.iter().map(|f| f.fact_id).collect(),
            fact_valid_from: valid_from,
            fact_valid_to: valid_to,
            source_observation_timestamp: Utc::now(),
            vector_id: None,
            graph_node_id: None,
            embedding,
            consolidated_at: Utc::now(),
        })
    }

    fn summarize(cluster: &[Fact]) -> String {
        let joined = cluster
            .iter()
            .map(|f| f.content.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        if joined.chars().count() < 10 {
            format!("Consolidated session activity: {joined:<10}")
        } else {
            joined
        }
    }

    fn extract_entities(cluster: &[Fact]) -> Vec<String> {
        let mut entities: Vec<String> = cluster
            .iter()
            .filter(|f| matches!(f.fact_type, crate::types::FactType::Entity))
            .map(|f| f.content.clone())
            .collect();
        entities.sort();
        entities.dedup();
        entities
    }

    /// Spawn the background worker: pops queued sessions and runs a
    /// cycle for each, sleeping `interval` whenever the queue is empty.
    pub fn start(self: Arc<Self>) {
        tokio::spawn(async move {
            info!("consolidation engine worker started");
            loop {
                if *self.shutdown.read().await {
                    info!("consolidation engine worker shutting down");
                    break;
                }

                let next = self.queue.lock().await.pop_front();
                match next {
                    Some(session_id) => {
                        if let Err(e) = self.run_cycle_for_session(&session_id).await {
                            warn!(session_id, error = %e, "consolidation cycle failed");
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

    /// Poll until the session queue is empty or `timeout` elapses.
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
