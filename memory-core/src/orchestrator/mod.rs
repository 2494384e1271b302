//! [`UnifiedMemorySystem`] (§4, §4.11): the composition root. Owns the
//! four tiers, the three lifecycle engines that move data between them,
//! and the LLM client / circuit breaker / telemetry handle they share.
//!
//! Tiers are wired bottom-up and the engines are cross-notified the same
//! way `PromotionEngine` and `ConsolidationEngine` notify each other
//! internally: `ingest_turn` writes L1 then pokes `PromotionEngine`,
//! which pokes `ConsolidationEngine` on promotion, which pokes
//! `DistillationEngine` on consolidation. Callers never need to poll a
//! tier on a schedule themselves.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::ciar::CiarScorer;
use crate::engines::{ConsolidationEngine, DistillationEngine, PromotionEngine};
use crate::llm::LlmClient;
use crate::storage::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::storage::{FullTextStore, GraphStore, HotStore, RelationalStore, VectorStore};
use crate::telemetry::Telemetry;
use crate::tiers::{
    ActiveContextTier, EpisodeQuery, EpisodicMemoryTier, FactQuery, SemanticMemoryTier,
    WorkingMemoryTier,
};
use crate::types::{Episode, Fact, KnowledgeDocument, MemoryConfig, Turn};
use crate::Result;

/// The five backend adapters the tiers are built over, grouped into one
/// argument so callers don't hand [`UnifiedMemorySystem::new`] five
/// positional `Arc<dyn ...>`s in an easy-to-transpose order.
pub struct StorageAdapters {
    /// Backs L1's hot path.
    pub hot: Arc<dyn HotStore>,
    /// Backs L1's write-through cold path and all of L2.
    pub durable: Arc<dyn RelationalStore>,
    /// Backs L3's vector index.
    pub vectors: Arc<dyn VectorStore>,
    /// Backs L3's graph index.
    pub graph: Arc<dyn GraphStore>,
    /// Backs L4.
    pub fulltext: Arc<dyn FullTextStore>,
}

/// Health of a single tier's backing store(s).
#[derive(Debug, Clone, PartialEq)]
pub enum TierHealth {
    /// Every backing store answered its connectivity probe.
    Healthy,
    /// At least one backing store failed its probe; the reason is the
    /// joined error text, not meant for anything but logging/display.
    Degraded(String),
}

impl TierHealth {
    fn from_probes(probes: Vec<(&str, Result<()>)>) -> Self {
        let reasons: Vec<String> = probes
            .into_iter()
            .filter_map(|(name, result)| result.err().map(|e| format!("{name}: {e}")))
            .collect();
        if reasons.is_empty() {
            TierHealth::Healthy
        } else {
            TierHealth::Degraded(reasons.join("; "))
        }
    }
}

/// Aggregate health snapshot across all four tiers and the shared LLM
/// circuit breaker.
#[derive(Debug, Clone)]
pub struct HealthReport {
    /// L1 hot + durable stores.
    pub l1: TierHealth,
    /// L2 durable store (shared with L1's cold path).
    pub l2: TierHealth,
    /// L3 vector index.
    pub l3_vector: TierHealth,
    /// L3 graph index.
    pub l3_graph: TierHealth,
    /// L4 full-text index.
    pub l4: TierHealth,
    /// Current state of the shared LLM circuit breaker.
    pub llm_circuit: CircuitState,
}

impl HealthReport {
    /// Whether every tier answered healthy. Does not consider
    /// `llm_circuit`: an open breaker degrades the LLM-driven engines
    /// gracefully rather than making the system unhealthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        [&self.l1, &self.l2, &self.l3_vector, &self.l3_graph, &self.l4]
            .into_iter()
            .all(|h| matches!(h, TierHealth::Healthy))
    }
}

/// What to recall for a session. Each field is independent: a caller
/// after only L1/L2 context leaves `query_embedding`/`query_text` unset
/// and pays for nothing beyond those two tiers.
#[derive(Debug, Clone, Default)]
pub struct RecallRequest {
    /// Session to recall L1/L2/L3 context for.
    pub session_id: String,
    /// Cap on L1 turns returned; `None` returns the full window.
    pub turn_limit: Option<usize>,
    /// Cap on L2 facts returned.
    pub fact_limit: Option<usize>,
    /// Embedding to k-NN search L3 episodes with; omit to skip L3.
    pub query_embedding: Option<Vec<f32>>,
    /// Neighbors to return from the L3 search.
    pub episode_topk: usize,
    /// Free-text query to search L4 knowledge documents with; omit to
    /// skip L4.
    pub query_text: Option<String>,
    /// Cap on L4 documents returned.
    pub knowledge_limit: usize,
}

/// Cross-tier recall result. A tier that failed its own query is
/// represented as an empty `Vec`, not an error — see [`UnifiedMemorySystem::recall`].
#[derive(Debug, Clone, Default)]
pub struct RecallResult {
    /// L1 turns, chronological.
    pub turns: Vec<Turn>,
    /// L2 facts, `ciar_score` descending.
    pub facts: Vec<Fact>,
    /// L3 episodes, nearest-first (empty unless `query_embedding` was set).
    pub episodes: Vec<Episode>,
    /// L4 documents, confidence descending (empty unless `query_text` was set).
    pub knowledge: Vec<KnowledgeDocument>,
}

/// Composition root wiring the four tiers, three lifecycle engines, and
/// their shared LLM client / circuit breaker / telemetry handle.
pub struct UnifiedMemorySystem {
    l1: Arc<ActiveContextTier>,
    l2: Arc<WorkingMemoryTier>,
    l3: Arc<EpisodicMemoryTier>,
    l4: Arc<SemanticMemoryTier>,
    promotion: Arc<PromotionEngine>,
    consolidation: Arc<ConsolidationEngine>,
    distillation: Arc<DistillationEngine>,
    breaker: Arc<CircuitBreaker>,
    telemetry: Arc<Telemetry>,
    hot: Arc<dyn HotStore>,
    durable: Arc<dyn RelationalStore>,
    vectors: Arc<dyn VectorStore>,
    graph: Arc<dyn GraphStore>,
    fulltext: Arc<dyn FullTextStore>,
}

impl UnifiedMemorySystem {
    /// Build the full system: four tiers over `adapters`, one shared
    /// circuit breaker guarding `llm`, and the three lifecycle engines
    /// cross-wired (Promotion→Consolidation→Distillation) so a single
    /// [`Self::ingest_turn`] call is enough to drive the whole pipeline
    /// once [`Self::start_engines`] is called.
    #[must_use]
    pub fn new(adapters: StorageAdapters, llm: Arc<dyn LlmClient>, config: MemoryConfig) -> Self {
        let telemetry = Arc::new(Telemetry::new());
        let breaker = Arc::new(CircuitBreaker::for_endpoint(
            "unified-memory-llm",
            CircuitBreakerConfig {
                failure_threshold: config.circuit_breaker.failure_threshold,
                timeout: config.circuit_breaker.reset_timeout,
                ..CircuitBreakerConfig::default()
            },
        ));
        let scorer = CiarScorer::new(config.ciar.clone());

        let l1 = Arc::new(ActiveContextTier::new(
            adapters.hot.clone(),
            adapters.durable.clone(),
            config.l1.clone(),
        ));
        let l2 = Arc::new(WorkingMemoryTier::new(
            adapters.durable.clone(),
            scorer.clone(),
            config.l2.clone(),
        ));
        let l3 = Arc::new(EpisodicMemoryTier::new(
            adapters.vectors.clone(),
            adapters.graph.clone(),
            config.l3.clone(),
        ));
        let l4 = Arc::new(SemanticMemoryTier::new(adapters.fulltext.clone()));

        let distillation = Arc::new(DistillationEngine::new(
            l4.clone(),
            llm.clone(),
            breaker.clone(),
            config.l4.clone(),
            config.engines.distillation_interval,
            telemetry.clone(),
        ));
        let consolidation = Arc::new(ConsolidationEngine::new(
            l2.clone(),
            l3.clone(),
            llm.clone(),
            config.l3.clone(),
            config.engines.consolidation_interval,
            telemetry.clone(),
            Some(distillation.clone()),
        ));
        let promotion = Arc::new(PromotionEngine::new(
            l1.clone(),
            l2.clone(),
            llm,
            breaker.clone(),
            scorer,
            config.engines.promotion_interval,
            telemetry.clone(),
            Some(consolidation.clone()),
        ));

        Self {
            l1,
            l2,
            l3,
            l4,
            promotion,
            consolidation,
            distillation,
            breaker,
            telemetry,
            hot: adapters.hot,
            durable: adapters.durable,
            vectors: adapters.vectors,
            graph: adapters.graph,
            fulltext: adapters.fulltext,
        }
    }

    /// Spawn the background worker loop for each of the three engines.
    /// Returns immediately. Calling this twice spawns duplicate worker
    /// loops; call it once per process, typically at startup.
    pub fn start_engines(&self) {
        self.promotion.clone().start();
        self.consolidation.clone().start();
        self.distillation.clone().start();
        info!("unified memory system engines started");
    }

    /// Signal all three engines to stop once their queues drain. Does
    /// not wait for the drain; pair with each engine's
    /// `wait_until_idle` beforehand if a clean shutdown matters.
    pub async fn stop_engines(&self) {
        self.promotion.stop().await;
        self.consolidation.stop().await;
        self.distillation.stop().await;
        info!("unified memory system engines stopped");
    }

    /// Append a turn to L1 and notify the promotion engine. The rest of
    /// the pipeline (segmentation, extraction, consolidation,
    /// distillation) runs asynchronously off this single call.
    ///
    /// # Errors
    ///
    /// See [`ActiveContextTier::store`].
    #[instrument(skip(self, turn), fields(session_id = %turn.session_id))]
    pub async fn ingest_turn(&self, turn: Turn) -> Result<()> {
        let session_id = turn.session_id.clone();
        self.l1.store(&turn).await?;
        self.promotion.notify_session(session_id).await;
        self.telemetry.counter("turns_ingested_total").increment();
        Ok(())
    }

    /// Recall context for a session across whichever tiers `request`
    /// asks for. Each tier is queried independently; a failing tier
    /// logs a warning and contributes an empty slice rather than
    /// failing the whole call, so a caller assembling a prompt gets as
    /// much context as is currently available.
    pub async fn recall(&self, request: &RecallRequest) -> RecallResult {
        let turns = match self.l1.query(&request.session_id, request.turn_limit).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(session_id = %request.session_id, error = %e, "L1 recall degraded");
                Vec::new()
            }
        };

        let facts = match self
            .l2
            .query(&FactQuery {
                session_id: Some(request.session_id.clone()),
                min_ciar: Some(0.0),
                limit: request.fact_limit,
                ..Default::default()
            })
            .await
        {
            Ok(facts) => facts,
            Err(e) => {
                warn!(session_id = %request.session_id, error = %e, "L2 recall degraded");
                Vec::new()
            }
        };

        let episodes = if let Some(vector) = &request.query_embedding {
            match self
                .l3
                .query(&EpisodeQuery {
                    session_id: Some(request.session_id.clone()),
                    vector: Some(vector.clone()),
                    topk: request.episode_topk.max(1),
                    entities: Vec::new(),
                })
                .await
            {
                Ok(episodes) => episodes,
                Err(e) => {
                    warn!(session_id = %request.session_id, error = %e, "L3 recall degraded");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let knowledge = if let Some(query) = &request.query_text {
            match self.l4.search(query, None, request.knowledge_limit.max(1)).await {
                Ok(docs) => docs,
                Err(e) => {
                    warn!(session_id = %request.session_id, error = %e, "L4 recall degraded");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        RecallResult { turns, facts, episodes, knowledge }
    }

    /// Probe every backing store's `health_check` and the LLM circuit
    /// breaker's current state. Never fails: probe failures surface as
    /// `TierHealth::Degraded`, not as an `Err`.
    pub async fn health_check(&self) -> HealthReport {
        HealthReport {
            l1: TierHealth::from_probes(vec![
                ("hot", self.hot.health_check().await),
                ("durable", self.durable.health_check().await),
            ]),
            l2: TierHealth::from_probes(vec![("durable", self.durable.health_check().await)]),
            l3_vector: TierHealth::from_probes(vec![("vector", self.vectors.health_check().await)]),
            l3_graph: TierHealth::from_probes(vec![("graph", self.graph.health_check().await)]),
            l4: TierHealth::from_probes(vec![("fulltext", self.fulltext.health_check().await)]),
            llm_circuit: self.breaker.state().await,
        }
    }

    /// Direct access to L1, for callers that need tier-specific
    /// operations [`Self::recall`] doesn't expose (e.g. session delete).
    #[must_use]
    pub fn l1(&self) -> &Arc<ActiveContextTier> {
        &self.l1
    }

    /// Direct access to L2.
    #[must_use]
    pub fn l2(&self) -> &Arc<WorkingMemoryTier> {
        &self.l2
    }

    /// Direct access to L3.
    #[must_use]
    pub fn l3(&self) -> &Arc<EpisodicMemoryTier> {
        &self.l3
    }

    /// Direct access to L4.
    #[must_use]
    pub fn l4(&self) -> &Arc<SemanticMemoryTier> {
        &self.l4
    }

    /// Shared telemetry handle, for callers reporting engine activity
    /// (counters such as `turns_ingested_total`, `facts_promoted_total`)
    /// without going through [`Self::health_check`].
    #[must_use]
    pub fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }
}
