//! `PromotionEngine` (§4.8): L1→L2. Segments a session's active-context
//! window into topics, extracts facts from each segment, and promotes
//! the ones that clear the L2 CIAR threshold.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::ciar::CiarScorer;
use crate::engines::ConsolidationEngine;
use crate::error::Error;
use crate::fact_extraction::FactExtractor;
use crate::segmentation::TopicSegmenter;
use crate::storage::circuit_breaker::CircuitBreaker;
use crate::telemetry::Telemetry;
use crate::tiers::{ActiveContextTier, WorkingMemoryTier};
use crate::Result;

/// Outcome of one promotion cycle for a single session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromotionReport {
    /// Topic segments produced from the session's L1 window.
    pub segments_produced: usize,
    /// Facts extracted across all segments, before CIAR filtering.
    pub facts_extracted: usize,
    /// Facts that cleared the CIAR threshold and were written to L2.
    pub facts_promoted: usize,
    /// Facts rejected by the CIAR threshold (an expected outcome, not a
    /// failure).
    pub facts_rejected: usize,
}

/// Moves facts from L1 (`ActiveContextTier`) to L2 (`WorkingMemoryTier`)
/// via [`TopicSegmenter`] and [`FactExtractor`].
pub struct PromotionEngine {
    l1: Arc<ActiveContextTier>,
    l2: Arc<WorkingMemoryTier>,
    segmenter: TopicSegmenter,
    extractor: FactExtractor,
    telemetry: Arc<Telemetry>,
    interval: Duration,
    queue: Mutex<VecDeque<String>>,
    shutdown: RwLock<bool>,
    consolidation: Option<Arc<ConsolidationEngine>>,
}

impl PromotionEngine {
    /// Build a promotion engine sharing the LLM client and circuit
    /// breaker used by `segmenter`/`extractor` construction.
    /// `consolidation`, if set, is notified of the session after any
    /// facts are promoted so L2→L3 consolidation can run without
    /// polling L2 on its own schedule.
    #[must_use]
    pub fn new(
        l1: Arc<ActiveContextTier>,
        l2: Arc<WorkingMemoryTier>,
        llm: Arc<dyn crate::llm::LlmClient>,
        breaker: Arc<CircuitBreaker>,
        scorer: CiarScorer,
        interval: Duration,
        telemetry: Arc<Telemetry>,
        consolidation: Option<Arc<ConsolidationEngine>>,
    ) -> Self {
        Self {
            l1,
            l2,
            segmenter: TopicSegmenter::new(llm.clone(), breaker.clone()),
            extractor: FactExtractor::new(llm, breaker, scorer),
            telemetry,
            interval,
            queue: Mutex::new(VecDeque::new()),
            shutdown: RwLock::new(false),
            consolidation,
        }
    }

    /// Mark a session as having new L1 turns to promote. Idempotent:
    /// calling this repeatedly before a cycle drains the queue just
    /// re-runs the cycle on the latest window, it never double-counts.
    pub async fn notify_session(&self, session_id: impl Into<String>) {
        let session_id = session_id.into();
        let mut queue = self.queue.lock().await;
        if !queue.iter().any(|s| s == &session_id) {
            queue.push_back(session_id);
        }
    }

    /// Run one promotion cycle for `session_id`: fetch its L1 window,
    /// segment it, extract facts per segment, and write the ones that
    /// clear the CIAR threshold to L2.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TierStorageError`] if reading L1 or
    /// writing L2 fails for a reason other than the expected
    /// below-threshold rejection.
    pub async fn run_cycle_for_session(&self, session_id: &str) -> Result<PromotionReport> {
        let turns = self.l1.retrieve(session_id).await?;
        let segments = self.segmenter.segment(&turns).await?;

        let mut report = PromotionReport {
            segments_produced: segments.len(),
            ..Default::default()
        };

        for segment in &segments {
            let facts = self.extractor.extract(session_id, segment).await?;
            report.facts_extracted += facts.len();

            for fact in &facts {
                match self.l2.store(fact).await {
                    Ok(()) => report.facts_promoted += 1,
                    Err(Error::CIARThresholdError { score, threshold }) => {
                        debug!(session_id, score, threshold, "fact rejected below CIAR threshold");
                        report.facts_rejected += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        self.telemetry.counter("promotion_cycles_total").increment();
        self.telemetry
            .counter("promotion_facts_promoted_total")
            .increment_by(report.facts_promoted as u64);

        if report.facts_promoted > 0 {
            if let Some(consolidation) = &self.consolidation {
                consolidation.notify_session(session_id.to_string()).await;
            }
        }

        Ok(report)
    }

    /// Spawn the background worker: pops queued sessions and runs a
    /// cycle for each, sleeping `interval` whenever the queue is empty.
    /// Returns immediately; call [`Self::stop`] to end the loop.
    pub fn start(self: Arc<Self>) {
        tokio::spawn(async move {
            info!("promotion engine worker started");
            loop {
                if *self.shutdown.read().await {
                    info!("promotion engine worker shutting down");
                    break;
                }

                let next = self.queue.lock().await.pop_front();
                match next {
                    Some(session_id) => {
                        if let Err(e) = self.run_cycle_for_session(&session_id).await {
                            warn!(session_id, error = %e, "promotion cycle failed");
                        }
                    }
                    None => sleep(self.interval).await,
                }
            }
        });
    }

    /// Signal the worker to stop after its current/queued work drains.
    /// Does not block; pair with [`Self::wait_until_idle`] if you need
    /// to observe the queue emptying.
    pub async fn stop(&self) {
        *self.shutdown.write().await = true;
    }

    /// Poll until the session queue is empty or `timeout` elapses.
    /// Returns `true` if the queue drained in time.
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
