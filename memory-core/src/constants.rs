//! Default configuration values for the four-tier memory subsystem.
//!
//! Centralizes the numeric defaults named in the system's external
//! interface contract so they are defined once and referenced from
//! [`crate::types::config`], the tiers, and the lifecycle engines.

/// Tier defaults (§6: `L1.*`, `L2.*`, `L3.*`, `L4.*`).
pub mod tiers {
    /// L1 active-context window size (turns retained per session).
    pub const L1_WINDOW_SIZE: usize = 20;
    /// Smallest allowed `L1.window_size` override.
    pub const L1_WINDOW_SIZE_MIN: usize = 10;
    /// Largest allowed `L1.window_size` override.
    pub const L1_WINDOW_SIZE_MAX: usize = 20;
    /// L1 TTL in hours.
    pub const L1_TTL_HOURS: i64 = 24;
    /// L2 fact TTL in days.
    pub const L2_TTL_DAYS: i64 = 7;
    /// L2 CIAR retention threshold.
    pub const L2_CIAR_THRESHOLD: f32 = 0.6;
    /// L3 embedding dimensionality used by the default vector adapter.
    pub const L3_VECTOR_DIM: usize = 384;
    /// L3 consolidation time-cluster gap, in minutes.
    pub const L3_CLUSTER_GAP_MINUTES: i64 = 60;
    /// L4 minimum theme occurrence count to be considered a pattern.
    pub const L4_MIN_OCCURRENCES: usize = 3;
}

/// CIAR scoring defaults (§4.5).
pub mod ciar {
    /// Age-decay rate λ; half-life ≈ 30 days at this value.
    pub const DECAY_LAMBDA: f64 = 0.0231;
    /// Recency-boost growth rate α.
    pub const RECENCY_ALPHA: f64 = 0.1;
    /// Recency-boost upper bound.
    pub const RECENCY_MAX_BOOST: f64 = 2.0;
    /// Certainty prior for a declarative statement.
    pub const CERTAINTY_DECLARATIVE: f32 = 0.8;
    /// Certainty prior for a question.
    pub const CERTAINTY_QUESTION: f32 = 0.3;
    /// Certainty prior for a hedged statement ("I think", "maybe").
    pub const CERTAINTY_HEDGE: f32 = 0.4;
    /// Impact weight for a preference fact.
    pub const IMPACT_PREFERENCE: f32 = 0.9;
    /// Impact weight for a constraint fact.
    pub const IMPACT_CONSTRAINT: f32 = 0.8;
    /// Impact weight for an entity fact.
    pub const IMPACT_ENTITY: f32 = 0.6;
    /// Impact weight for an event fact.
    pub const IMPACT_EVENT: f32 = 0.6;
    /// Impact weight for a relationship fact.
    pub const IMPACT_RELATIONSHIP: f32 = 0.6;
    /// Impact weight for a passing mention.
    pub const IMPACT_MENTION: f32 = 0.3;
    /// Impact weight for an uncategorized fact.
    pub const IMPACT_OTHER: f32 = 0.4;
}

/// Topic-segmentation batch bounds (§4.6).
pub mod segmentation {
    /// Minimum L1 window length before a promotion cycle segments it.
    pub const BATCH_MIN_TURNS: usize = 10;
    /// Maximum turns handed to a single segmentation call; longer windows
    /// are truncated to the most recent `BATCH_MAX_TURNS`.
    pub const BATCH_MAX_TURNS: usize = 20;
    /// Certainty assigned to the single fallback segment produced when
    /// the LLM is unavailable or returns invalid JSON.
    pub const FALLBACK_CERTAINTY: f32 = 0.3;
    /// Impact assigned to the fallback segment.
    pub const FALLBACK_IMPACT: f32 = 0.3;
    /// Maximum length of the fallback segment's summary.
    pub const FALLBACK_SUMMARY_MAX_CHARS: usize = 2000;
}

/// Lifecycle-engine cycle intervals and timeouts (§5, §6).
pub mod engines {
    /// `PromotionEngine` cycle interval, in seconds.
    pub const PROMOTION_INTERVAL_S: u64 = 60;
    /// `ConsolidationEngine` cycle interval, in seconds.
    pub const CONSOLIDATION_INTERVAL_S: u64 = 3600;
    /// `DistillationEngine` cycle interval, in seconds.
    pub const DISTILLATION_INTERVAL_S: u64 = 86_400;
    /// Default window (hours) of L2 facts a consolidation cycle considers.
    pub const CONSOLIDATION_WINDOW_HOURS: i64 = 24;
    /// Graceful-stop budget before a running cycle is forcibly cancelled.
    pub const STOP_TIMEOUT_S: u64 = 30;
    /// Abandon-and-log budget for a single stuck engine cycle.
    pub const CYCLE_TIMEOUT_S: u64 = 300;
}

/// Retry and per-call timeout defaults (§5).
pub mod retry {
    /// Maximum storage-write retry attempts per call.
    pub const STORAGE_MAX_RETRIES: u32 = 3;
    /// Initial backoff delay.
    pub const STORAGE_BASE_DELAY_MS: u64 = 1000;
    /// Backoff delay ceiling.
    pub const STORAGE_MAX_DELAY_MS: u64 = 30_000;
    /// Per-call storage timeout, in seconds.
    pub const STORAGE_TIMEOUT_S: u64 = 5;
    /// Per-call LLM timeout, in seconds.
    pub const LLM_TIMEOUT_S: u64 = 30;
}

/// Circuit-breaker defaults (§4.11).
pub mod circuit_breaker {
    /// Consecutive failures before the breaker opens.
    pub const FAILURE_THRESHOLD: u32 = 5;
    /// Time spent open before a half-open probe is allowed.
    pub const RESET_TIMEOUT_S: u64 = 60;
}
