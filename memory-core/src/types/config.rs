//! Configuration for the four-tier memory subsystem.
//!
//! One sub-config per tier/engine/scorer/breaker, each with a `Default`
//! matching the §6 recognized defaults, aggregated into [`MemoryConfig`]
//! with an [`MemoryConfig::from_env`] reader for the `MEMORY_*` variables.

use std::time::Duration;

use crate::constants::{circuit_breaker, ciar, engines, retry, segmentation, tiers};

/// L1 `ActiveContextTier` configuration.
#[derive(Debug, Clone)]
pub struct L1Config {
    /// Turns retained per session (10-20, default 20).
    pub window_size: usize,
    /// TTL applied on every write.
    pub ttl_hours: i64,
}

impl Default for L1Config {
    fn default() -> Self {
        Self {
            window_size: tiers::L1_WINDOW_SIZE,
            ttl_hours: tiers::L1_TTL_HOURS,
        }
    }
}

/// L2 `WorkingMemoryTier` configuration.
#[derive(Debug, Clone)]
pub struct L2Config {
    /// TTL applied to facts from extraction time.
    pub ttl_days: i64,
    /// Minimum CIAR score required for `L2.store` to accept a fact.
    pub ciar_threshold: f32,
}

impl Default for L2Config {
    fn default() -> Self {
        Self {
            ttl_days: tiers::L2_TTL_DAYS,
            ciar_threshold: tiers::L2_CIAR_THRESHOLD,
        }
    }
}

/// L3 `EpisodicMemoryTier` configuration.
#[derive(Debug, Clone)]
pub struct L3Config {
    /// Dimensionality of episode embeddings.
    pub vector_dim: usize,
    /// Maximum gap between consecutive facts before a new time-cluster
    /// starts during consolidation.
    pub cluster_gap_minutes: i64,
}

impl Default for L3Config {
    fn default() -> Self {
        Self {
            vector_dim: tiers::L3_VECTOR_DIM,
            cluster_gap_minutes: tiers::L3_CLUSTER_GAP_MINUTES,
        }
    }
}

/// L4 `SemanticMemoryTier` configuration.
#[derive(Debug, Clone)]
pub struct L4Config {
    /// Minimum distinct-episode occurrence count for a theme to be
    /// considered a pattern worth distilling.
    pub min_occurrences: usize,
}

impl Default for L4Config {
    fn default() -> Self {
        Self {
            min_occurrences: tiers::L4_MIN_OCCURRENCES,
        }
    }
}

/// `CIARScorer` configuration (§4.5).
#[derive(Debug, Clone)]
pub struct CiarConfig {
    /// Age-decay rate λ.
    pub decay_lambda: f64,
    /// Recency-boost growth rate α.
    pub recency_alpha: f64,
    /// Recency-boost upper bound.
    pub recency_max_boost: f64,
}

impl Default for CiarConfig {
    fn default() -> Self {
        Self {
            decay_lambda: ciar::DECAY_LAMBDA,
            recency_alpha: ciar::RECENCY_ALPHA,
            recency_max_boost: ciar::RECENCY_MAX_BOOST,
        }
    }
}

/// Lifecycle-engine cycle configuration (§4.8-§4.10).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// `PromotionEngine` cycle interval.
    pub promotion_interval: Duration,
    /// `ConsolidationEngine` cycle interval.
    pub consolidation_interval: Duration,
    /// `DistillationEngine` cycle interval.
    pub distillation_interval: Duration,
    /// Minimum L1 turns before a batch is segmented.
    pub batch_min_turns: usize,
    /// Maximum turns handed to a single segmentation call.
    pub batch_max_turns: usize,
    /// Window of L2 facts a consolidation cycle considers.
    pub consolidation_window: Duration,
    /// Graceful-stop budget.
    pub stop_timeout: Duration,
    /// Abandon-and-log budget for a stuck cycle.
    pub cycle_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            promotion_interval: Duration::from_secs(engines::PROMOTION_INTERVAL_S),
            consolidation_interval: Duration::from_secs(engines::CONSOLIDATION_INTERVAL_S),
            distillation_interval: Duration::from_secs(engines::DISTILLATION_INTERVAL_S),
            batch_min_turns: segmentation::BATCH_MIN_TURNS,
            batch_max_turns: segmentation::BATCH_MAX_TURNS,
            consolidation_window: Duration::from_secs(
                (engines::CONSOLIDATION_WINDOW_HOURS * 3600) as u64,
            ),
            stop_timeout: Duration::from_secs(engines::STOP_TIMEOUT_S),
            cycle_timeout: Duration::from_secs(engines::CYCLE_TIMEOUT_S),
        }
    }
}

/// Circuit-breaker configuration shared by LLM-dependent components
/// (§4.11).
#[derive(Debug, Clone)]
pub struct CircuitBreakerSettings {
    /// Consecutive failures before the breaker opens.
    pub failure_threshold: u32,
    /// Time spent open before a half-open probe is allowed.
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: circuit_breaker::FAILURE_THRESHOLD,
            reset_timeout: Duration::from_secs(circuit_breaker::RESET_TIMEOUT_S),
        }
    }
}

/// Retry and per-call timeout configuration (§5).
#[derive(Debug, Clone)]
pub struct RetrySettings {
    /// Maximum storage-write retry attempts.
    pub max_retries: u32,
    /// Initial backoff delay.
    pub base_delay: Duration,
    /// Backoff delay ceiling.
    pub max_delay: Duration,
    /// Per-call storage timeout.
    pub storage_timeout: Duration,
    /// Per-call LLM timeout.
    pub llm_timeout: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: retry::STORAGE_MAX_RETRIES,
            base_delay: Duration::from_millis(retry::STORAGE_BASE_DELAY_MS),
            max_delay: Duration::from_millis(retry::STORAGE_MAX_DELAY_MS),
            storage_timeout: Duration::from_secs(retry::STORAGE_TIMEOUT_S),
            llm_timeout: Duration::from_secs(retry::LLM_TIMEOUT_S),
        }
    }
}

/// Aggregate configuration for the memory subsystem.
///
/// # Examples
///
/// ```
/// use memory_core::types::MemoryConfig;
///
/// let config = MemoryConfig::default();
/// assert_eq!(config.l1.window_size, 20);
/// assert_eq!(config.l2.ciar_threshold, 0.6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    /// L1 settings.
    pub l1: L1Config,
    /// L2 settings.
    pub l2: L2Config,
    /// L3 settings.
    pub l3: L3Config,
    /// L4 settings.
    pub l4: L4Config,
    /// CIAR scoring settings.
    pub ciar: CiarConfig,
    /// Engine cycle settings.
    pub engines: EngineConfig,
    /// Circuit breaker settings.
    pub circuit_breaker: CircuitBreakerSettings,
    /// Retry/timeout settings.
    pub retry: RetrySettings,
}

impl MemoryConfig {
    /// Build a `MemoryConfig` from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    ///
    /// # Environment Variables
    ///
    /// * `MEMORY_L1_WINDOW_SIZE` - L1 window size, clamped to `[10, 20]`.
    /// * `MEMORY_L1_TTL_HOURS` - L1 TTL in hours.
    /// * `MEMORY_L2_TTL_DAYS` - L2 fact TTL in days.
    /// * `MEMORY_L2_CIAR_THRESHOLD` - L2 retention threshold, clamped to
    ///   `[0, 1]`.
    /// * `MEMORY_L3_VECTOR_DIM` - episode embedding dimensionality.
    /// * `MEMORY_L3_CLUSTER_GAP_MINUTES` - consolidation time-cluster gap.
    /// * `MEMORY_L4_MIN_OCCURRENCES` - distillation occurrence threshold.
    /// * `MEMORY_PROMOTION_INTERVAL_S` / `MEMORY_CONSOLIDATION_INTERVAL_S`
    ///   / `MEMORY_DISTILLATION_INTERVAL_S` - engine cycle intervals.
    /// * `MEMORY_CIRCUIT_FAILURE_THRESHOLD` /
    ///   `MEMORY_CIRCUIT_RESET_TIMEOUT_S` - circuit breaker tuning.
    ///
    /// # Examples
    ///
    /// ```
    /// use memory_core::types::MemoryConfig;
    ///
    /// // With MEMORY_L2_CIAR_THRESHOLD=0.75 set:
    /// let config = MemoryConfig::from_env();
    /// ```
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("MEMORY_L1_WINDOW_SIZE") {
            if let Ok(value) = raw.parse::<usize>() {
                config.l1.window_size =
                    value.clamp(tiers::L1_WINDOW_SIZE_MIN, tiers::L1_WINDOW_SIZE_MAX);
            } else {
                tracing::warn!("invalid MEMORY_L1_WINDOW_SIZE '{}', keeping default", raw);
            }
        }

        if let Ok(raw) = std::env::var("MEMORY_L1_TTL_HOURS") {
            if let Ok(value) = raw.parse::<i64>() {
                config.l1.ttl_hours = value;
            }
        }

        if let Ok(raw) = std::env::var("MEMORY_L2_TTL_DAYS") {
            if let Ok(value) = raw.parse::<i64>() {
                config.l2.ttl_days = value;
            }
        }

        if let Ok(raw) = std::env::var("MEMORY_L2_CIAR_THRESHOLD") {
            if let Ok(value) = raw.parse::<f32>() {
                config.l2.ciar_threshold = value.clamp(0.0, 1.0);
            } else {
                tracing::warn!(
                    "invalid MEMORY_L2_CIAR_THRESHOLD '{}', keeping default",
                    raw
                );
            }
        }

        if let Ok(raw) = std::env::var("MEMORY_L3_VECTOR_DIM") {
            if let Ok(value) = raw.parse::<usize>() {
                config.l3.vector_dim = value;
            }
        }

        if let Ok(raw) = std::env::var("MEMORY_L3_CLUSTER_GAP_MINUTES") {
            if let Ok(value) = raw.parse::<i64>() {
                config.l3.cluster_gap_minutes = value;
            }
        }

        if let Ok(raw) = std::env::var("MEMORY_L4_MIN_OCCURRENCES") {
            if let Ok(value) = raw.parse::<usize>() {
                config.l4.min_occurrences = value;
            }
        }

        if let Ok(raw) = std::env::var("MEMORY_PROMOTION_INTERVAL_S") {
            if let Ok(value) = raw.parse::<u64>() {
                config.engines.promotion_interval = Duration::from_secs(value);
            }
        }

        if let Ok(raw) = std::env::var("MEMORY_CONSOLIDATION_INTERVAL_S") {
            if let Ok(value) = raw.parse::<u64>() {
                config.engines.consolidation_interval = Duration::from_secs(value);
            }
        }

        if let Ok(raw) = std::env::var("MEMORY_DISTILLATION_INTERVAL_S") {
            if let Ok(value) = raw.parse::<u64>() {
                config.engines.distillation_interval = Duration::from_secs(value);
            }
        }

        if let Ok(raw) = std::env::var("MEMORY_CIRCUIT_FAILURE_THRESHOLD") {
            if let Ok(value) = raw.parse::<u32>() {
                config.circuit_breaker.failure_threshold = value;
            }
        }

        if let Ok(raw) = std::env::var("MEMORY_CIRCUIT_RESET_TIMEOUT_S") {
            if let Ok(value) = raw.parse::<u64>() {
                config.circuit_breaker.reset_timeout = Duration::from_secs(value);
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = MemoryConfig::default();
        assert_eq!(config.l1.window_size, 20);
        assert_eq!(config.l1.ttl_hours, 24);
        assert_eq!(config.l2.ttl_days, 7);
        assert_eq!(config.l2.ciar_threshold, 0.6);
        assert_eq!(config.l3.cluster_gap_minutes, 60);
        assert_eq!(config.l4.min_occurrences, 3);
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.reset_timeout, Duration::from_secs(60));
    }

    #[test]
    fn from_env_clamps_window_size() {
        std::env::set_var("MEMORY_L1_WINDOW_SIZE", "999");
        let config = MemoryConfig::from_env();
        assert_eq!(config.l1.window_size, tiers::L1_WINDOW_SIZE_MAX);
        std::env::remove_var("MEMORY_L1_WINDOW_SIZE");
    }

    #[test]
    fn from_env_clamps_ciar_threshold() {
        std::env::set_var("MEMORY_L2_CIAR_THRESHOLD", "2.0");
        let config = MemoryConfig::from_env();
        assert_eq!(config.l2.ciar_threshold, 1.0);
        std::env::remove_var("MEMORY_L2_CIAR_THRESHOLD");
    }
}
