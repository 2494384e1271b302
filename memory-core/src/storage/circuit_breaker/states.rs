//! Circuit breaker state machine (§4.11).

use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation - requests pass through.
    Closed,
    /// Too many failures - reject requests immediately.
    Open,
    /// Testing recovery - allow a probe request.
    HalfOpen,
}

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens (default: 5).
    pub failure_threshold: u32,
    /// How long the circuit stays open before a half-open probe is
    /// allowed (default: 60s — spec's `reset_timeout`).
    pub timeout: Duration,
    /// How long a half-open probe window lasts (default: 10s).
    pub half_open_test_period: Duration,
    /// Base delay for the exponential backoff helper (default: 100ms).
    pub base_delay: Duration,
    /// Maximum delay for the exponential backoff helper (default:
    /// 1600ms).
    pub max_delay: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(60),
            half_open_test_period: Duration::from_secs(10),
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1600),
        }
    }
}

/// Circuit breaker statistics, exposed for metrics/health reporting.
#[derive(Debug, Clone, Default)]
pub struct CircuitBreakerStats {
    /// Total number of calls attempted.
    pub total_calls: u64,
    /// Number of successful calls.
    pub successful_calls: u64,
    /// Number of failed calls.
    pub failed_calls: u64,
    /// Number of calls rejected because the circuit was open.
    pub rejected_calls: u64,
    /// Current consecutive failure count.
    pub consecutive_failures: u32,
    /// Number of times the circuit has opened.
    pub circuit_opened_count: u32,
}

struct CircuitBreakerState {
    state: CircuitState,
    stats: CircuitBreakerStats,
    last_failure_time: Option<Instant>,
    half_open_started: Option<Instant>,
}

impl Default for CircuitBreakerState {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            stats: CircuitBreakerStats::default(),
            last_failure_time: None,
            half_open_started: None,
        }
    }
}

/// Shared fault isolator for a single external dependency (typically one
/// LLM endpoint).
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    endpoint: String,
    state: Arc<RwLock<CircuitBreakerState>>,
}

impl CircuitBreaker {
    /// Create a breaker for the default ("default") endpoint.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::for_endpoint("default", config)
    }

    /// Create a breaker labeled for a specific endpoint, used in the
    /// `CircuitOpen` error and log lines to disambiguate multiple
    /// breakers sharing a process.
    ///
    /// # Example
    ///
    /// ```
    /// use memory_core::storage::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
    ///
    /// let breaker = CircuitBreaker::for_endpoint("topic-segmenter-llm", CircuitBreakerConfig::default());
    /// ```
    #[must_use]
    pub fn for_endpoint(endpoint: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let endpoint = endpoint.into();
        info!(
            endpoint = %endpoint,
            threshold = config.failure_threshold,
            timeout = ?config.timeout,
            "initializing circuit breaker"
        );

        Self {
            config,
            endpoint,
            state: Arc::new(RwLock::new(CircuitBreakerState::default())),
        }
    }

    /// Execute an operation protected by the circuit breaker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircuitOpen`] without invoking `operation` if the
    /// circuit is open; otherwise propagates `operation`'s error.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use memory_core::storage::circuit_breaker::CircuitBreaker;
    /// # use memory_core::storage::circuit_breaker::CircuitBreakerConfig;
    /// # async fn example() -> memory_core::Result<()> {
    /// let cb = CircuitBreaker::new(CircuitBreakerConfig::default());
    /// let result = cb.call(|| async {
    ///     Ok::<_, memory_core::Error>(())
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let should_proceed = self.should_allow_request().await;

        if !should_proceed {
            let mut state = self.state.write().await;
            state.stats.rejected_calls += 1;
            debug!(endpoint = %self.endpoint, "circuit breaker rejecting request - circuit is open");
            return Err(Error::CircuitOpen {
                endpoint: self.endpoint.clone(),
            });
        }

        {
            let mut state = self.state.write().await;
            state.stats.total_calls += 1;
        }

        let result = operation().await;
        self.on_result(&result).await;
        result
    }

    async fn should_allow_request(&self) -> bool {
        let now = Instant::now();
        let mut state = self.state.write().await;

        match state.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if let Some(last_failure) = state.last_failure_time {
                    if now.duration_since(last_failure) >= self.config.timeout {
                        info!(endpoint = %self.endpoint, "circuit breaker transitioning to half-open state");
                        state.state = CircuitState::HalfOpen;
                        state.half_open_started = Some(now);
                        true
                    } else {
                        false
                    }
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => true,
        }
    }

    async fn on_result<T>(&self, result: &Result<T>) {
        let mut state = self.state.write().await;

        match result {
            Ok(_) => {
                state.stats.successful_calls += 1;
                self.on_success(&mut state);
            }
            Err(e) => {
                if e.is_recoverable() {
                    state.stats.failed_calls += 1;
                    self.on_failure(&mut state);
                } else {
                    debug!(endpoint = %self.endpoint, error = %e, "non-recoverable error, not affecting circuit");
                }
            }
        }
    }

    fn on_success(&self, state: &mut CircuitBreakerState) {
        match state.state {
            CircuitState::HalfOpen => {
                info!(endpoint = %self.endpoint, "circuit breaker closing after successful recovery probe");
                state.state = CircuitState::Closed;
                state.stats.consecutive_failures = 0;
                state.last_failure_time = None;
                state.half_open_started = None;
            }
            CircuitState::Closed => {
                if state.stats.consecutive_failures > 0 {
                    state.stats.consecutive_failures = 0;
                }
            }
            CircuitState::Open => {
                warn!(endpoint = %self.endpoint, "unexpected success while circuit open");
            }
        }
    }

    fn on_failure(&self, state: &mut CircuitBreakerState) {
        state.stats.consecutive_failures += 1;
        state.last_failure_time = Some(Instant::now());

        debug!(
            endpoint = %self.endpoint,
            consecutive_failures = state.stats.consecutive_failures,
            threshold = self.config.failure_threshold,
            "circuit breaker recorded failure"
        );

        match state.state {
            CircuitState::Closed => {
                if state.stats.consecutive_failures >= self.config.failure_threshold {
                    warn!(
                        endpoint = %self.endpoint,
                        consecutive_failures = state.stats.consecutive_failures,
                        "circuit breaker opening"
                    );
                    state.state = CircuitState::Open;
                    state.stats.circuit_opened_count += 1;
                }
            }
            CircuitState::HalfOpen => {
                warn!(endpoint = %self.endpoint, "circuit breaker reopening after probe failure");
                state.state = CircuitState::Open;
                state.stats.circuit_opened_count += 1;
                state.half_open_started = None;
            }
            CircuitState::Open => {}
        }
    }

    /// Current circuit state.
    pub async fn state(&self) -> CircuitState {
        self.state.read().await.state
    }

    /// Current statistics snapshot.
    pub async fn stats(&self) -> CircuitBreakerStats {
        self.state.read().await.stats.clone()
    }

    /// Exponential backoff delay for the given 0-based attempt number.
    #[must_use]
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay_ms = self.config.base_delay.as_millis() as u64 * 2u64.saturating_pow(attempt);
        std::cmp::min(Duration::from_millis(delay_ms), self.config.max_delay)
    }

    /// Force the breaker back to `Closed`, clearing failure history.
    /// Intended for tests and manual operator intervention.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        info!(endpoint = %self.endpoint, "circuit breaker manually reset to closed state");
        state.state = CircuitState::Closed;
        state.stats.consecutive_failures = 0;
        state.last_failure_time = None;
        state.half_open_started = None;
    }
}
