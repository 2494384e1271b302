//! Circuit breaker shared by LLM-dependent components (§4.11).
//!
//! ## Circuit States
//!
//! - **Closed**: Normal operation, all calls pass through.
//! - **Open**: `failure_threshold` consecutive failures detected; calls
//!   short-circuit immediately.
//! - **Half-Open**: `reset_timeout` has elapsed; a single probe call is
//!   allowed through to test recovery.
//!
//! One breaker instance is shared per external dependency — typically one
//! per LLM endpoint — and injected into `TopicSegmenter`, `FactExtractor`,
//! and the engines that call them.
//!
//! ## Example
//!
//! ```no_run
//! use memory_core::storage::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> memory_core::Result<()> {
//! let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default()));
//!
//! let result = breaker.call(|| async {
//!     // an LLM call
//!     Ok::<_, memory_core::Error>(())
//! }).await;
//! # Ok(())
//! # }
//! ```

mod states;

pub use states::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
