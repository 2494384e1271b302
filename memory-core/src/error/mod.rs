//! Error taxonomy for the memory subsystem.
//!
//! Every fallible operation across the four tiers and three lifecycle
//! engines returns [`Error`]. The taxonomy distinguishes errors that are
//! safe to retry from ones that must be surfaced to the caller immediately,
//! via [`Error::is_recoverable`].

use uuid::Uuid;

/// Result type alias used throughout the memory subsystem.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the four-tier memory subsystem.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A storage backend is unavailable, or a write failed after retries
    /// were exhausted. Surfaced to the caller.
    #[error("tier storage error: {0}")]
    TierStorageError(String),

    /// A record violates one of the data-model invariants (§3): length
    /// bounds, required fields, cross-field ordering. Surfaced to the
    /// caller.
    #[error("validation failed: {0}")]
    ValidationError(String),

    /// Expected rejection when a fact's CIAR score falls below the
    /// configured threshold. Normal control flow for engines; an error for
    /// direct API callers.
    #[error("CIAR score {score:.4} below threshold {threshold:.4}")]
    CIARThresholdError {
        /// The fact's computed CIAR score.
        score: f32,
        /// The configured L2 retention threshold.
        threshold: f32,
    },

    /// An episode's dual-index write partially succeeded and the
    /// compensating rollback ran. The episode is not stored.
    #[error("dual-index write failed for episode {episode_id}: {reason}")]
    DualIndexError {
        /// The episode that failed to fully index.
        episode_id: Uuid,
        /// What went wrong.
        reason: String,
    },

    /// An LLM-dependent call was short-circuited by an open circuit
    /// breaker. Engines handle this via their rule-based fallback, not as
    /// a failure.
    #[error("circuit breaker open for {endpoint}")]
    CircuitOpen {
        /// Name of the guarded endpoint/dependency.
        endpoint: String,
    },

    /// A backend failure that the retry policy is still working through.
    /// Only surfaces once the retry budget is exhausted.
    #[error("transient backend error: {0}")]
    TransientBackendError(String),

    /// A requested record does not exist.
    #[error("not found: {0}")]
    NotFound(Uuid),

    /// The requested operation is not valid given current state (e.g.
    /// stopping an engine that was never started).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Configuration could not be parsed or was out of range.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An operation exceeded its configured timeout.
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Serialization/deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO failure (file system, socket).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error is safe to retry with backoff.
    ///
    /// Used by [`crate::retry::RetryPolicy`] and
    /// [`crate::storage::circuit_breaker::CircuitBreaker`] to decide
    /// whether a failure should count against the retry budget / breaker
    /// threshold.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::TierStorageError(_)
                | Error::TransientBackendError(_)
                | Error::CircuitOpen { .. }
                | Error::Timeout(_)
                | Error::Io(_)
        )
    }

    /// Whether this error represents an expected, non-exceptional outcome
    /// (e.g. CIAR threshold rejection) rather than a genuine failure.
    #[must_use]
    pub fn is_expected_rejection(&self) -> bool {
        matches!(self, Error::CIARThresholdError { .. })
    }
}
