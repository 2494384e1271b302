//! CIAR significance scoring (§4.5).
//!
//! `score = clip01((certainty * impact) * age_decay * recency_boost)`
//! governs L2 retention and L1→L2 promotion. `CiarScorer` is pure and
//! deterministic: the same component inputs always produce the same
//! score, which the round-trip laws in §8 rely on.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::types::{CiarComponents, CiarConfig};

/// Computes and recomputes CIAR scores from their components.
#[derive(Debug, Clone)]
pub struct CiarScorer {
    config: CiarConfig,
}

impl CiarScorer {
    /// Build a scorer bound to the given configuration.
    #[must_use]
    pub fn new(config: CiarConfig) -> Self {
        Self { config }
    }

    /// Compute `age_decay = exp(-lambda * age_days)`.
    ///
    /// Monotonically non-increasing in `age_days` for fixed λ (§8
    /// invariant 7); `age_days = 0` always yields exactly `1.0`.
    #[must_use]
    pub fn age_decay(&self, age_days: f64) -> f64 {
        (-self.config.decay_lambda * age_days.max(0.0)).exp()
    }

    /// Compute `recency_boost = min(1 + alpha * access_count, max_boost)`.
    ///
    /// Monotonically non-decreasing in `access_count`, bounded above by
    /// `recency_max_boost` (§8 invariant 8).
    #[must_use]
    pub fn recency_boost(&self, access_count: u64) -> f64 {
        (1.0 + self.config.recency_alpha * access_count as f64)
            .min(self.config.recency_max_boost)
    }

    /// Combine components into the final CIAR score: `clip01((C * I) *
    /// AD * RB)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if any component is NaN or
    /// infinite (§4.5 edge cases).
    ///
    /// # Examples
    ///
    /// ```
    /// use memory_core::ciar::CiarScorer;
    /// use memory_core::types::{CiarComponents, CiarConfig};
    ///
    /// let scorer = CiarScorer::new(CiarConfig::default());
    /// let score = scorer.score(&CiarComponents {
    ///     certainty: 0.9,
    ///     impact: 0.9,
    ///     age_decay: 1.0,
    ///     recency_boost: 1.0,
    /// }).unwrap();
    /// assert!((score - 0.81).abs() < 1e-4);
    /// ```
    pub fn score(&self, components: &CiarComponents) -> Result<f32> {
        for value in [components.certainty, components.impact] {
            if value.is_nan() || value.is_infinite() {
                return Err(Error::ValidationError(
                    "CIAR certainty/impact must be finite".into(),
                ));
            }
        }
        for value in [components.age_decay, components.recency_boost] {
            if value.is_nan() || value.is_infinite() {
                return Err(Error::ValidationError(
                    "CIAR age_decay/recency_boost must be finite".into(),
                ));
            }
        }

        let raw = f64::from(components.certainty) * f64::from(components.impact)
            * components.age_decay
            * components.recency_boost;
        Ok(raw.clamp(0.0, 1.0) as f32)
    }

    /// Recompute the full component set for a fact given its extraction
    /// time and access count, then score it. Used by L2's
    /// retrieve/periodic-recompute path (§4.2).
    ///
    /// # Errors
    ///
    /// Propagates [`CiarScorer::score`] errors.
    pub fn rescore(
        &self,
        certainty: f32,
        impact: f32,
        extracted_at: DateTime<Utc>,
        access_count: u64,
    ) -> Result<(CiarComponents, f32)> {
        let age_days = (Utc::now() - extracted_at).num_seconds() as f64 / 86_400.0;
        let components = CiarComponents {
            certainty,
            impact,
            age_decay: self.age_decay(age_days),
            recency_boost: self.recency_boost(access_count),
        };
        let score = self.score(&components)?;
        Ok((components, score))
    }
}
