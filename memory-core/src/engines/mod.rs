//! Lifecycle engines (§4.8-§4.10) that move data between tiers:
//! [`PromotionEngine`] (L1→L2), [`ConsolidationEngine`] (L2→L3),
//! [`DistillationEngine`] (L3→L4).
//!
//! Each engine is driven by an internal work queue rather than a fixed
//! full-table scan: callers (typically [`crate::orchestrator::UnifiedMemorySystem`])
//! notify an engine when its input tier changed, and a background task
//! drains the queue one item at a time, sleeping the configured cycle
//! interval whenever the queue runs dry. This mirrors the queue/worker
//! shape used elsewhere in this crate for background batch processing:
//! a `shutdown` flag polled once per iteration lets `stop` end the loop
//! gracefully without an explicit cancellation channel.

mod consolidation;
mod distillation;
mod promotion;

pub use consolidation::{ConsolidationEngine, ConsolidationReport};
pub use distillation::{DistillationEngine, DistillationReport};
pub use promotion::{PromotionEngine, PromotionReport};
