#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::unused_self)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::assigning_clones)]
#![allow(clippy::borrowed_box)]
#![allow(clippy::float_cmp)]
#![allow(clippy::ref_option)]

//! # Memory Core
//!
//! Core engine for a four-tier cognitive memory subsystem: a short-lived
//! active-context buffer, a CIAR-scored working memory, a dual-indexed
//! episodic store, and a distilled semantic knowledge base.
//!
//! ## Module Organization
//!
//! - [`types`]: the data model (turns, facts, episodes, knowledge
//!   documents) and their structural invariants.
//! - [`ciar`]: the certainty/impact/age-decay/recency-boost significance
//!   score that governs L2 retention and L1→L2 promotion.
//! - [`storage`]: per-tier storage adapter traits and the shared
//!   [`storage::circuit_breaker::CircuitBreaker`].
//! - [`llm`]: the [`llm::LlmClient`] contract the lifecycle engines use
//!   for segmentation, extraction, and distillation.
//! - [`segmentation`] / [`fact_extraction`]: the LLM-driven pipeline
//!   stages (with rule-based fallbacks) that turn raw turns into scored
//!   facts.
//! - [`tiers`]: the four tier implementations (`ActiveContextTier`,
//!   `WorkingMemoryTier`, `EpisodicMemoryTier`, `SemanticMemoryTier`).
//! - [`engines`]: the three lifecycle engines that move data between
//!   tiers (`PromotionEngine`, `ConsolidationEngine`, `DistillationEngine`).
//! - [`orchestrator`]: [`orchestrator::UnifiedMemorySystem`], the
//!   composition root wiring tiers, engines, and shared dependencies
//!   together.
//! - [`retry`]: backend-agnostic retry policy with exponential backoff.
//! - [`telemetry`]: lightweight counters/histograms/gauges.
//! - [`constants`]: default configuration values.
//!
//! ## Quick Start
//!
//! ```no_run
//! use memory_core::tiers::ActiveContextTier;
//! use memory_core::types::{Role, Turn, L1Config};
//! use std::sync::Arc;
//! # use memory_core::storage::{HotStore, RelationalStore};
//! # fn build() -> (Arc<dyn HotStore>, Arc<dyn RelationalStore>) { unimplemented!() }
//!
//! # #[tokio::main]
//! # async fn main() -> memory_core::Result<()> {
//! let (hot, durable) = build();
//! let l1 = ActiveContextTier::new(hot, durable, L1Config::default());
//!
//! l1.store(&Turn::new("session-1".into(), 0, Role::User, "hello".into())).await?;
//! let window = l1.retrieve("session-1").await?;
//! println!("{} turns in context", window.len());
//! # Ok(())
//! # }
//! ```

pub mod ciar;
pub mod constants;
pub mod engines;
pub mod error;
pub mod fact_extraction;
pub mod llm;
pub mod orchestrator;
pub mod retry;
pub mod segmentation;
pub mod storage;
pub mod telemetry;
pub mod tiers;
pub mod types;

pub use error::{Error, Result};
pub use orchestrator::UnifiedMemorySystem;
