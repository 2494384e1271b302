//! # Test Utilities
//!
//! In-memory doubles for the five storage adapter traits
//! (`memory_core::storage`), shared by every tier/engine/orchestrator
//! test module instead of each reimplementing its own mock.
//!
//! Each double is a plain `Mutex`-guarded `HashMap` — no TTL sweeping,
//! no persistence, no concurrency tuning. Good enough to exercise tier
//! and engine logic; not a model of any real backend's performance
//! characteristics.

mod doubles;
mod llm;

pub use doubles::{
    InMemoryFullTextStore, InMemoryGraphStore, InMemoryHotStore, InMemoryRelationalStore,
    InMemoryVectorStore,
};
pub use llm::{FailingLlm, MockLlmClient};
