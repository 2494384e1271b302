//! Data model for the four-tier memory subsystem (§3).
//!
//! Each record type enforces its own structural invariants via a
//! `validate()` method; cross-tier storage policy (e.g. the CIAR
//! threshold check on L2) lives in the owning tier, not here.

pub mod config;
pub mod episode;
pub mod fact;
pub mod knowledge;
pub mod segment;
pub mod turn;

pub use config::{
    CiarConfig, CircuitBreakerSettings, EngineConfig, L1Config, L2Config, L3Config, L4Config,
    MemoryConfig, RetrySettings,
};
pub use episode::{Episode, Relationship};
pub use fact::{AccessStats, CiarComponents, Fact, FactType};
pub use knowledge::{KnowledgeDocument, ProvenanceLink};
pub use segment::TopicSegment;
pub use turn::{Role, Turn};
