//! The four memory tiers (§3, §4.1-§4.4): L1 `ActiveContextTier`, L2
//! `WorkingMemoryTier`, L3 `EpisodicMemoryTier`, L4 `SemanticMemoryTier`.
//!
//! Each tier exclusively owns its record type. Engines read from the
//! tier below and write to the tier above; they never mutate another
//! tier's source of truth directly.

mod l1_active_context;
mod l2_working_memory;
mod l3_episodic;
mod l4_semantic;

pub use l1_active_context::ActiveContextTier;
pub use l2_working_memory::{FactQuery, WorkingMemoryTier};
pub use l3_episodic::{EpisodeQuery, EpisodicMemoryTier};
pub use l4_semantic::SemanticMemoryTier;
