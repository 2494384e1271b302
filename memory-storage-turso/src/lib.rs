//! # Memory Storage - Turso
//!
//! Turso/libSQL [`RelationalStore`](memory_core::storage::RelationalStore)
//! adapter: the durable write-through target for L1 turns and the system
//! of record for L2 facts.
//!
//! ## Example
//!
//! ```no_run
//! use memory_storage_turso::TursoRelationalStore;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = TursoRelationalStore::connect("libsql://localhost:8080", "token").await?;
//! # Ok(())
//! # }
//! ```

mod relational_store;

pub use relational_store::TursoRelationalStore;
