//! CLI plumbing over [`memory_core::UnifiedMemorySystem`]: argument
//! parsing, backend construction, and the `ingest`/`query`/`health`/
//! `engines status` command bodies.

pub mod commands;
pub mod errors;
pub mod output;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use memory_core::types::MemoryConfig;
use memory_core::UnifiedMemorySystem;

use crate::output::OutputFormat;

/// A small CLI over the four-tier cognitive memory subsystem.
#[derive(Debug, Parser)]
#[command(name = "memory-cli", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format for command results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Enable debug-level logging.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Path to the redb database file backing L1's hot store (ignored
    /// when the `redb` feature is disabled).
    #[arg(long, global = true, default_value = "memory.redb")]
    pub redb_path: std::path::PathBuf,

    /// Turso/libSQL URL (`libsql://...`, `file:...`, or `:memory:`)
    /// backing L1-cold and L2. Falls back to an in-memory double when
    /// unset or the `turso` feature is disabled.
    #[arg(long, global = true)]
    pub turso_url: Option<String>,

    /// Auth token for a remote `libsql://` URL.
    #[arg(long, global = true, default_value = "")]
    pub turso_token: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Append a turn to a session's active context.
    Ingest(commands::ingest::IngestArgs),
    /// Recall context for a session across whichever tiers are requested.
    Query(commands::query::QueryArgs),
    /// Probe every tier's backing store and report circuit breaker state.
    Health(commands::health::HealthArgs),
    /// Lifecycle-engine operations.
    Engines(commands::engines::EnginesArgs),
}

/// Build the [`UnifiedMemorySystem`] this invocation operates on, from
/// the global backend flags.
///
/// # Errors
///
/// Returns an error if the redb database can't be opened or the Turso
/// connection can't be established.
pub async fn build_system(cli: &Cli) -> anyhow::Result<UnifiedMemorySystem> {
    let adapters = backends::build_adapters(cli).await?;
    let llm = Arc::new(test_utils::MockLlmClient::default());
    Ok(UnifiedMemorySystem::new(adapters, llm, MemoryConfig::from_env()))
}

mod backends {
    use std::sync::Arc;

    use memory_core::orchestrator::StorageAdapters;
    use test_utils::{
        InMemoryFullTextStore, InMemoryGraphStore, InMemoryRelationalStore, InMemoryVectorStore,
    };

    use super::Cli;

    /// L3's vector/graph index and L4's full-text index have no
    /// production adapter in this workspace; every invocation uses the
    /// in-memory reference doubles for those three.
    pub async fn build_adapters(cli: &Cli) -> anyhow::Result<StorageAdapters> {
        let hot = hot_store(cli).await?;
        let durable = relational_store(cli).await?;

        Ok(StorageAdapters {
            hot,
            durable,
            vectors: Arc::new(InMemoryVectorStore::new()),
            graph: Arc::new(InMemoryGraphStore::new()),
            fulltext: Arc::new(InMemoryFullTextStore::new()),
        })
    }

    #[cfg(feature = "redb")]
    async fn hot_store(cli: &Cli) -> anyhow::Result<Arc<dyn memory_core::storage::HotStore>> {
        let store = memory_storage_redb::RedbHotStore::new(&cli.redb_path).await?;
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "redb"))]
    async fn hot_store(_cli: &Cli) -> anyhow::Result<Arc<dyn memory_core::storage::HotStore>> {
        Ok(Arc::new(test_utils::InMemoryHotStore::new()))
    }

    #[cfg(feature = "turso")]
    async fn relational_store(
        cli: &Cli,
    ) -> anyhow::Result<Arc<dyn memory_core::storage::RelationalStore>> {
        if let Some(url) = &cli.turso_url {
            let store =
                memory_storage_turso::TursoRelationalStore::connect(url, &cli.turso_token).await?;
            return Ok(Arc::new(store));
        }
        Ok(Arc::new(InMemoryRelationalStore::new()))
    }

    #[cfg(not(feature = "turso"))]
    async fn relational_store(
        _cli: &Cli,
    ) -> anyhow::Result<Arc<dyn memory_core::storage::RelationalStore>> {
        Ok(Arc::new(InMemoryRelationalStore::new()))
    }
}
