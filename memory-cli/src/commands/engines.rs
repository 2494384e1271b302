//! `memory-cli engines status`: report lifecycle-engine cycle counters
//! from the shared telemetry handle.

use clap::{Args, Subcommand};
use memory_core::UnifiedMemorySystem;
use serde::Serialize;

use crate::output::{Output, OutputFormat};

#[derive(Debug, Args)]
pub struct EnginesArgs {
    #[command(subcommand)]
    pub command: EnginesCommand,
}

#[derive(Debug, Subcommand)]
pub enum EnginesCommand {
    /// Print cycle/promoted/consolidated/distilled counters for the
    /// three lifecycle engines.
    Status,
}

#[derive(Debug, Serialize)]
struct EngineStatus {
    promotion_cycles: u64,
    facts_promoted: u64,
    consolidation_cycles: u64,
    episodes_created: u64,
    distillation_cycles: u64,
    documents_distilled: u64,
}

impl Output for EngineStatus {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(
            writer,
            "promotion:     {} cycles, {} facts promoted",
            self.promotion_cycles, self.facts_promoted
        )?;
        writeln!(
            writer,
            "consolidation: {} cycles, {} episodes created",
            self.consolidation_cycles, self.episodes_created
        )?;
        writeln!(
            writer,
            "distillation:  {} cycles, {} documents distilled",
            self.distillation_cycles, self.documents_distilled
        )?;
        Ok(())
    }
}

pub async fn run(
    args: &EnginesArgs,
    system: &UnifiedMemorySystem,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match args.command {
        EnginesCommand::Status => status(system, format).await,
    }
}

async fn status(system: &UnifiedMemorySystem, format: &OutputFormat) -> anyhow::Result<()> {
    let summary = system.telemetry().get_summary().await;
    let counter = |name: &str| summary.counters.get(name).copied().unwrap_or(0);

    format.print_output(&EngineStatus {
        promotion_cycles: counter("promotion_cycles_total"),
        facts_promoted: counter("promotion_facts_promoted_total"),
        consolidation_cycles: counter("consolidation_cycles_total"),
        episodes_created: counter("consolidation_episodes_created_total"),
        distillation_cycles: counter("distillation_cycles_total"),
        documents_distilled: counter("distillation_documents_total"),
    })?;
    Ok(())
}
