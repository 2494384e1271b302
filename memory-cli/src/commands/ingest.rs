//! `memory-cli ingest`: append a turn to a session's active context.

use clap::Args;
use memory_core::types::{Role, Turn};
use memory_core::UnifiedMemorySystem;
use serde::Serialize;

use crate::errors::{helpers, EnhancedError};
use crate::output::{Output, OutputFormat};

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Session to append the turn to.
    #[arg(long)]
    pub session: String,

    /// Monotone turn id, unique within the session.
    #[arg(long)]
    pub turn_id: u64,

    /// Who produced the turn.
    #[arg(long, value_enum)]
    pub role: RoleArg,

    /// Message text.
    #[arg(long)]
    pub content: String,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum RoleArg {
    User,
    Assistant,
    System,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::User => Role::User,
            RoleArg::Assistant => Role::Assistant,
            RoleArg::System => Role::System,
        }
    }
}

#[derive(Debug, Serialize)]
struct IngestReport {
    session_id: String,
    turn_id: u64,
}

impl Output for IngestReport {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "ingested turn {} into session {}", self.turn_id, self.session_id)?;
        Ok(())
    }
}

pub async fn run(
    args: &IngestArgs,
    system: &UnifiedMemorySystem,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let turn = Turn::new(args.session.clone(), args.turn_id, args.role.into(), args.content.clone());
    system
        .ingest_turn(turn)
        .await
        .context_with_help("Failed to ingest turn", helpers::STORAGE_CONNECTION_HELP)?;

    format.print_output(&IngestReport {
        session_id: args.session.clone(),
        turn_id: args.turn_id,
    })?;
    Ok(())
}
