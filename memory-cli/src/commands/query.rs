//! `memory-cli query`: recall context for a session across whichever
//! tiers the caller asks for.

use clap::Args;
use memory_core::orchestrator::RecallRequest;
use memory_core::types::{Episode, Fact, KnowledgeDocument, Turn};
use memory_core::UnifiedMemorySystem;
use serde::Serialize;

use crate::output::{Output, OutputFormat};

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Session to recall context for.
    #[arg(long)]
    pub session: String,

    /// Cap on L1 turns returned; omit for the full window.
    #[arg(long)]
    pub turn_limit: Option<usize>,

    /// Cap on L2 facts returned.
    #[arg(long)]
    pub fact_limit: Option<usize>,

    /// JSON-encoded embedding (`[0.1, 0.2, ...]`) to k-NN search L3
    /// episodes with; omit to skip L3.
    #[arg(long)]
    pub embedding: Option<String>,

    /// Neighbors to return from the L3 search.
    #[arg(long, default_value_t = 5)]
    pub episode_topk: usize,

    /// Free-text query to search L4 knowledge documents with; omit to
    /// skip L4.
    #[arg(long)]
    pub text: Option<String>,

    /// Cap on L4 documents returned.
    #[arg(long, default_value_t = 5)]
    pub knowledge_limit: usize,
}

#[derive(Debug, Serialize)]
struct RecallReport {
    turns: Vec<Turn>,
    facts: Vec<Fact>,
    episodes: Vec<Episode>,
    knowledge: Vec<KnowledgeDocument>,
}

impl Output for RecallReport {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "turns: {}", self.turns.len())?;
        for turn in &self.turns {
            writeln!(writer, "  [{}] {:?}: {}", turn.turn_id, turn.role, turn.content)?;
        }
        writeln!(writer, "facts: {}", self.facts.len())?;
        for fact in &self.facts {
            writeln!(writer, "  ({:.2}) {}", fact.ciar_score, fact.content)?;
        }
        writeln!(writer, "episodes: {}", self.episodes.len())?;
        writeln!(writer, "knowledge: {}", self.knowledge.len())?;
        Ok(())
    }
}

pub async fn run(
    args: &QueryArgs,
    system: &UnifiedMemorySystem,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let query_embedding = args
        .embedding
        .as_deref()
        .map(serde_json::from_str::<Vec<f32>>)
        .transpose()?;

    let request = RecallRequest {
        session_id: args.session.clone(),
        turn_limit: args.turn_limit,
        fact_limit: args.fact_limit,
        query_embedding,
        episode_topk: args.episode_topk,
        query_text: args.text.clone(),
        knowledge_limit: args.knowledge_limit,
    };

    let result = system.recall(&request).await;
    format.print_output(&RecallReport {
        turns: result.turns,
        facts: result.facts,
        episodes: result.episodes,
        knowledge: result.knowledge,
    })?;
    Ok(())
}
