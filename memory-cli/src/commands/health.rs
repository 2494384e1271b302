//! `memory-cli health`: probe every tier's backing store and report
//! circuit breaker state.

use clap::Args;
use memory_core::orchestrator::TierHealth;
use memory_core::storage::circuit_breaker::CircuitState;
use memory_core::UnifiedMemorySystem;
use serde::Serialize;

use crate::output::{Output, OutputFormat};

#[derive(Debug, Args)]
pub struct HealthArgs {}

#[derive(Debug, Serialize)]
struct HealthReportView {
    healthy: bool,
    l1: String,
    l2: String,
    l3_vector: String,
    l3_graph: String,
    l4: String,
    llm_circuit: String,
}

fn describe(health: &TierHealth) -> String {
    match health {
        TierHealth::Healthy => "healthy".to_string(),
        TierHealth::Degraded(reason) => format!("degraded: {reason}"),
    }
}

fn describe_circuit(state: &CircuitState) -> String {
    match state {
        CircuitState::Closed => "closed".to_string(),
        CircuitState::Open => "open".to_string(),
        CircuitState::HalfOpen => "half-open".to_string(),
    }
}

impl Output for HealthReportView {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "overall: {}", if self.healthy { "healthy" } else { "degraded" })?;
        writeln!(writer, "l1: {}", self.l1)?;
        writeln!(writer, "l2: {}", self.l2)?;
        writeln!(writer, "l3 (vector): {}", self.l3_vector)?;
        writeln!(writer, "l3 (graph): {}", self.l3_graph)?;
        writeln!(writer, "l4: {}", self.l4)?;
        writeln!(writer, "llm circuit: {}", self.llm_circuit)?;
        Ok(())
    }
}

pub async fn run(
    _args: &HealthArgs,
    system: &UnifiedMemorySystem,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let report = system.health_check().await;
    let view = HealthReportView {
        healthy: report.is_healthy(),
        l1: describe(&report.l1),
        l2: describe(&report.l2),
        l3_vector: describe(&report.l3_vector),
        l3_graph: describe(&report.l3_graph),
        l4: describe(&report.l4),
        llm_circuit: describe_circuit(&report.llm_circuit),
    };
    format.print_output(&view)?;

    if !view.healthy {
        std::process::exit(1);
    }
    Ok(())
}
