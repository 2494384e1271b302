use clap::Parser;

use memory_cli::{build_system, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();
    } else {
        tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
    }

    let system = build_system(&cli).await?;

    match &cli.command {
        Command::Ingest(args) => memory_cli::commands::ingest::run(args, &system, &cli.format).await,
        Command::Query(args) => memory_cli::commands::query::run(args, &system, &cli.format).await,
        Command::Health(args) => memory_cli::commands::health::run(args, &system, &cli.format).await,
        Command::Engines(args) => memory_cli::commands::engines::run(args, &system, &cli.format).await,
    }
}
