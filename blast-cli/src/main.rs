//! Blast analytics CLI - drill into blast records and build chart-ready series.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "blast-cli",
    version,
    about = "Mining blast analytics toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: blast_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    blast_cmd::run(cli.command).await
}
