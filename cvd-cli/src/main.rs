//! cvd-cli - Command line tool for COVID-19 regional series and charts.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "cvd-cli",
    version,
    about = "COVID-19 regional data and chart toolkit"
)]
struct Cli {
    #[command(flatten)]
    source: cvd_cmd::SourceArgs,

    #[command(subcommand)]
    command: cvd_cmd::Command,
}

// Fetches share non-Send state, so everything runs on one thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    cvd_cmd::run(cli.command, cli.source).await
}
