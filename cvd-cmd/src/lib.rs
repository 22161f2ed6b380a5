//! Command implementations for the COVID-19 dashboard CLI.
//!
//! Every command opens a [`Session`](session::Session) (data source, metadata,
//! loader), then fetches, normalizes and aligns the requested regions before
//! printing the result.

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use std::path::PathBuf;

pub mod chart;
pub mod metadata;
pub mod normalize;
pub mod session;

/// Where data comes from and how it is cached.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Root URL of the published data files
    #[arg(long, global = true, default_value = cvd_fetch::http::DEFAULT_DATA_URL)]
    pub data_url: String,

    /// Full URL of the metadata document (defaults to data/metadata.json under --data-url)
    #[arg(long, global = true)]
    pub metadata_url: Option<String>,

    /// Read files from a local checkout of the data repository instead of HTTP
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory of the persisted cache (defaults to the platform cache directory)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Minutes a cached file stays fresh
    #[arg(long, global = true, default_value_t = cvd_store::DEFAULT_TTL_MINUTES)]
    pub cache_ttl_minutes: i64,

    /// Do not read or write the persisted cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// JSON file of per-country column/date-format overrides
    #[arg(long, global = true)]
    pub region_config: Option<PathBuf>,

    /// Reference date for calendar windows, YYYY-MM-DD (defaults to today)
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print resolved region metadata as JSON (every key when none is given)
    Metadata {
        /// Region keys, e.g. `Brazil` or `Brazil.regions.RS`
        keys: Vec<String>,
    },

    /// Fetch regions and write their normalized daily series as CSV
    Normalize {
        /// Region keys
        #[arg(required = true)]
        keys: Vec<String>,

        /// Output CSV path (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Build the chart described by an options document and print it as JSON
    Chart {
        /// Chart options JSON file
        #[arg(long)]
        options: PathBuf,

        /// Extra region keys added to the options' selection
        keys: Vec<String>,

        /// Output JSON path (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Project the selected regions into the plane and print points and stress
    Project {
        /// Chart options JSON file
        #[arg(long)]
        options: PathBuf,

        /// Extra region keys added to the options' selection
        keys: Vec<String>,
    },
}

pub async fn run(command: Command, source: SourceArgs) -> anyhow::Result<()> {
    let session = session::Session::open(&source).await?;
    match command {
        Command::Metadata { keys } => metadata::run_metadata(&session, &keys, &mut std::io::stdout()),
        Command::Normalize { keys, output } => {
            normalize::run_normalize(&session, &keys, output.as_deref()).await
        }
        Command::Chart {
            options,
            keys,
            output,
        } => chart::run_chart(&session, &options, &keys, output.as_deref()).await,
        Command::Project { options, keys } => {
            chart::run_project(&session, &options, &keys, &mut std::io::stdout()).await
        }
    }
}
