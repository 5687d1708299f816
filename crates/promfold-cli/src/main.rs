//! promfold — fold worker metric snapshots into one cumulative state file.
//!
//! # Usage
//!
//! ```text
//! promfold ingest --state /var/lib/promfold/state.json --spool /var/spool/promfold
//! promfold run --config /etc/promfold.toml --interval 15
//! promfold show --state /var/lib/promfold/state.json --format json
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

mod commands;
mod config;

use commands::show::ShowFormat;
use config::{Config, Overrides, Settings};

#[derive(Parser)]
#[command(
    name = "promfold",
    about = "Fold worker metric snapshots into one cumulative state file",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge every snapshot in the spool directory once and save the state.
    Ingest {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Merge the spool directory periodically until interrupted.
    Run {
        #[command(flatten)]
        store: StoreArgs,
        /// Seconds between ingestion cycles.
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Print the persisted state.
    Show {
        /// Path to promfold.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// State file to read (overrides state_file from the config).
        #[arg(long)]
        state: Option<PathBuf>,
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = ShowFormat::Summary)]
        format: ShowFormat,
    },
}

#[derive(Args)]
struct StoreArgs {
    /// Path to promfold.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// State file (overrides state_file from the config).
    #[arg(long)]
    state: Option<PathBuf>,
    /// Directory workers write snapshots into (overrides spool_dir).
    #[arg(long)]
    spool: Option<PathBuf>,
    /// Leave snapshot files in place after merging them.
    #[arg(long)]
    keep: bool,
}

impl StoreArgs {
    fn settings(self, interval_secs: Option<u64>) -> anyhow::Result<Settings> {
        let config = Config::load(self.config.as_deref())?;
        config.resolve(&Overrides {
            state_file: self.state,
            spool_dir: self.spool,
            keep: self.keep,
            interval_secs,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("promfold=info".parse()?),
        )
        .with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    match cli.command {
        Commands::Ingest { store } => commands::ingest::ingest(&store.settings(None)?),
        Commands::Run { store, interval } => {
            let settings = store.settings(interval)?;
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
                .block_on(commands::run::run(settings))
        }
        Commands::Show {
            config,
            state,
            format,
        } => commands::show::show(config.as_deref(), state.as_deref(), format),
    }
}
