use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use etcd_backup::commands;
use etcd_backup::config::{Config, Overrides};
use etcd_backup::progress::{BarProgress, LogProgress, Progress};
use etcd_backup::ui;

#[derive(Parser)]
#[command(name = "etcd-backup")]
#[command(version, about = "Dump an etcd keyspace to JSON and restore it")]
struct Cli {
    /// Backup configuration file (JSON, or TOML with a .toml extension)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum number of keys written concurrently during a restore
    #[arg(long, global = true)]
    concurrent_requests: Option<usize>,

    /// Retries per key before a restore gives up
    #[arg(long, global = true)]
    retries: Option<u32>,

    /// etcd client configuration file
    #[arg(long, global = true)]
    etcd_config: Option<PathBuf>,

    /// Snapshot file to write or read
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Disable the progress bar
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dump the configured keys to a snapshot file
    Dump {
        /// Key to back up (repeatable, replaces the configured keys)
        #[arg(short, long = "key")]
        keys: Vec<String>,

        /// Back up whole subtrees
        #[arg(long)]
        recursive: Option<bool>,

        /// Ask the cluster for sorted children
        #[arg(long)]
        sorted: Option<bool>,
    },
    /// Restore a snapshot file into the cluster
    Restore,
    /// Print the resolved configuration
    Config,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            concurrent_requests: self.concurrent_requests,
            retries: self.retries,
            etcd_config_path: self.etcd_config.clone(),
            dump_file_path: self.file.clone(),
            ..Overrides::default()
        };
        if let Command::Dump {
            keys,
            recursive,
            sorted,
        } = &self.command
        {
            overrides.keys = (!keys.is_empty()).then(|| keys.clone());
            overrides.recursive = *recursive;
            overrides.sorted = *sorted;
        }
        overrides
    }

    fn progress(&self) -> Arc<dyn Progress> {
        if !self.no_progress && std::io::stderr().is_terminal() {
            Arc::new(BarProgress::new())
        } else {
            Arc::new(LogProgress)
        }
    }
}

fn init_logging(format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref(), &cli.overrides())?;
    let validation = config.validate()?;

    if let Command::Config = cli.command {
        return commands::config_cmd::execute(&config, &validation);
    }

    for warning in &validation.warnings {
        warn!("{warning}");
    }
    info!(
        config = %commands::config_cmd::summary(&config)?,
        "Current configuration"
    );

    let progress = cli.progress();
    match cli.command {
        Command::Dump { .. } => commands::dump::execute(&config, progress.as_ref()).await,
        Command::Restore => commands::restore::execute(&config, progress).await,
        Command::Config => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    if let Err(e) = run(cli).await {
        ui::print_error_box("etcd-backup failed", Some(&format!("{e:#}")));
        std::process::exit(1);
    }
}
