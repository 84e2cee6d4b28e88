//! # Botmill — schedule manager daemon
//!
//! Reads the job list from the config file and runs one scheduling worker
//! per job until killed. The bots themselves are external scripts; this
//! process only decides *when* they run.
//!
//! Usage:
//!   botmill                              # ~/.botmill/config.toml
//!   botmill --config ./botmill.toml      # explicit config
//!   botmill --jobs-dir ./bots -v         # override job dir, debug logs

use anyhow::{Context, Result};
use botmill_core::config::BotmillConfig;
use botmill_scheduler::Manager;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "botmill", version, about = "Botmill schedule manager")]
struct Cli {
    /// Config file path (default: ~/.botmill/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the directory job paths resolve against
    #[arg(long)]
    jobs_dir: Option<String>,

    /// Override the interpreter jobs are run with
    #[arg(long)]
    interpreter: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "botmill=debug,botmill_scheduler=debug,botmill_core=debug"
    } else {
        "botmill=info,botmill_scheduler=info,botmill_core=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            let path = expand_path(path);
            BotmillConfig::load_from(&path)
                .with_context(|| format!("loading config from {}", path.display()))?
        }
        None => BotmillConfig::load().context("loading default config")?,
    };

    if let Some(dir) = cli.jobs_dir {
        config.scheduler.jobs_dir = shellexpand::tilde(&dir).to_string();
    }
    if let Some(interpreter) = cli.interpreter {
        config.scheduler.interpreter = interpreter;
    }

    if config.jobs.is_empty() {
        tracing::warn!("no jobs configured; the manager will idle");
    }

    // Runs until the process is killed.
    Manager::new(&config).run().await;
    Ok(())
}
