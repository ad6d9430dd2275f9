use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use prfeed_core::{Config, GitHubClient, RenderMode};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Writes RSS feeds of recently merged pull requests plus an HTML index.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.yaml", value_hint = clap::ValueHint::FilePath)]
    config: PathBuf,

    /// Output directory, created if missing
    #[arg(short, long, default_value = "docs", value_hint = clap::ValueHint::DirPath)]
    output: PathBuf,

    /// One feed per repository, or a single combined feed
    #[arg(long, value_enum, default_value_t = Mode::PerRepository)]
    mode: Mode,

    /// API token, sent as a bearer credential when set
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    PerRepository,
    Combined,
}

impl From<Mode> for RenderMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::PerRepository => RenderMode::PerRepository,
            Mode::Combined => RenderMode::Combined,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    let client = GitHubClient::from_config(&config.github, cli.token)
        .context("failed to build HTTP client")?;

    let report = prfeed_core::run(&config, &client, &cli.output, cli.mode.into(), Utc::now())
        .await
        .context("feed generation aborted")?;

    info!(
        feeds = report.summaries.len(),
        skipped = report.failed.len(),
        index = %report.index_path.display(),
        "all feeds generated"
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
