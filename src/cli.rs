//! # diff-scraper CLI Interface (Module)
//!
//! Command parsing, argument validation and the async [`run`] entrypoint used by
//! `main` and by integration tests. All pipeline logic lives in
//! [`diff_scraper_core`]; this module only turns flags into a
//! [`HarvestConfig`] and a networked client.
//!
//! Argument problems (bad dates, both or neither of `--group_id`/`--project_id`)
//! are rejected before any request is sent.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser};
use diff_scraper_core::config::{parse_day, DateWindow, HarvestConfig, Target};
use diff_scraper_core::gitlab::GitlabClient;
use diff_scraper_core::harvest::{harvest, HarvestReport};
use diff_scraper_core::transport::DEFAULT_BASE_URL;
use std::path::{Path, PathBuf};
use tracing::Level;

use crate::load_config::{load_config, Settings};
use crate::output::create_output_dir;

/// Collect an author's commits from GitLab projects into patch files.
#[derive(Parser, Debug)]
#[clap(
    name = "diff-scraper",
    version,
    about = "Collect one author's commits and diffs from a GitLab group tree (or a single project) into .patch files"
)]
#[clap(group(
    ArgGroup::new("target")
        .required(true)
        .args(["group_id", "project_id"])
))]
pub struct Cli {
    /// Root group id; all nested subgroups are searched
    #[clap(long = "group_id")]
    pub group_id: Option<String>,

    /// Single project id
    #[clap(long = "project_id")]
    pub project_id: Option<String>,

    /// Access token with api, read_api and read_repository scopes
    #[clap(long = "private_token", env = "GITLAB_PRIVATE_TOKEN", hide_env_values = true)]
    pub private_token: String,

    /// Only commits whose author email matches exactly are collected
    #[clap(long = "author_email")]
    pub author_email: String,

    /// First day of the window, YYYY-MM-DD (inclusive)
    #[clap(long, value_parser = parse_date)]
    pub since: NaiveDate,

    /// Last day of the window, YYYY-MM-DD (inclusive)
    #[clap(long, value_parser = parse_date)]
    pub until: NaiveDate,

    /// GitLab API root, e.g. https://gitlab.example.com/api/v4
    #[clap(long = "base_url")]
    pub base_url: Option<String>,

    /// Optional YAML file with concurrency, retry and timeout settings
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Log progress at info level instead of errors only
    #[clap(short, long)]
    pub verbose: bool,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    parse_day(value).map_err(|e| e.to_string())
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub report: HarvestReport,
}

/// Installs the stderr fmt subscriber: info with `--verbose`, errors only otherwise.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::INFO } else { Level::ERROR };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<RunSummary> {
    run_in(cli, Path::new(".")).await
}

/// Same as [`run`], creating the output directory under `parent`.
pub async fn run_in(cli: Cli, parent: &Path) -> Result<RunSummary> {
    tracing::info!("trace_initialised");

    let settings = match &cli.config {
        Some(path) => load_config(path)?,
        None => Settings::default(),
    };
    let window = DateWindow::new(cli.since, cli.until)?;
    let target = match (cli.group_id, cli.project_id) {
        (Some(group_id), None) => Target::Group(group_id),
        (None, Some(project_id)) => Target::Project(project_id),
        _ => bail!("exactly one of --group_id or --project_id is required"),
    };
    let base_url = cli
        .base_url
        .or_else(|| settings.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let client = GitlabClient::new(settings.transport_config(base_url, cli.private_token))
        .context("Failed to construct GitLab client")?;
    let output_dir = create_output_dir(parent, &Local::now())?;

    let config = HarvestConfig {
        target,
        author_email: cli.author_email,
        window,
        output_dir: output_dir.clone(),
        concurrency: settings.concurrency,
    };

    tracing::info!(command = "harvest", output_dir = %output_dir.display(), "Starting harvest");
    let report = harvest(&config, &client).await;
    for failed in &report.failed {
        tracing::error!(project_id = %failed.project_id, name = %failed.project_name, reason = %failed.reason, "Project failed");
    }
    tracing::info!(command = "harvest", ?report, "Harvest complete");

    Ok(RunSummary { output_dir, report })
}
