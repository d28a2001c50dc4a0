//! `price-verdict` command line entry point
//!
//! Runs the verdict pipeline for every requested site over a fixture
//! directory and prints the reports, plus a cross-site price comparison, as
//! JSON on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use price_verdict_lib::application::{PipelineReport, PriceComparison, VerdictPipeline};
use price_verdict_lib::infrastructure::logging::{init_logging_with_config, log_system_info};
use price_verdict_lib::infrastructure::{AppConfig, ConfigManager, FixturePageSource};

const HELP: &str = "\
Usage: price-verdict --fixtures <DIR> [--site <NAME>]... [--config <FILE>] <QUERY>...

Options:
  -f, --fixtures <DIR>   Directory with manifest.json and HTML pages
  -s, --site <NAME>      Site profile to run (repeatable, default: all configured)
  -c, --config <FILE>    Configuration file (default: user config, if present)
  -h, --help             Print this help";

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    fixtures: Option<PathBuf>,
    sites: Vec<String>,
    config: Option<PathBuf>,
    query: Vec<String>,
    help: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-f" | "--fixtures" => {
                parsed.fixtures = Some(PathBuf::from(
                    args.next().ok_or_else(|| anyhow!("Missing value for --fixtures"))?,
                ));
            }
            "-s" | "--site" => {
                let site = args.next().ok_or_else(|| anyhow!("Missing value for --site"))?;
                parsed.sites.push(site.to_ascii_lowercase());
            }
            "-c" | "--config" => {
                parsed.config = Some(PathBuf::from(
                    args.next().ok_or_else(|| anyhow!("Missing value for --config"))?,
                ));
            }
            "-h" | "--help" => parsed.help = true,
            other if other.starts_with('-') => bail!("Unknown arg: {}", other),
            _ => parsed.query.push(arg),
        }
    }

    Ok(parsed)
}

/// An explicit `--config` wins; otherwise the user config, written with
/// defaults on first run. Without a config directory only defaults apply.
async fn load_config(explicit: Option<&PathBuf>, manager: Option<ConfigManager>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return AppConfig::load(Some(path.as_path()))
            .with_context(|| format!("Failed to load configuration from {:?}", path));
    }

    match manager {
        Some(manager) => manager.initialize_on_first_run().await,
        None => AppConfig::load(None).context("Failed to load default configuration"),
    }
}

#[derive(Debug, Serialize)]
struct VerdictOutput {
    query: String,
    runs: Vec<PipelineReport>,
    comparison: Option<PriceComparison>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        eprintln!("{HELP}");
        return Ok(());
    }
    let fixtures = args
        .fixtures
        .clone()
        .ok_or_else(|| anyhow!("--fixtures is required\n\n{HELP}"))?;
    let query = args.query.join(" ");
    if query.trim().is_empty() {
        bail!("A search query is required\n\n{HELP}");
    }

    let config = load_config(args.config.as_ref(), ConfigManager::new().ok()).await?;
    init_logging_with_config(&config.logging)?;
    log_system_info();

    let site_names: Vec<String> = if args.sites.is_empty() {
        config.sites.keys().cloned().collect()
    } else {
        args.sites.clone()
    };

    let source = Arc::new(FixturePageSource::open(&fixtures).await?);
    let cancel = CancellationToken::new();

    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling runs");
            ctrl_c_cancel.cancel();
        }
    });

    let mut runs = JoinSet::new();
    for (index, name) in site_names.iter().enumerate() {
        let profile = config
            .site(name)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown site '{}'", name))?;
        let pipeline = VerdictPipeline::new(Arc::clone(&source), profile, &config)
            .with_context(|| format!("Invalid selectors for site '{}'", name))?;
        let query = query.clone();
        let cancel = cancel.clone();
        runs.spawn(async move { (index, pipeline.run(&query, &cancel).await) });
    }

    let mut reports = Vec::with_capacity(site_names.len());
    while let Some(joined) = runs.join_next().await {
        match joined {
            Ok(report) => reports.push(report),
            Err(e) => error!("Pipeline task failed: {}", e),
        }
    }
    reports.sort_by_key(|(index, _)| *index);
    let reports: Vec<PipelineReport> = reports.into_iter().map(|(_, report)| report).collect();

    let comparison = PriceComparison::from_listings(
        reports
            .iter()
            .map(|report| (report.site.as_str(), report.records())),
    );

    info!("✅ Finished {} runs for '{}'", reports.len(), query);

    let output = VerdictOutput {
        query,
        runs: reports,
        comparison,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to serialize output")?
    );

    Ok(())
}
