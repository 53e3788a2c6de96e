mod archive;
mod assets;
mod cli;
mod podcast;
mod progress;
mod render;

use anyhow::{bail, Context};
use clap::Parser;
use nuit_core::{AnySite, Assembler, HttpFetcher};
use std::io::IsTerminal;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::archive::{Archiver, RunOptions};
use crate::cli::Cli;

const DEFAULT_FILTER: &str = "info,hyper=warn,hyper_util=warn,reqwest=warn";

fn init_logging(verbose: u8) {
    let default_filter = if verbose > 0 {
        DEFAULT_FILTER.replacen("info", "debug", 1)
    } else {
        DEFAULT_FILTER.to_string()
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.load_config().context("Failed to load config")?;
    match &cli.config {
        Some(path) => info!("Config loaded from: {:?}", path),
        None => info!("Config loaded from: {:?}", nuit_core::Config::config_path()),
    }

    let days = cli.days(chrono::Local::now().date_naive())?;

    let fetcher = HttpFetcher::new(
        &config.site.user_agent,
        config.site.timeout_secs.map(Duration::from_secs),
    )?;
    let site = AnySite::new(config.site.variant, &config.site.url)?;
    let assembler = Assembler::new(fetcher, site, config);

    let options = RunOptions {
        json: cli.json,
        keep_going: cli.keep_going,
    };
    let mut archiver = Archiver::new(&assembler, options, std::io::stdout().lock())?;
    let result = archiver.run(&days, &mut progress::console).await;
    progress::end_line();

    let report = result?;
    if !report.is_success() {
        for (day, reason) in &report.failed {
            eprintln!("{}: {}", day, reason);
        }
        bail!(
            "{} of {} nights failed",
            report.failed.len(),
            report.failed.len() + report.archived.len()
        );
    }
    info!("Archived {} nights", report.archived.len());
    Ok(())
}
