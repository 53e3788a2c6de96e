use anyhow::bail;
use chrono::NaiveDate;
use clap::Parser;
use nuit_core::Config;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "nuit-archive")]
#[command(version)]
#[command(about = "Generate archive pages of a radio station's overnight playlist")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path where to output the generated files
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Delay in minutes between the recording and the station website
    #[arg(long, allow_negative_numbers = true)]
    pub delay: Option<i64>,

    /// Night to archive (YYYY-MM-DD). Defaults to today
    #[arg(long, value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,

    /// Archive every night from start-date to this date (YYYY-MM-DD), inclusive
    #[arg(long, value_parser = parse_date)]
    pub end_date: Option<NaiveDate>,

    /// URL the generated files are served from, used in the podcast feed
    #[arg(long)]
    pub url: Option<String>,

    /// Keep archiving the remaining nights when one fails
    #[arg(long)]
    pub keep_going: bool,

    /// Keep remote picture URLs instead of downloading them
    #[arg(long)]
    pub no_pictures: bool,

    /// Print each night's playlist as JSON instead of writing pages
    #[arg(long)]
    pub json: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("Not a valid date: '{}'.", s))
}

impl Cli {
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        self.apply(&mut config)?;
        Ok(config)
    }

    /// Command-line flags take precedence over the config file. The merged
    /// settings are validated again.
    pub fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(output) = &self.output {
            config.output.output_dir = output.clone();
        }
        if let Some(delay) = self.delay {
            config.scrape.delay_minutes = delay;
        }
        if let Some(url) = &self.url {
            config.output.feed_url = url.clone();
        }
        if self.no_pictures {
            config.output.download_pictures = false;
        }
        config.scrape.validate()
    }

    /// Nights to archive, oldest first.
    pub fn days(&self, today: NaiveDate) -> anyhow::Result<Vec<NaiveDate>> {
        let start = self.start_date.unwrap_or(today);
        let Some(end) = self.end_date else {
            return Ok(vec![start]);
        };
        if end < start {
            bail!("end date {} is before start date {}", end, start);
        }
        Ok(start.iter_days().take_while(|d| *d <= end).collect())
    }
}
