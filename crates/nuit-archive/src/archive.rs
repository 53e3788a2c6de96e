//! Multi-night driver: scrape each requested night in turn, then render
//! pages, theme assets and the podcast feed.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use nuit_core::{Assembler, Fetcher, ScrapeEvent, Site, Track};
use serde::Serialize;
use std::io::Write;
use tracing::{error, info};

use crate::render::Renderer;
use crate::{assets, podcast};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub json: bool,
    pub keep_going: bool,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub archived: Vec<NaiveDate>,
    pub failed: Vec<(NaiveDate, String)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Serialize)]
struct NightJson<'a> {
    day: NaiveDate,
    tracks: &'a [Track],
}

pub struct Archiver<'a, F, S, W> {
    assembler: &'a Assembler<F, S>,
    renderer: Renderer,
    options: RunOptions,
    out: W,
}

impl<'a, F: Fetcher, S: Site, W: Write> Archiver<'a, F, S, W> {
    /// `out` receives the JSON playlists when `options.json` is set. Fails
    /// when a theme template does not parse.
    pub fn new(assembler: &'a Assembler<F, S>, options: RunOptions, out: W) -> Result<Self> {
        let renderer = Renderer::new(assembler.config().output.theme_dir.as_deref())?;
        Ok(Self {
            assembler,
            renderer,
            options,
            out,
        })
    }

    pub async fn run<P>(&mut self, days: &[NaiveDate], progress: &mut P) -> Result<RunReport>
    where
        P: FnMut(ScrapeEvent),
    {
        let mut report = RunReport::default();
        for &day in days {
            match self.archive_night(day, progress).await {
                Ok(()) => report.archived.push(day),
                Err(e) if self.options.keep_going => {
                    error!("Night of {} failed: {:#}", day, e);
                    report.failed.push((day, format!("{:#}", e)));
                }
                Err(e) => return Err(e),
            }
        }

        if !self.options.json && !report.archived.is_empty() {
            self.finish()?;
        }
        Ok(report)
    }

    async fn archive_night<P>(&mut self, day: NaiveDate, progress: &mut P) -> Result<()>
    where
        P: FnMut(ScrapeEvent),
    {
        let assembler = self.assembler;
        let config = assembler.config();
        let mut night = assembler
            .collect_night(day, progress)
            .await
            .with_context(|| format!("night of {}", day))?;
        info!(
            "Night of {}: {} tracks in {} fetches",
            day,
            night.tracks.len(),
            night.summary.fetches
        );

        if self.options.json {
            serde_json::to_writer_pretty(
                &mut self.out,
                &NightJson {
                    day,
                    tracks: &night.tracks,
                },
            )?;
            writeln!(self.out)?;
            return Ok(());
        }

        let output_dir = &config.output.output_dir;
        if config.output.download_pictures {
            assembler
                .download_pictures(&mut night.tracks, output_dir, progress)
                .await
                .with_context(|| format!("pictures of the night of {}", day))?;
        }
        self.renderer
            .write_night(output_dir, &config.output.feed_title, &night)?;
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        let output = &self.assembler.config().output;
        assets::copy_assets(output.theme_dir.as_deref(), &output.output_dir)?;
        podcast::write_podcast(&output.output_dir, &output.feed_url, &output.feed_title)?;
        Ok(())
    }
}
