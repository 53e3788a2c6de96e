//! One night's playlist: scrape the window, keep what aired strictly inside
//! it, optionally store cover art next to the rendered pages.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::{Config, ScrapeConfig};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::playlist::{PlaylistScraper, ScrapeEvent, ScrapeSummary};
use crate::site::Site;
use crate::time::Timestamp;
use crate::track::Track;

pub const PICTURES_DIR: &str = "pictures";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightWindow {
    pub day: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl NightWindow {
    pub fn for_day(day: NaiveDate, config: &ScrapeConfig) -> Self {
        let midnight = day.and_time(NaiveTime::MIN);
        Self {
            day,
            start: midnight + Duration::hours(i64::from(config.window_start_hour)),
            end: midnight + Duration::hours(i64::from(config.window_end_hour)),
        }
    }

    /// The window as instants, so membership holds across a DST change.
    pub fn bounds(&self) -> Result<(Timestamp, Timestamp)> {
        Ok((Timestamp::from_local(self.start)?, Timestamp::from_local(self.end)?))
    }

    /// Both bounds excluded: pre-roll and post-roll fetches pull in entries
    /// sitting exactly on the edges.
    pub fn contains(&self, t: Timestamp) -> Result<bool> {
        let (start, end) = self.bounds()?;
        Ok(start < t && t < end)
    }
}

#[derive(Debug, Clone)]
pub struct Night {
    pub window: NightWindow,
    pub tracks: Vec<Track>,
    pub summary: ScrapeSummary,
}

pub struct Assembler<F, S> {
    fetcher: F,
    site: S,
    config: Config,
}

impl<F: Fetcher, S: Site> Assembler<F, S> {
    pub fn new(fetcher: F, site: S, config: Config) -> Self {
        Self {
            fetcher,
            site,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Scrape the night of `day` and return its tracks in broadcast order,
    /// restricted to the open interval of the window.
    pub async fn collect_night<P>(&self, day: NaiveDate, progress: &mut P) -> Result<Night>
    where
        P: FnMut(ScrapeEvent),
    {
        let window = NightWindow::for_day(day, &self.config.scrape);
        info!("Night of the {} ({} - {})", day, window.start, window.end);

        let scraper = PlaylistScraper::new(&self.fetcher, &self.site, &self.config.scrape);
        let (playlist, summary) = scraper.run(window.start, window.end, progress).await?;

        let mut tracks = Vec::with_capacity(playlist.len());
        for track in playlist.into_sorted() {
            if window.contains(track.timestamp)? {
                tracks.push(track);
            } else {
                debug!(
                    "dropping {} - {} aired at {}",
                    track.artist, track.title, track.timestamp
                );
            }
        }
        tracks.sort_by_key(|t| t.timestamp);

        Ok(Night {
            window,
            tracks,
            summary,
        })
    }

    /// Store each track's picture under `<output_dir>/pictures/` and point the
    /// track at the local copy. Returns the number of pictures now local.
    ///
    /// A failed download is logged and the track keeps its remote URL;
    /// failing to write to disk aborts.
    pub async fn download_pictures<P>(
        &self,
        tracks: &mut [Track],
        output_dir: &Path,
        progress: &mut P,
    ) -> Result<usize>
    where
        P: FnMut(ScrapeEvent),
    {
        let pictures_dir = output_dir.join(PICTURES_DIR);
        tokio::fs::create_dir_all(&pictures_dir).await?;

        let mut stored = 0;
        for track in tracks.iter_mut() {
            let Some(url) = track.picture_url.clone() else {
                continue;
            };
            if !is_remote(&url) {
                continue;
            }
            let Some(file_name) = picture_file_name(&url) else {
                warn!("no file name in picture URL {}", url);
                continue;
            };

            let path = pictures_dir.join(&file_name);
            if path.exists() {
                debug!("picture {} already stored", file_name);
            } else {
                match self.fetcher.get_bytes(&url).await {
                    Ok(bytes) => tokio::fs::write(&path, bytes).await?,
                    Err(e) => {
                        warn!("picture download failed for {}: {}", url, e);
                        continue;
                    }
                }
            }

            track.set_local_picture(format!("{}/{}", PICTURES_DIR, file_name));
            stored += 1;
            progress(ScrapeEvent::PictureStored { file_name });
        }
        Ok(stored)
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Last path segment of a picture URL, used as its local file name.
pub fn picture_file_name(url: &str) -> Option<String> {
    let segment = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        Err(_) => url.rsplit('/').next().map(str::to_string),
    }?;

    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    Some(segment)
}
