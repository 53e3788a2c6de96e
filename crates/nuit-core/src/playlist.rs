//! Timestamp-keyed playlist and the pagination engine that fills it.
//!
//! Station pages only show a short window of recently aired tracks, so a
//! night is rebuilt by asking for successive dates: each request is placed
//! one pagination step after the latest track seen so far. The run ends when
//! the latest track reaches the end of the window, or after `stall_limit`
//! consecutive pages brought nothing new.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::site::{fetch_page, Site};
use crate::time::Timestamp;
use crate::track::Track;

/// Tracks of one run, keyed by broadcast timestamp. Entries are only added.
#[derive(Debug, Default)]
pub struct Playlist {
    tracks: BTreeMap<Timestamp, Track>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the timestamp is already known. First write wins.
    pub fn insert(&mut self, track: Track) -> bool {
        use std::collections::btree_map::Entry;
        match self.tracks.entry(track.timestamp) {
            Entry::Vacant(slot) => {
                slot.insert(track);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn latest(&self) -> Option<Timestamp> {
        self.tracks.keys().next_back().copied()
    }

    /// Latest timestamp, or the epoch while empty.
    pub fn max_timestamp(&self) -> Timestamp {
        self.latest().unwrap_or(Timestamp::EPOCH)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, ts: Timestamp) -> Option<&Track> {
        self.tracks.get(&ts)
    }

    /// Tracks in ascending broadcast order.
    pub fn into_sorted(self) -> Vec<Track> {
        self.tracks.into_values().collect()
    }
}

/// Progress notifications, one per fetch and one per new track.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeEvent {
    PageFetched { at: Timestamp },
    TrackFound { timestamp: Timestamp },
    Stalled { count: u32 },
    PictureStored { file_name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeSummary {
    pub fetches: u32,
    pub tracks: usize,
    /// True when the run ended on the stall limit rather than reaching `end`.
    pub exhausted: bool,
}

pub struct PlaylistScraper<'a, F, S> {
    fetcher: &'a F,
    site: &'a S,
    config: &'a ScrapeConfig,
}

impl<'a, F: Fetcher, S: Site> PlaylistScraper<'a, F, S> {
    pub fn new(fetcher: &'a F, site: &'a S, config: &'a ScrapeConfig) -> Self {
        Self {
            fetcher,
            site,
            config,
        }
    }

    /// Collect every track the site reports between `start` and `end`.
    ///
    /// Fetch and parse failures abort the run.
    pub async fn run<P>(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        progress: &mut P,
    ) -> Result<(Playlist, ScrapeSummary)>
    where
        P: FnMut(ScrapeEvent),
    {
        let end_ts = Timestamp::from_local(end)?;
        let seed = Timestamp::from_local(start)?.plus_minutes(self.config.seed_offset_minutes)?;
        let mut playlist = Playlist::new();

        self.scrape_page(seed, &mut playlist, progress).await?;
        let mut fetches = 1;
        let mut stalls = 0;
        let mut exhausted = false;

        while playlist.max_timestamp() < end_ts {
            let at = match playlist.latest() {
                Some(latest) => latest.plus_minutes(self.config.pagination_step_minutes)?,
                None => seed,
            };

            let added = self.scrape_page(at, &mut playlist, progress).await?;
            fetches += 1;

            if added == 0 {
                stalls += 1;
                progress(ScrapeEvent::Stalled { count: stalls });
            } else {
                stalls = 0;
            }

            if stalls >= self.config.stall_limit {
                debug!("no new tracks after {} pages, stopping", stalls);
                exhausted = true;
                break;
            }
        }

        let summary = ScrapeSummary {
            fetches,
            tracks: playlist.len(),
            exhausted,
        };
        info!(
            "scraped {} tracks in {} fetches (exhausted={})",
            summary.tracks, summary.fetches, summary.exhausted
        );
        Ok((playlist, summary))
    }

    /// Fetch the page for `at` and merge its tracks. Returns how many were new.
    async fn scrape_page<P>(
        &self,
        at: Timestamp,
        playlist: &mut Playlist,
        progress: &mut P,
    ) -> Result<usize>
    where
        P: FnMut(ScrapeEvent),
    {
        let request = self.site.build_request(at)?;
        let html = fetch_page(self.fetcher, &request).await?;
        progress(ScrapeEvent::PageFetched { at });

        let rules = self.config.extract_rules();
        let mut added = 0;
        for track in self.site.extract_tracks(&html, at, &rules)? {
            let timestamp = track.timestamp;
            if playlist.insert(track) {
                added += 1;
                progress(ScrapeEvent::TrackFound { timestamp });
            }
        }
        debug!("page for {}: {} new, {} total", at, added, playlist.len());
        Ok(added)
    }
}
