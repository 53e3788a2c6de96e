//! Playlist pages addressed by timestamp: `GET <url>/<epoch seconds>`.
//!
//! Entries carry their own broadcast epoch, either as a `data-timestamp`
//! attribute or a `ts-<epoch>` class, so the requested date is not needed
//! to rebuild the time.

use chrono::Timelike;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{
    collect_links, parse_selector, resolve_url, select_text, ExtractRules, PageRequest, Site,
};
use crate::error::{Result, ScrapeError};
use crate::time::Timestamp;
use crate::track::Track;

pub struct PathSite {
    url: reqwest::Url,
    entry: Selector,
    artist: Selector,
    title: Selector,
    picture: Selector,
    links: Selector,
    ts_class: Regex,
}

impl PathSite {
    pub fn new(url: &str) -> Result<Self> {
        let url = reqwest::Url::parse(url).map_err(|e| ScrapeError::Url {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            url,
            entry: parse_selector(".playlist-item")?,
            artist: parse_selector(".artist")?,
            title: parse_selector(".title")?,
            picture: parse_selector("img")?,
            links: parse_selector(r#"a[class^="link-"]"#)?,
            ts_class: Regex::new(r"^ts-(\d+)$").map_err(|e| ScrapeError::Config(e.to_string()))?,
        })
    }

    fn raw_timestamp(&self, entry: &ElementRef<'_>) -> Result<Timestamp> {
        let element = entry.value();
        let raw = element.attr("data-timestamp").map(str::to_string).or_else(|| {
            element
                .classes()
                .find_map(|class| self.ts_class.captures(class))
                .map(|caps| caps[1].to_string())
        });

        let raw = raw.ok_or_else(|| ScrapeError::Parse("entry without timestamp".into()))?;
        let secs = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ScrapeError::Parse(format!("malformed timestamp {:?}", raw)))?;
        Ok(Timestamp::from_secs(secs.trunc() as i64))
    }

    fn extract_entry(&self, entry: ElementRef<'_>, rules: &ExtractRules) -> Result<Option<Track>> {
        let aired = self.raw_timestamp(&entry)?;
        if aired.to_local()?.hour() > rules.hour_cutoff {
            return Ok(None);
        }

        let picture_url = entry
            .select(&self.picture)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| resolve_url(&self.url, src))
            .transpose()?;

        let links = collect_links(&self.url, entry.select(&self.links))?;

        Ok(Some(Track::new(
            &select_text(&entry, &self.artist),
            &select_text(&entry, &self.title),
            aired.plus_minutes(rules.delay_minutes)?,
            picture_url,
            links,
        )))
    }
}

impl Site for PathSite {
    fn build_request(&self, at: Timestamp) -> Result<PageRequest> {
        let base = self.url.as_str().trim_end_matches('/');
        Ok(PageRequest::Get {
            url: format!("{}/{}", base, at),
        })
    }

    fn extract_tracks(
        &self,
        html: &str,
        _at: Timestamp,
        rules: &ExtractRules,
    ) -> Result<Vec<Track>> {
        let document = Html::parse_document(html);
        let mut tracks = Vec::new();
        for entry in document.select(&self.entry) {
            if let Some(track) = self.extract_entry(entry, rules)? {
                tracks.push(track);
            }
        }
        Ok(tracks)
    }
}
