//! Radio Nova "c'était quoi ce titre" page: a Drupal form that answers with
//! the tracks aired shortly before the posted date and time.

use chrono::{Datelike, NaiveTime, Timelike};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{
    collect_links, parse_selector, resolve_url, select_text, ExtractRules, FormToken, PageRequest,
    Site,
};
use crate::error::{Result, ScrapeError};
use crate::time::Timestamp;
use crate::track::Track;

pub const DEFAULT_URL: &str = "http://www.nova.fr/radionova/radio-nova";

const FORM_ID: &str = "cqctform";
const FORM_TOKEN: FormToken = FormToken {
    field: "form_build_id",
    selector: "input[name=form_build_id]",
};

pub struct NovaSite {
    url: reqwest::Url,
    entry: Selector,
    artist: Selector,
    title: Selector,
    picture: Selector,
    time: Selector,
    anchor: Selector,
    hour_minute: Regex,
}

impl NovaSite {
    pub fn new(url: &str) -> Result<Self> {
        let url = reqwest::Url::parse(url).map_err(|e| ScrapeError::Url {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            url,
            entry: parse_selector(".square-item > a")?,
            artist: parse_selector(".title > .name")?,
            title: parse_selector(".title > .description")?,
            picture: parse_selector("img")?,
            time: parse_selector("time")?,
            anchor: parse_selector("a")?,
            hour_minute: Regex::new(r"^\s*(\d{1,2}):(\d{2})\s*$")
                .map_err(|e| ScrapeError::Config(e.to_string()))?,
        })
    }

    fn parse_time(&self, raw: &str) -> Result<(u32, u32)> {
        let caps = self
            .hour_minute
            .captures(raw)
            .ok_or_else(|| ScrapeError::Parse(format!("malformed time {:?}", raw)))?;
        let hour = caps[1].parse().map_err(|_| ScrapeError::Parse(raw.to_string()))?;
        let minute = caps[2].parse().map_err(|_| ScrapeError::Parse(raw.to_string()))?;
        Ok((hour, minute))
    }

    /// Anchors inside the siblings of an entry: streaming/purchase links sit
    /// next to the entry, not inside it.
    fn sibling_anchors<'a>(&self, entry: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let siblings = entry
            .prev_siblings()
            .chain(entry.next_siblings())
            .filter_map(ElementRef::wrap);

        let mut anchors = Vec::new();
        for sibling in siblings {
            if sibling.value().name() == "a" {
                anchors.push(sibling);
            }
            anchors.extend(sibling.select(&self.anchor));
        }
        anchors
    }

    fn extract_entry(
        &self,
        entry: ElementRef<'_>,
        at: Timestamp,
        rules: &ExtractRules,
    ) -> Result<Option<Track>> {
        let raw_time = select_text(&entry, &self.time);
        let (hour, minute) = self.parse_time(&raw_time)?;
        if hour > rules.hour_cutoff {
            return Ok(None);
        }

        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| ScrapeError::Parse(format!("invalid time {:?}", raw_time)))?;
        let aired = at.to_local()?.date().and_time(time);
        let timestamp =
            Timestamp::from_local_before(aired, at)?.plus_minutes(rules.delay_minutes)?;

        let picture_url = entry
            .select(&self.picture)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| resolve_url(&self.url, src))
            .transpose()?;

        let links = collect_links(&self.url, self.sibling_anchors(&entry).into_iter())?;

        Ok(Some(Track::new(
            &select_text(&entry, &self.artist),
            &select_text(&entry, &self.title),
            timestamp,
            picture_url,
            links,
        )))
    }
}

impl Site for NovaSite {
    fn build_request(&self, at: Timestamp) -> Result<PageRequest> {
        let at = at.to_local()?;
        let fields = [
            ("form_id", FORM_ID.to_string()),
            ("year", at.year().to_string()),
            ("month", at.month().to_string()),
            ("day", at.day().to_string()),
            ("hour", at.hour().to_string()),
            ("minutes", at.minute().to_string()),
        ];
        Ok(PageRequest::Form {
            url: self.url.to_string(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            token: Some(FORM_TOKEN),
        })
    }

    fn extract_tracks(
        &self,
        html: &str,
        at: Timestamp,
        rules: &ExtractRules,
    ) -> Result<Vec<Track>> {
        let document = Html::parse_document(html);
        let mut tracks = Vec::new();
        for entry in document.select(&self.entry) {
            if let Some(track) = self.extract_entry(entry, at, rules)? {
                tracks.push(track);
            }
        }
        debug!("{} entries kept from page for {}", tracks.len(), at);
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    const PAGE: &str = r#"
<html><body>
<div class="square-item">
  <a href="/titre/1">
    <img src="/sites/default/files/covers/daho.jpg">
    <div class="title"><span class="name">ÉTIENNE DAHO</span><span class="description">WEEK-END À ROME</span></div>
    <time>01:07</time>
  </a>
  <div class="links">
    <a class="link-deezer" href="https://www.deezer.com/track/1">Deezer</a>
    <a class="link-spotify" href="https://open.spotify.com/track/1">Spotify</a>
  </div>
</div>
<div class="square-item">
  <a href="/titre/2">
    <div class="title"><span class="name">"Fela" Kuti</span><span class="description">Zombie</span></div>
    <time>00:58</time>
  </a>
</div>
<div class="square-item">
  <a href="/titre/3">
    <div class="title"><span class="name">Morning</span><span class="description">Show</span></div>
    <time>07:02</time>
  </a>
</div>
</body></html>"#;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn ts(h: u32, m: u32) -> Timestamp {
        Timestamp::from_local(at(h, m)).unwrap()
    }

    fn rules(delay_minutes: i64) -> ExtractRules {
        ExtractRules {
            delay_minutes,
            hour_cutoff: 6,
        }
    }

    fn site() -> NovaSite {
        NovaSite::new(DEFAULT_URL).unwrap()
    }

    #[test]
    fn test_build_request_posts_date_fields() {
        let request = site().build_request(ts(1, 5)).unwrap();
        let PageRequest::Form { url, fields, token } = request else {
            panic!("expected a form request");
        };
        assert_eq!(url, DEFAULT_URL);
        assert_eq!(token, Some(FORM_TOKEN));
        let get = |k: &str| {
            fields
                .iter()
                .find(|(name, _)| name == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("form_id"), Some("cqctform"));
        assert_eq!(get("year"), Some("2024"));
        assert_eq!(get("month"), Some("1"));
        assert_eq!(get("day"), Some("1"));
        assert_eq!(get("hour"), Some("1"));
        assert_eq!(get("minutes"), Some("5"));
    }

    #[test]
    fn test_extract_fields() {
        let tracks = site().extract_tracks(PAGE, ts(1, 50), &rules(0)).unwrap();
        assert_eq!(tracks.len(), 2);

        let daho = &tracks[0];
        assert_eq!(daho.artist, "Étienne daho");
        assert_eq!(daho.title, "Week-end à rome");
        assert_eq!(daho.timestamp, Timestamp::from_local(at(1, 7)).unwrap());
        assert_eq!(
            daho.picture_url.as_deref(),
            Some("http://www.nova.fr/sites/default/files/covers/daho.jpg")
        );
        assert_eq!(
            daho.links.get("deezer").map(String::as_str),
            Some("https://www.deezer.com/track/1")
        );
        assert_eq!(daho.links.len(), 2);

        let fela = &tracks[1];
        assert_eq!(fela.artist, "'fela' kuti");
        assert!(fela.picture_url.is_none());
        assert!(fela.links.is_empty());
    }

    #[test]
    fn test_hour_above_cutoff_is_skipped() {
        let tracks = site().extract_tracks(PAGE, ts(7, 30), &rules(0)).unwrap();
        assert!(tracks.iter().all(|t| t.artist != "Morning"));
    }

    #[test]
    fn test_delay_shifts_timestamp() {
        let tracks = site().extract_tracks(PAGE, ts(1, 50), &rules(3)).unwrap();
        assert_eq!(
            tracks[0].timestamp,
            Timestamp::from_local(at(1, 10)).unwrap()
        );
    }

    #[test]
    fn test_date_comes_from_request() {
        let next_day = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(1, 50, 0)
            .unwrap();
        let tracks = site()
            .extract_tracks(PAGE, Timestamp::from_local(next_day).unwrap(), &rules(0))
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(1, 7, 0)
            .unwrap();
        assert_eq!(tracks[0].timestamp, Timestamp::from_local(expected).unwrap());
    }

    #[test]
    fn test_missing_time_is_a_parse_error() {
        let page = r#"<div class="square-item"><a><div class="title"><span class="name">x</span></div></a></div>"#;
        assert!(matches!(
            site().extract_tracks(page, ts(1, 0), &rules(0)),
            Err(ScrapeError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_page_yields_nothing() {
        let tracks = site()
            .extract_tracks("<html><body></body></html>", ts(1, 0), &rules(0))
            .unwrap();
        assert!(tracks.is_empty());
    }
}
