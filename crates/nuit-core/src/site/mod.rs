//! Site variants: how to ask a station page for a given date and how to
//! read tracks back out of the answer.
//!
//! The pagination engine in [`crate::playlist`] is written once against the
//! [`Site`] trait; each variant only knows its request shape and selectors.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{Result, ScrapeError};
use crate::fetch::Fetcher;
use crate::time::Timestamp;
use crate::track::Track;

pub mod nova;
pub mod path;

pub use nova::NovaSite;
pub use path::PathSite;

/// Request shape for one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageRequest {
    Get {
        url: String,
    },
    Form {
        url: String,
        fields: Vec<(String, String)>,
        /// Hidden field whose value must be read from the page before posting.
        token: Option<FormToken>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormToken {
    pub field: &'static str,
    pub selector: &'static str,
}

/// Rules shared by every variant when turning page entries into tracks.
#[derive(Debug, Clone, Copy)]
pub struct ExtractRules {
    /// Minutes between the live broadcast and the time shown on the site.
    pub delay_minutes: i64,
    /// Entries whose hour is above this belong to the next day's programming.
    pub hour_cutoff: u32,
}

pub trait Site {
    fn build_request(&self, at: Timestamp) -> Result<PageRequest>;

    /// `at` is the instant the page was requested for; pages that only
    /// show `HH:MM` take their calendar date and DST pass from it.
    fn extract_tracks(
        &self,
        html: &str,
        at: Timestamp,
        rules: &ExtractRules,
    ) -> Result<Vec<Track>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteVariant {
    /// Form POST with year/month/day/hour/minutes fields.
    Form,
    /// GET with the epoch timestamp as the last path segment.
    Path,
}

/// Runtime choice between the concrete variants.
pub enum AnySite {
    Nova(NovaSite),
    Path(PathSite),
}

impl AnySite {
    pub fn new(variant: SiteVariant, url: &str) -> Result<Self> {
        Ok(match variant {
            SiteVariant::Form => Self::Nova(NovaSite::new(url)?),
            SiteVariant::Path => Self::Path(PathSite::new(url)?),
        })
    }
}

impl Site for AnySite {
    fn build_request(&self, at: Timestamp) -> Result<PageRequest> {
        match self {
            Self::Nova(site) => site.build_request(at),
            Self::Path(site) => site.build_request(at),
        }
    }

    fn extract_tracks(
        &self,
        html: &str,
        at: Timestamp,
        rules: &ExtractRules,
    ) -> Result<Vec<Track>> {
        match self {
            Self::Nova(site) => site.extract_tracks(html, at, rules),
            Self::Path(site) => site.extract_tracks(html, at, rules),
        }
    }
}

/// Perform a [`PageRequest`], reading the form token first when needed.
pub async fn fetch_page<F: Fetcher>(fetcher: &F, request: &PageRequest) -> Result<String> {
    match request {
        PageRequest::Get { url } => fetcher.get_text(url).await,
        PageRequest::Form { url, fields, token } => {
            let mut fields = fields.clone();
            if let Some(token) = token {
                let form_page = fetcher.get_text(url).await?;
                let value = read_input_value(&form_page, token.selector)?;
                debug!("{}={}", token.field, value);
                fields.push((token.field.to_string(), value));
            }
            fetcher.post_form(url, &fields).await
        }
    }
}

fn read_input_value(html: &str, selector: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let sel = parse_selector(selector)?;
    document
        .select(&sel)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string)
        .ok_or_else(|| ScrapeError::Parse(format!("no value for {}", selector)))
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector(format!("{selector}: {e:?}")))
}

/// Text content of the first match, whitespace collapsed. Empty when absent.
pub(crate) fn select_text(element: &ElementRef<'_>, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(|e| e.text().collect::<Vec<_>>().join(" "))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// Resolve a possibly relative URL against the site URL.
pub(crate) fn resolve_url(base: &reqwest::Url, href: &str) -> Result<String> {
    base.join(href)
        .map(|u| u.to_string())
        .map_err(|e| ScrapeError::Url {
            url: href.to_string(),
            reason: e.to_string(),
        })
}

/// Provider name from a link class: `link-deezer` -> `deezer`.
pub(crate) fn provider_from_class<'a>(classes: impl Iterator<Item = &'a str>) -> Option<String> {
    classes
        .filter_map(|class| class.split('-').nth(1))
        .find(|provider| !provider.is_empty())
        .map(str::to_string)
}

/// Build the provider -> URL map from anchor elements.
pub(crate) fn collect_links<'a>(
    base: &reqwest::Url,
    anchors: impl Iterator<Item = ElementRef<'a>>,
) -> Result<BTreeMap<String, String>> {
    let mut links = BTreeMap::new();
    for anchor in anchors {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(provider) = provider_from_class(anchor.value().classes()) else {
            continue;
        };
        links.insert(provider, resolve_url(base, href)?);
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_class() {
        assert_eq!(
            provider_from_class(["link-deezer"].into_iter()).as_deref(),
            Some("deezer")
        );
        assert_eq!(
            provider_from_class(["btn", "link-spotify-green"].into_iter()).as_deref(),
            Some("spotify")
        );
        assert_eq!(provider_from_class(["btn"].into_iter()), None);
    }

    #[test]
    fn test_resolve_url() {
        let base = reqwest::Url::parse("http://www.nova.fr/radionova/radio-nova").unwrap();
        assert_eq!(
            resolve_url(&base, "/sites/default/files/cover.jpg").unwrap(),
            "http://www.nova.fr/sites/default/files/cover.jpg"
        );
        assert_eq!(
            resolve_url(&base, "https://cdn.example.com/a.png").unwrap(),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn test_read_input_value() {
        let html = r#"<form><input type="hidden" name="form_build_id" value="form-abc123"></form>"#;
        assert_eq!(
            read_input_value(html, "input[name=form_build_id]").unwrap(),
            "form-abc123"
        );
        assert!(matches!(
            read_input_value("<form></form>", "input[name=form_build_id]"),
            Err(ScrapeError::Parse(_))
        ));
    }
}
