#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use nuit_core::error::{Result, ScrapeError};
use nuit_core::{Fetcher, Timestamp};
use std::cell::RefCell;
use std::collections::HashMap;

pub const FORM_TOKEN: &str = "form-fixture-token";

pub fn night_at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

/// One entry as `(HH:MM, artist, title)`.
pub type Entry<'a> = (&'a str, &'a str, &'a str);

/// Render a page in the shape of the Nova "what was that track" answer.
pub fn nova_page(entries: &[Entry<'_>]) -> String {
    let mut html = String::from("<html><body><div class=\"results\">");
    for (time, artist, title) in entries {
        let slug = time.replace(':', "");
        html.push_str(&format!(
            r#"<div class="square-item">
  <a href="/titre/{slug}">
    <img src="/covers/{slug}.jpg">
    <div class="title"><span class="name">{artist}</span><span class="description">{title}</span></div>
    <time>{time}</time>
  </a>
  <div class="links"><a class="link-deezer" href="https://www.deezer.com/track/{slug}">Deezer</a></div>
</div>"#
        ));
    }
    html.push_str("</div></body></html>");
    html
}

/// In-memory Nova site. Answers keyed by the posted date; a date with
/// several answers serves them in order and keeps repeating the last one.
#[derive(Default)]
pub struct NovaFixture {
    pages: HashMap<NaiveDateTime, Vec<String>>,
    pictures: HashMap<String, Vec<u8>>,
    served: RefCell<HashMap<NaiveDateTime, usize>>,
    pub posts: RefCell<Vec<NaiveDateTime>>,
    pub byte_gets: RefCell<Vec<String>>,
    pub fail_posts: bool,
}

impl NovaFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, at: NaiveDateTime, entries: &[Entry<'_>]) -> Self {
        self.pages.entry(at).or_default().push(nova_page(entries));
        self
    }

    pub fn picture(mut self, url: &str, bytes: &[u8]) -> Self {
        self.pictures.insert(url.to_string(), bytes.to_vec());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_posts = true;
        self
    }

    pub fn post_count(&self) -> usize {
        self.posts.borrow().len()
    }

    fn posted_date(fields: &[(String, String)]) -> Result<NaiveDateTime> {
        let get = |name: &str| -> Result<u32> {
            fields
                .iter()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.parse().ok())
                .ok_or_else(|| ScrapeError::Parse(format!("missing field {name}")))
        };
        NaiveDate::from_ymd_opt(get("year")? as i32, get("month")?, get("day")?)
            .and_then(|d| d.and_hms_opt(get("hour").ok()?, get("minutes").ok()?, 0))
            .ok_or_else(|| ScrapeError::Parse("bad posted date".into()))
    }
}

impl Fetcher for NovaFixture {
    async fn get_text(&self, _url: &str) -> Result<String> {
        Ok(format!(
            r#"<form><input type="hidden" name="form_build_id" value="{FORM_TOKEN}"></form>"#
        ))
    }

    async fn post_form(&self, _url: &str, fields: &[(String, String)]) -> Result<String> {
        if self.fail_posts {
            return Err(ScrapeError::Parse("fixture refuses to answer".into()));
        }
        if !fields
            .iter()
            .any(|(k, v)| k == "form_build_id" && v == FORM_TOKEN)
        {
            return Err(ScrapeError::Parse("form token missing".into()));
        }

        let at = Self::posted_date(fields)?;
        self.posts.borrow_mut().push(at);

        let Some(answers) = self.pages.get(&at) else {
            return Ok(nova_page(&[]));
        };
        let mut served = self.served.borrow_mut();
        let n = served.entry(at).or_insert(0);
        let page = answers[(*n).min(answers.len() - 1)].clone();
        *n += 1;
        Ok(page)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.byte_gets.borrow_mut().push(url.to_string());
        self.pictures
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::Status {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
    }
}

/// In-memory timestamp-addressed site.
#[derive(Default)]
pub struct PathFixture {
    pages: HashMap<i64, String>,
    pub gets: RefCell<Vec<String>>,
}

impl PathFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page for `at`, listing entries aired at the given local times.
    pub fn page(mut self, at: NaiveDateTime, aired: &[(NaiveDateTime, &str)]) -> Self {
        let mut html = String::from("<ul>");
        for (time, artist) in aired {
            let ts = Timestamp::from_local(*time).unwrap();
            html.push_str(&format!(
                r#"<li class="playlist-item ts-{ts}"><span class="artist">{artist}</span><span class="title">t</span></li>"#
            ));
        }
        html.push_str("</ul>");
        self.pages
            .insert(Timestamp::from_local(at).unwrap().secs(), html);
        self
    }
}

impl Fetcher for PathFixture {
    async fn get_text(&self, url: &str) -> Result<String> {
        self.gets.borrow_mut().push(url.to_string());
        let secs: i64 = url
            .rsplit('/')
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ScrapeError::Parse(format!("no timestamp in {url}")))?;
        Ok(self
            .pages
            .get(&secs)
            .cloned()
            .unwrap_or_else(|| "<ul></ul>".to_string()))
    }

    async fn post_form(&self, url: &str, _fields: &[(String, String)]) -> Result<String> {
        Err(ScrapeError::Parse(format!("unexpected POST to {url}")))
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        Err(ScrapeError::Parse(format!("unexpected GET {url}")))
    }
}
