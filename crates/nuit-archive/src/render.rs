//! Static HTML pages: one per night plus an index, rendered through
//! `tracks.html` and `index.html` templates.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use minijinja::Environment;
use nuit_core::{Night, Track};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const RECORDING_EXTENSIONS: &[&str] = &["ogg", "mp3", "m4a", "opus"];

const TEMPLATES: &[(&str, &str)] = &[
    ("tracks.html", include_str!("../theme/tracks.html")),
    ("index.html", include_str!("../theme/index.html")),
];

const WEEKDAYS: [&str; 7] = [
    "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
];

const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

pub fn page_name(day: NaiveDate) -> String {
    format!("{}.html", day.format("%Y-%m-%d"))
}

/// French long date, e.g. `lundi 1er janvier 2024`.
pub fn day_label(day: NaiveDate) -> String {
    let weekday = WEEKDAYS[day.weekday().num_days_from_monday() as usize];
    let month = MONTHS[day.month0() as usize];
    match day.day() {
        1 => format!("{} 1er {} {}", weekday, month, day.year()),
        n => format!("{} {} {} {}", weekday, n, month, day.year()),
    }
}

/// Recording of the night sitting next to the pages, if any.
pub fn find_recording(output_dir: &Path, day: NaiveDate) -> Option<String> {
    let stem = day.format("%Y-%m-%d").to_string();
    RECORDING_EXTENSIONS
        .iter()
        .map(|ext| format!("{}.{}", stem, ext))
        .find(|name| output_dir.join(name).is_file())
}

#[derive(Serialize)]
struct LinkView<'a> {
    provider: &'a str,
    url: &'a str,
}

#[derive(Serialize)]
struct TrackView<'a> {
    timestamp: i64,
    datetime: String,
    time: String,
    artist: &'a str,
    title: &'a str,
    picture_url: Option<&'a str>,
    links: Vec<LinkView<'a>>,
}

impl<'a> TrackView<'a> {
    fn new(track: &'a Track) -> Result<Self> {
        let aired = track.broadcast_time()?;
        Ok(Self {
            timestamp: track.timestamp.secs(),
            datetime: aired.format("%Y-%m-%dT%H:%M:%S").to_string(),
            time: aired.format("%H:%M").to_string(),
            artist: &track.artist,
            title: &track.title,
            picture_url: track.picture_url.as_deref(),
            links: track
                .links
                .iter()
                .map(|(provider, url)| LinkView {
                    provider: provider.as_str(),
                    url: url.as_str(),
                })
                .collect(),
        })
    }
}

#[derive(Serialize)]
struct NightPage<'a> {
    title: &'a str,
    day: String,
    day_label: String,
    recording: Option<&'a str>,
    tracks: Vec<TrackView<'a>>,
}

#[derive(Serialize)]
struct NightLink {
    page: String,
    day: String,
    label: String,
}

impl NightLink {
    fn new(day: NaiveDate) -> Self {
        Self {
            page: page_name(day),
            day: day.format("%Y-%m-%d").to_string(),
            label: day_label(day),
        }
    }
}

#[derive(Serialize)]
struct IndexPage<'a> {
    title: &'a str,
    latest: Option<NightLink>,
    nights: Vec<NightLink>,
}

/// Page templates, HTML-escaped on output.
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// Built-in templates, each replaced by a file of the same name at the
    /// root of `theme_dir` when one exists.
    pub fn new(theme_dir: Option<&Path>) -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        for &(name, builtin) in TEMPLATES {
            let themed = theme_dir.map(|dir| dir.join(name)).filter(|p| p.is_file());
            match themed {
                Some(path) => {
                    let source = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    env.add_template_owned(name, source)
                        .with_context(|| format!("Invalid template {}", path.display()))?;
                    debug!("Using theme template {}", path.display());
                }
                None => env
                    .add_template(name, builtin)
                    .with_context(|| format!("Invalid built-in template {}", name))?,
            }
        }
        Ok(Self { env })
    }

    pub fn render_night(&self, title: &str, night: &Night, recording: Option<&str>) -> Result<String> {
        let day = night.window.day;
        let page = NightPage {
            title,
            day: day.format("%Y-%m-%d").to_string(),
            day_label: day_label(day),
            recording,
            tracks: night
                .tracks
                .iter()
                .map(TrackView::new)
                .collect::<Result<_>>()?,
        };
        let html = self.env.get_template("tracks.html")?.render(&page)?;
        Ok(html)
    }

    /// `days` newest first.
    pub fn render_index(&self, title: &str, days: &[NaiveDate]) -> Result<String> {
        let page = IndexPage {
            title,
            latest: days.first().copied().map(NightLink::new),
            nights: days.iter().copied().map(NightLink::new).collect(),
        };
        let html = self.env.get_template("index.html")?.render(&page)?;
        Ok(html)
    }

    /// Write `YYYY-MM-DD.html` for the night, then refresh `index.html`.
    pub fn write_night(&self, output_dir: &Path, title: &str, night: &Night) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let recording = find_recording(output_dir, night.window.day);
        let page = self.render_night(title, night, recording.as_deref())?;
        let page_path = output_dir.join(page_name(night.window.day));
        std::fs::write(&page_path, page)
            .with_context(|| format!("Failed to write {}", page_path.display()))?;
        info!("Wrote {}", page_path.display());

        let index = self.render_index(title, &archived_days(output_dir)?)?;
        let index_path = output_dir.join("index.html");
        std::fs::write(&index_path, index)
            .with_context(|| format!("Failed to write {}", index_path.display()))?;

        Ok(page_path)
    }
}

/// Nights already rendered in `output_dir`, newest first.
pub fn archived_days(output_dir: &Path) -> Result<Vec<NaiveDate>> {
    let mut days = Vec::new();
    let entries = std::fs::read_dir(output_dir)
        .with_context(|| format!("Failed to list {}", output_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("html") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Ok(day) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
            days.push(day);
        }
    }
    days.sort_unstable_by(|a, b| b.cmp(a));
    Ok(days)
}
