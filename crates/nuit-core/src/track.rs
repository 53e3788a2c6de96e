//! One playlist entry as broadcast during the night.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub artist: String,
    pub title: String,
    pub timestamp: Timestamp,
    /// Absolute cover art URL, or a path relative to the output directory
    /// once the picture has been downloaded.
    pub picture_url: Option<String>,
    /// Provider name (`deezer`, `spotify`, ...) to URL.
    pub links: BTreeMap<String, String>,
}

impl Track {
    pub fn new(
        artist: &str,
        title: &str,
        timestamp: Timestamp,
        picture_url: Option<String>,
        links: BTreeMap<String, String>,
    ) -> Self {
        Self {
            artist: normalize_text(artist),
            title: normalize_text(title),
            timestamp,
            picture_url,
            links,
        }
    }

    pub fn broadcast_time(&self) -> Result<NaiveDateTime> {
        self.timestamp.to_local()
    }

    /// Point the picture at a locally stored copy.
    pub fn set_local_picture(&mut self, relative_path: String) {
        self.picture_url = Some(relative_path);
    }
}

const QUOTES: [char; 5] = ['"', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'];

/// Trim, fold quote characters into `'`, then capitalize: first character
/// upper case, everything else lower case.
pub fn normalize_text(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .chars()
        .map(|c| if QUOTES.contains(&c) { '\'' } else { c })
        .collect();

    let mut chars = folded.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
