//! Rebuild a radio station's overnight playlist from its "now playing" page.

pub mod config;
pub mod error;
pub mod fetch;
pub mod night;
pub mod platform;
pub mod playlist;
pub mod site;
pub mod time;
pub mod track;

pub use config::Config;
pub use error::ScrapeError;
pub use fetch::{Fetcher, HttpFetcher};
pub use night::{Assembler, Night, NightWindow};
pub use playlist::{Playlist, PlaylistScraper, ScrapeEvent, ScrapeSummary};
pub use site::{AnySite, ExtractRules, PageRequest, Site, SiteVariant};
pub use time::Timestamp;
pub use track::Track;
