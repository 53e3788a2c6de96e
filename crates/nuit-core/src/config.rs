use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;
use crate::site::{ExtractRules, SiteVariant};

/// Delays, offsets and steps are all shorter than a day.
const MAX_SHIFT_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Which station page to query and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_variant")]
    pub variant: SiteVariant,
    #[serde(default = "default_site_url")]
    pub url: String,
    #[serde(default = "platform::user_agent")]
    pub user_agent: String,
    /// Per-request timeout. Unset leaves the HTTP client default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Pagination and extraction tuning.
///
/// The step and stall limit were tuned against one site's window size; they
/// live here rather than in the algorithm so another site can retune them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default = "default_step_minutes")]
    pub pagination_step_minutes: i64,
    #[serde(default = "default_step_minutes")]
    pub seed_offset_minutes: i64,
    #[serde(default = "default_stall_limit")]
    pub stall_limit: u32,
    #[serde(default = "default_hour_cutoff")]
    pub hour_cutoff: u32,
    #[serde(default)]
    pub window_start_hour: u32,
    #[serde(default = "default_window_end_hour")]
    pub window_end_hour: u32,
    /// Minutes between the live broadcast and the time the site shows.
    #[serde(default = "default_delay_minutes")]
    pub delay_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Directory holding `fonts/` and `assets/`. Unset uses the built-in
    /// stylesheet.
    #[serde(default)]
    pub theme_dir: Option<PathBuf>,
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_feed_title")]
    pub feed_title: String,
    #[serde(default = "default_true")]
    pub download_pictures: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            variant: default_variant(),
            url: default_site_url(),
            user_agent: platform::user_agent(),
            timeout_secs: None,
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            pagination_step_minutes: default_step_minutes(),
            seed_offset_minutes: default_step_minutes(),
            stall_limit: default_stall_limit(),
            hour_cutoff: default_hour_cutoff(),
            window_start_hour: 0,
            window_end_hour: default_window_end_hour(),
            delay_minutes: default_delay_minutes(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            theme_dir: None,
            feed_url: default_feed_url(),
            feed_title: default_feed_title(),
            download_pictures: true,
        }
    }
}

impl ScrapeConfig {
    pub fn extract_rules(&self) -> ExtractRules {
        ExtractRules {
            delay_minutes: self.delay_minutes,
            hour_cutoff: self.hour_cutoff,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_SHIFT_MINUTES).contains(&self.pagination_step_minutes) {
            anyhow::bail!(
                "pagination_step_minutes must be between 1 and {}",
                MAX_SHIFT_MINUTES
            );
        }
        for (name, value) in [
            ("seed_offset_minutes", self.seed_offset_minutes),
            ("delay_minutes", self.delay_minutes),
        ] {
            if value.unsigned_abs() > MAX_SHIFT_MINUTES as u64 {
                anyhow::bail!(
                    "{} must be within {} minutes, got {}",
                    name,
                    MAX_SHIFT_MINUTES,
                    value
                );
            }
        }
        if self.hour_cutoff > 24 {
            anyhow::bail!("hour_cutoff must be at most 24");
        }
        if self.stall_limit == 0 {
            anyhow::bail!("stall_limit must be at least 1");
        }
        if self.window_end_hour > 24 || self.window_start_hour >= self.window_end_hour {
            anyhow::bail!(
                "invalid night window {}h-{}h",
                self.window_start_hour,
                self.window_end_hour
            );
        }
        Ok(())
    }
}

fn default_variant() -> SiteVariant {
    SiteVariant::Form
}

fn default_site_url() -> String {
    crate::site::nova::DEFAULT_URL.to_string()
}

fn default_step_minutes() -> i64 {
    50
}

fn default_stall_limit() -> u32 {
    3
}

fn default_hour_cutoff() -> u32 {
    6
}

fn default_window_end_hour() -> u32 {
    6
}

fn default_delay_minutes() -> i64 {
    3
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_feed_url() -> String {
    "https://nova.notmyidea.org".to_string()
}

fn default_feed_title() -> String {
    "Nova la nuit".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load from the platform config path, writing defaults there on first run.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.scrape.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site.variant, SiteVariant::Form);
        assert!(config.site.url.starts_with("http://www.nova.fr"));
        assert_eq!(config.scrape.pagination_step_minutes, 50);
        assert_eq!(config.scrape.seed_offset_minutes, 50);
        assert_eq!(config.scrape.stall_limit, 3);
        assert_eq!(config.scrape.hour_cutoff, 6);
        assert_eq!(config.scrape.window_start_hour, 0);
        assert_eq!(config.scrape.window_end_hour, 6);
        assert_eq!(config.scrape.delay_minutes, 3);
        assert_eq!(config.output.output_dir, PathBuf::from("output"));
        assert!(config.output.download_pictures);
        assert!(config.scrape.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[site]
variant = "path"
url = "https://radio.example.com/playlist"

[scrape]
stall_limit = 5
hour_cutoff = 5
"#,
        )
        .unwrap();
        assert_eq!(config.site.variant, SiteVariant::Path);
        assert_eq!(config.scrape.stall_limit, 5);
        assert_eq!(config.scrape.hour_cutoff, 5);
        assert_eq!(config.scrape.window_end_hour, 6);
        assert_eq!(config.scrape.pagination_step_minutes, 50);
        assert_eq!(config.output.feed_title, "Nova la nuit");
    }

    #[test]
    fn test_save_and_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.scrape.delay_minutes = 7;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.scrape.delay_minutes, 7);
    }

    #[test]
    fn test_validate_rejects_bad_window() {
        let mut scrape = ScrapeConfig::default();
        scrape.window_start_hour = 6;
        scrape.window_end_hour = 6;
        assert!(scrape.validate().is_err());

        let mut scrape = ScrapeConfig::default();
        scrape.stall_limit = 0;
        assert!(scrape.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_minute_shifts() {
        let mut scrape = ScrapeConfig::default();
        scrape.delay_minutes = 1_000_000_000_000;
        assert!(scrape.validate().is_err());

        let mut scrape = ScrapeConfig::default();
        scrape.delay_minutes = -24 * 60;
        assert!(scrape.validate().is_ok());

        let mut scrape = ScrapeConfig::default();
        scrape.seed_offset_minutes = i64::MIN;
        assert!(scrape.validate().is_err());

        let mut scrape = ScrapeConfig::default();
        scrape.pagination_step_minutes = 24 * 60 + 1;
        assert!(scrape.validate().is_err());
    }

    #[test]
    fn test_load_rejects_huge_delay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scrape]\ndelay_minutes = 1000000000000\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
