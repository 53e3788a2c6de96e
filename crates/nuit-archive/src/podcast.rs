//! `podcast.xml`: an RSS 2.0 feed with one item per recording found in the
//! output directory.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;
use walkdir::WalkDir;

pub const FEED_FILE: &str = "podcast.xml";

const MEDIA_EXTENSIONS: &[&str] = &["mp3", "ogg", "oga", "m4a", "opus", "flac", "wav"];

#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub url: String,
    pub length: u64,
    pub mime: String,
    pub published: DateTime<Utc>,
    /// Page of the night, when rendered next to the recording.
    pub link: Option<String>,
}

fn is_media(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// URL of `relative` (slash separated) under `base_url`.
fn public_url(base_url: &str, relative: &str) -> Result<String> {
    let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
        .with_context(|| format!("Invalid feed URL {}", base_url))?;
    let url = base
        .join(&format!("./{}", relative))
        .with_context(|| format!("Cannot build URL for {}", relative))?;
    Ok(url.to_string())
}

fn relative_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root)?;
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

/// Recordings under `output_dir`, newest first.
pub fn collect_items(output_dir: &Path, base_url: &str) -> Result<Vec<FeedItem>> {
    let mut items = Vec::new();
    for entry in WalkDir::new(output_dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", output_dir.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_media(path) {
            continue;
        }

        let metadata = entry.metadata()?;
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let page = path.with_extension("html");
        let link = if page.is_file() {
            Some(public_url(base_url, &relative_path(output_dir, &page)?)?)
        } else {
            None
        };

        items.push(FeedItem {
            title,
            url: public_url(base_url, &relative_path(output_dir, path)?)?,
            length: metadata.len(),
            mime: mime_guess::from_path(path)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            published: metadata.modified().map(DateTime::<Utc>::from)?,
            link,
        });
    }
    items.sort_by(|a, b| b.published.cmp(&a.published).then_with(|| b.title.cmp(&a.title)));
    Ok(items)
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub fn render_feed(title: &str, base_url: &str, items: &[FeedItem]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("rss").with_attributes([("version", "2.0")]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;
    text_element(&mut writer, "title", title)?;
    text_element(&mut writer, "link", base_url)?;
    text_element(&mut writer, "description", &format!("{} - night recordings", title))?;
    if let Some(newest) = items.first() {
        text_element(&mut writer, "lastBuildDate", &newest.published.to_rfc2822())?;
    }

    for item in items {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        text_element(&mut writer, "title", &item.title)?;
        if let Some(link) = &item.link {
            text_element(&mut writer, "link", link)?;
        }
        text_element(&mut writer, "guid", &item.url)?;
        text_element(&mut writer, "pubDate", &item.published.to_rfc2822())?;
        let length = item.length.to_string();
        writer.write_event(Event::Empty(BytesStart::new("enclosure").with_attributes([
            ("url", item.url.as_str()),
            ("length", length.as_str()),
            ("type", item.mime.as_str()),
        ])))?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;
    Ok(String::from_utf8(writer.into_inner())?)
}

pub fn write_podcast(output_dir: &Path, base_url: &str, title: &str) -> Result<PathBuf> {
    let items = collect_items(output_dir, base_url)?;
    let feed = render_feed(title, base_url, &items)?;
    let path = output_dir.join(FEED_FILE);
    std::fs::write(&path, feed).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} ({} items)", path.display(), items.len());
    Ok(path)
}
