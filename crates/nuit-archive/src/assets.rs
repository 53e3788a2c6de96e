//! Theme propagation into the output directory.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

const BUILTIN_STYLESHEET: &str = include_str!("../theme/assets/style.css");
const THEME_SUBTREES: &[&str] = &["fonts", "assets"];

/// Copy the theme's `fonts/` and `assets/` into `output_dir`, or write the
/// built-in stylesheet when no theme is configured. Returns the number of
/// files written.
pub fn copy_assets(theme_dir: Option<&Path>, output_dir: &Path) -> Result<usize> {
    let Some(theme_dir) = theme_dir else {
        let target = output_dir.join("assets").join("style.css");
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, BUILTIN_STYLESHEET)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        return Ok(1);
    };

    let mut copied = 0;
    for subtree in THEME_SUBTREES {
        let source = theme_dir.join(subtree);
        if !source.is_dir() {
            debug!("theme has no {}/, skipping", subtree);
            continue;
        }
        copied += copy_tree(&source, &output_dir.join(subtree))?;
    }
    info!("Copied {} theme files from {}", copied, theme_dir.display());
    Ok(copied)
}

/// Recursively copy `source` into `destination`, overwriting existing files.
pub fn copy_tree(source: &Path, destination: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(source) {
        let entry = entry.with_context(|| format!("Failed to walk {}", source.display()))?;
        let relative = entry.path().strip_prefix(source)?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}
