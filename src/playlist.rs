use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Url;
use tracing::{info, instrument};

pub const M3U_HEADER: &str = "#EXTM3U";

/// A single `#EXTINF` + URL pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub title: String,
    pub url: String,
}

impl PlaylistEntry {
    pub fn new(title: &str, url: impl Into<String>) -> Self {
        Self {
            title: sanitize_title(title),
            url: url.into(),
        }
    }
}

/// Makes a title safe for the line-oriented M3U format.
///
/// Control characters (newlines included), `,` and `|` become spaces and the result is trimmed.
/// Applying it twice yields the same string.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_control() || c == ',' || c == '|' {
                ' '
            } else {
                c
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Builds `<base>?id=<id>&quality=<quality>`
///
/// # Errors
/// Errors when `base` is not an absolute URL
pub fn play_url(base: &str, id: &str, quality: &str) -> Result<String> {
    let mut url = Url::parse(base).with_context(|| format!("Parsing play base URL {base}"))?;
    url.query_pairs_mut()
        .append_pair("id", id)
        .append_pair("quality", quality);

    Ok(url.into())
}

/// Renders the whole playlist text. An empty playlist still gets the header plus `empty_note`.
pub fn render_playlist(entries: &[PlaylistEntry], empty_note: &str) -> String {
    if entries.is_empty() {
        return format!("{M3U_HEADER}\n{empty_note}\n");
    }

    let mut out = String::from(M3U_HEADER);
    out.push('\n');
    for entry in entries {
        out.push_str("#EXTINF:-1,");
        out.push_str(&entry.title);
        out.push('\n');
        out.push_str(&entry.url);
        out.push('\n');
    }

    out
}

/// Renders and writes the playlist, overwriting whatever was at `path`
///
/// # Errors
/// Errors when the parent directory cannot be created or the file cannot be written
#[instrument(skip(entries, empty_note))]
pub async fn write_playlist(
    path: &Path,
    entries: &[PlaylistEntry],
    empty_note: &str,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Creating output directory {}", parent.display()))?;
    }

    tokio::fs::write(path, render_playlist(entries, empty_note))
        .await
        .with_context(|| format!("Writing playlist {}", path.display()))?;

    info!("Written {} entries to {}", entries.len(), path.display());
    Ok(())
}
