use std::{collections::HashSet, str::FromStr};

use anyhow::{Result, bail};
use tracing::{error, info, instrument, warn};

use crate::{
    config::YoutubeConfig,
    playlist::{PlaylistEntry, play_url, sanitize_title, write_playlist},
};

pub mod api;
pub mod structs;

/// Canonical channel IDs look like `UCxxxxxxxxxxxxxxxxxxxxxx`
const CHANNEL_ID_PREFIX: &str = "UC";
const CHANNEL_ID_MIN_LEN: usize = 20;

/// One token of the `YOUTUBE_CHANNELS` input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelReference {
    /// `@handle`, stored without the `@`
    Handle(String),
    Id(String),
}

impl FromStr for ChannelReference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(handle) = s.strip_prefix('@') {
            return Ok(Self::Handle(handle.to_string()));
        }
        if s.starts_with(CHANNEL_ID_PREFIX) && s.len() >= CHANNEL_ID_MIN_LEN {
            return Ok(Self::Id(s.to_string()));
        }

        bail!("Invalid channel handle / ID: {s}");
    }
}

/// Splits raw input on commas and newlines, dropping blank tokens
pub fn split_channel_input(raw: &str) -> Vec<&str> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolves handles and IDs into a deduplicated list of channel IDs, in first-seen order.
///
/// Invalid tokens and failed lookups are logged and skipped.
#[instrument(skip_all)]
pub async fn resolve_channels(
    client: &reqwest::Client,
    cfg: &YoutubeConfig,
    raw: &str,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut channel_ids = Vec::new();

    for token in split_channel_input(raw) {
        let channel_id = match token.parse::<ChannelReference>() {
            Ok(ChannelReference::Id(id)) => id,
            Ok(ChannelReference::Handle(handle)) => {
                match api::lookup_handle(client, cfg, &handle).await {
                    Ok(Some(id)) => {
                        info!("Resolved @{handle} -> {id}");
                        id
                    }
                    Ok(None) => {
                        warn!("Handle @{handle} not found");
                        continue;
                    }
                    Err(e) => {
                        error!("Unable to resolve @{handle}: {e:#}");
                        continue;
                    }
                }
            }
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };

        if seen.insert(channel_id.clone()) {
            channel_ids.push(channel_id);
        }
    }

    channel_ids
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Live,
    Vod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub id: String,
    /// Already sanitized
    pub title: String,
    pub category: Category,
}

impl ContentRecord {
    fn new(id: String, title: &str, category: Category) -> Self {
        Self {
            id,
            title: sanitize_title(title),
            category,
        }
    }
}

/// Gathers the live broadcast and, when configured, the latest uploads of one channel.
///
/// A failing step is logged; records gathered before it are kept.
#[instrument(skip(client, cfg))]
pub async fn fetch_channel_content(
    client: &reqwest::Client,
    cfg: &YoutubeConfig,
    channel_id: &str,
) -> Vec<ContentRecord> {
    let mut records = Vec::new();

    match api::find_live_stream(client, cfg, channel_id).await {
        Ok(Some(live)) => {
            info!("Live: {} ({})", live.snippet.title.trim(), live.id.video_id);
            records.push(ContentRecord::new(
                live.id.video_id,
                &live.snippet.title,
                Category::Live,
            ));
        }
        Ok(None) => {}
        Err(e) => error!("Live check failed for {channel_id}: {e:#}"),
    }

    if let Some(max_uploads) = cfg.max_uploads {
        match fetch_uploads(client, cfg, channel_id, max_uploads).await {
            Ok(uploads) => records.extend(uploads),
            Err(e) => error!("Upload listing failed for {channel_id}: {e:#}"),
        }
    }

    records
}

async fn fetch_uploads(
    client: &reqwest::Client,
    cfg: &YoutubeConfig,
    channel_id: &str,
    max_uploads: u32,
) -> Result<Vec<ContentRecord>> {
    let Some(uploads_id) = api::uploads_playlist_id(client, cfg, channel_id).await? else {
        warn!("Channel {channel_id} has no uploads playlist");
        return Ok(Vec::new());
    };

    let items = api::latest_playlist_items(client, cfg, &uploads_id, max_uploads).await?;
    Ok(items
        .into_iter()
        .take(max_uploads as usize)
        .map(|item| {
            ContentRecord::new(
                item.snippet.resource_id.video_id,
                &item.snippet.title,
                Category::Vod,
            )
        })
        .collect())
}

/// Turns records into playlist entries, in order
///
/// # Errors
/// Errors when the configured play base URL is invalid
pub fn to_playlist_entries(
    cfg: &YoutubeConfig,
    records: &[ContentRecord],
) -> Result<Vec<PlaylistEntry>> {
    records
        .iter()
        .map(|record| {
            let (tag, quality) = match record.category {
                Category::Live => ("[LIVE]", cfg.live_quality),
                Category::Vod => ("[VOD]", cfg.vod_quality),
            };
            let title = if cfg.tag_titles {
                format!("youtube {tag} {}", record.title)
            } else {
                record.title.clone()
            };

            Ok(PlaylistEntry::new(
                &title,
                play_url(&cfg.play_base, &record.id, quality)?,
            ))
        })
        .collect()
}

/// Resolves, fetches and writes one YouTube playlist
///
/// # Errors
/// Errors only when the playlist can't be written
#[instrument(skip_all, fields(output = %cfg.output.display()))]
pub async fn run(client: &reqwest::Client, cfg: &YoutubeConfig) -> Result<()> {
    info!("Input channels/handles: {:?}", split_channel_input(&cfg.channels));
    let channel_ids = resolve_channels(client, cfg, &cfg.channels).await;
    if channel_ids.is_empty() {
        warn!("No valid channels resolved");
    }

    let mut records = Vec::new();
    for channel_id in &channel_ids {
        records.extend(fetch_channel_content(client, cfg, channel_id).await);
    }

    let entries = to_playlist_entries(cfg, &records)?;
    write_playlist(&cfg.output, &entries, cfg.empty_note).await
}
