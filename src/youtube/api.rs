use anyhow::{Context, Result};
use tracing::instrument;

use crate::{
    config::YoutubeConfig,
    util::get_json,
    youtube::structs::{ChannelList, PlaylistItem, PlaylistItemList, SearchList, SearchResult},
};

/// Looks up a channel ID by its handle (without the leading `@`)
///
/// Returns `None` if no channel owns the handle
///
/// # Errors
/// Errors on network error, non-success status or malformed JSON
#[instrument(skip(client, cfg))]
pub async fn lookup_handle(
    client: &reqwest::Client,
    cfg: &YoutubeConfig,
    handle: &str,
) -> Result<Option<String>> {
    let list: ChannelList = get_json(
        client,
        format!("{}/channels", cfg.api_base),
        &[("part", "id"), ("forHandle", handle), ("key", &cfg.api_key)],
    )
    .await
    .context("Looking up channel handle")?;

    Ok(list.items.into_iter().next().map(|c| c.id))
}

/// Returns the channel's current live broadcast, if any
///
/// # Errors
/// Errors on network error, non-success status or malformed JSON
#[instrument(skip(client, cfg))]
pub async fn find_live_stream(
    client: &reqwest::Client,
    cfg: &YoutubeConfig,
    channel_id: &str,
) -> Result<Option<SearchResult>> {
    let list: SearchList = get_json(
        client,
        format!("{}/search", cfg.api_base),
        &[
            ("part", "snippet"),
            ("channelId", channel_id),
            ("eventType", "live"),
            ("type", "video"),
            ("key", &cfg.api_key),
            ("maxResults", "1"),
        ],
    )
    .await
    .context("Searching live broadcasts")?;

    Ok(list.items.into_iter().next())
}

/// Resolves the ID of the channel's "uploads" playlist
///
/// Returns `None` if the channel doesn't exist
///
/// # Errors
/// Errors on network error, non-success status or malformed JSON
#[instrument(skip(client, cfg))]
pub async fn uploads_playlist_id(
    client: &reqwest::Client,
    cfg: &YoutubeConfig,
    channel_id: &str,
) -> Result<Option<String>> {
    let list: ChannelList = get_json(
        client,
        format!("{}/channels", cfg.api_base),
        &[
            ("part", "contentDetails"),
            ("id", channel_id),
            ("key", &cfg.api_key),
        ],
    )
    .await
    .context("Fetching channel content details")?;

    let Some(channel) = list.items.into_iter().next() else {
        return Ok(None);
    };
    let details = channel
        .content_details
        .context("Channel has no contentDetails")?;

    Ok(Some(details.related_playlists.uploads))
}

/// Fetches up to `max_results` of the most recent items in a playlist
///
/// # Errors
/// Errors on network error, non-success status or malformed JSON
#[instrument(skip(client, cfg))]
pub async fn latest_playlist_items(
    client: &reqwest::Client,
    cfg: &YoutubeConfig,
    playlist_id: &str,
    max_results: u32,
) -> Result<Vec<PlaylistItem>> {
    let max_results = max_results.to_string();
    let list: PlaylistItemList = get_json(
        client,
        format!("{}/playlistItems", cfg.api_base),
        &[
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", &max_results),
            ("order", "date"),
            ("key", &cfg.api_key),
        ],
    )
    .await
    .context("Fetching playlist items")?;

    Ok(list.items)
}
