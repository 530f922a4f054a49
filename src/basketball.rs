use std::{fmt, sync::LazyLock};

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::{
    config::BasketballConfig,
    playlist::{PlaylistEntry, write_playlist},
    util::get_json,
};

/// The stream ID sits between `live/` and the following `.`
static STREAM_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"live/(.*?)\.").unwrap());

/// IDs come back as numbers or strings depending on the endpoint mood
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LooseId {
    Number(i64),
    Text(String),
}

impl fmt::Display for LooseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchRecord {
    #[serde(rename = "type")]
    pub kind: LooseId,
    pub tournament_id: LooseId,
    pub member_id: LooseId,
    #[serde(rename = "home_team_zh", default)]
    pub home_team: String,
    #[serde(rename = "away_team_zh", default)]
    pub away_team: String,
    #[serde(rename = "league_name_zh", default)]
    pub league_name: String,
}

impl MatchRecord {
    pub fn display_name(&self) -> String {
        format!("{} {} VS {}", self.league_name, self.home_team, self.away_team)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct MatchPage {
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct MatchDetail {
    detail: StreamDetail,
}

#[derive(Debug, Deserialize)]
struct StreamDetail {
    url: String,
}

/// Fetches today's basketball matches. Entries that don't decode are logged and dropped.
///
/// # Errors
/// Errors on network error, non-success status or a malformed envelope
#[instrument(skip_all)]
pub async fn list_matches(
    client: &reqwest::Client,
    cfg: &BasketballConfig,
) -> Result<Vec<MatchRecord>> {
    let page: Envelope<MatchPage> = get_json(client, &cfg.list_url, &[])
        .await
        .context("Fetching match list")?;

    Ok(page
        .data
        .data
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<MatchRecord>(raw) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!("Skipping malformed match entry: {e}");
                None
            }
        })
        .collect())
}

/// Fetches the raw (token-less) stream URL of a match
///
/// # Errors
/// Errors on network error, non-success status or when the detail has no URL
#[instrument(skip(client, cfg), fields(tournament_id = %record.tournament_id))]
pub async fn fetch_raw_stream_url(
    client: &reqwest::Client,
    cfg: &BasketballConfig,
    record: &MatchRecord,
) -> Result<String> {
    let member_id = record.member_id.to_string();
    let detail: Envelope<MatchDetail> = get_json(
        client,
        format!("{}/{}/detail/{}", cfg.detail_base, record.kind, record.tournament_id),
        &[("member_id", &member_id)],
    )
    .await
    .context("Fetching match detail")?;

    Ok(detail.data.detail.url)
}

pub fn extract_stream_id(raw_url: &str) -> Option<&str> {
    STREAM_ID_REGEX
        .captures(raw_url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Builds the playback token the site's player computes client-side.
///
/// The payload is base64'd and then both `+` and `/` are mapped to `-`. That mapping is lossy
/// (a decoder can't tell them apart) but it is what the playback endpoint expects.
pub fn generate_token(stream_id: &str, now: DateTime<Utc>, ttl_secs: i64) -> String {
    let end_time = now.timestamp() + ttl_secs;
    let payload = format!(r#"{{"stream_id":"{stream_id}","end_time":{end_time}}}"#);

    STANDARD.encode(payload).replace(['+', '/'], "-")
}

/// Resolves the final playable URL of a match, `None` when it has no stream yet
///
/// # Errors
/// Errors when the detail lookup fails
pub async fn resolve_play_url(
    client: &reqwest::Client,
    cfg: &BasketballConfig,
    record: &MatchRecord,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    let raw_url = fetch_raw_stream_url(client, cfg, record).await?;
    let Some(stream_id) = extract_stream_id(&raw_url) else {
        return Ok(None);
    };

    let token = generate_token(stream_id, now, cfg.token_ttl_secs);
    Ok(Some(format!("{raw_url}&token={token}")))
}

/// Lists matches, resolves each stream and writes the playlist
///
/// # Errors
/// Errors only when the playlist can't be written
#[instrument(skip_all, fields(output = %cfg.output.display()))]
pub async fn run(client: &reqwest::Client, cfg: &BasketballConfig) -> Result<()> {
    info!("Collecting basketball streams");
    let matches = list_matches(client, cfg).await.unwrap_or_else(|e| {
        error!("Unable to fetch match list: {e:#}");
        Vec::new()
    });
    info!("Found {} basketball matches", matches.len());

    let mut entries = Vec::new();
    for record in &matches {
        let name = record.display_name();
        match resolve_play_url(client, cfg, record, Utc::now()).await {
            Ok(Some(url)) => {
                info!("Stream found: {name}");
                entries.push(PlaylistEntry::new(&name, url));
            }
            Ok(None) => warn!("{name}: no stream available"),
            Err(e) => error!("{name}: {e:#}"),
        }
    }

    write_playlist(&cfg.output, &entries, cfg.empty_note).await
}
