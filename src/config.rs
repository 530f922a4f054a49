use std::path::PathBuf;

use anyhow::{Result, bail};
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER, USER_AGENT,
};

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const PLAY_BASE_URL: &str = "http://ncncha.cloudns.ch:9977/play";
pub const DEFAULT_MAX_UPLOADS: u32 = 6;
/// `playlistItems` rejects `maxResults` above this
pub const MAX_UPLOADS_LIMIT: u32 = 50;

pub const BASKETBALL_LIST_URL: &str = "https://m.360ba.co/api/web/live_lists/3?&supplement=0";
pub const BASKETBALL_DETAIL_BASE: &str = "https://www.360ba.co/api/web/live_lists";
pub const BASKETBALL_TOKEN_TTL_SECS: i64 = 30;

const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 12; Redmi K30) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.104 Mobile Safari/537.36";

/// Settings for both YouTube pipelines.
///
/// `live_only` and `channel_feed` build the two variants; `from_env` fills in the
/// credentials and channel list.
#[derive(Debug, Clone)]
pub struct YoutubeConfig {
    pub api_key: String,
    /// Comma- or newline-separated handles / channel IDs
    pub channels: String,
    pub api_base: String,
    pub play_base: String,
    pub live_quality: &'static str,
    pub vod_quality: &'static str,
    /// Prefix titles with `youtube [LIVE]` / `youtube [VOD]`
    pub tag_titles: bool,
    /// `None` skips the uploads listing entirely
    pub max_uploads: Option<u32>,
    pub output: PathBuf,
    pub empty_note: &'static str,
}

impl YoutubeConfig {
    /// Currently-live streams only
    pub fn live_only(api_key: String, channels: String) -> Self {
        Self {
            api_key,
            channels,
            api_base: YOUTUBE_API_BASE.to_string(),
            play_base: PLAY_BASE_URL.to_string(),
            live_quality: "720p",
            vod_quality: "720p",
            tag_titles: false,
            max_uploads: None,
            output: PathBuf::from("IPTV/yut.m3u"),
            empty_note: "# No live streams available",
        }
    }

    /// Live stream plus the most recent uploads of each channel
    pub fn channel_feed(api_key: String, channels: String) -> Self {
        Self {
            api_key,
            channels,
            api_base: YOUTUBE_API_BASE.to_string(),
            play_base: PLAY_BASE_URL.to_string(),
            live_quality: "360p",
            vod_quality: "720p",
            tag_titles: true,
            max_uploads: Some(DEFAULT_MAX_UPLOADS),
            output: PathBuf::from("IPTV/河南yut.m3u"),
            empty_note: "# No content available",
        }
    }

    /// Reads `YOUTUBE_API_KEY` and `YOUTUBE_CHANNELS` and hands them to `build`
    ///
    /// # Errors
    /// Errors when either variable is missing or blank
    pub fn from_env(build: fn(String, String) -> Self) -> Result<Self> {
        let api_key = std::env::var("YOUTUBE_API_KEY").unwrap_or_default();
        let channels = std::env::var("YOUTUBE_CHANNELS").unwrap_or_default();
        Self::from_values(build, api_key, channels)
    }

    fn from_values(
        build: fn(String, String) -> Self,
        api_key: String,
        channels: String,
    ) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            bail!("YOUTUBE_API_KEY is not set");
        }
        let channels = channels.trim();
        if channels.is_empty() {
            bail!("YOUTUBE_CHANNELS is empty");
        }

        Ok(build(api_key.to_string(), channels.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct BasketballConfig {
    pub list_url: String,
    pub detail_base: String,
    pub token_ttl_secs: i64,
    pub output: PathBuf,
    pub empty_note: &'static str,
}

impl Default for BasketballConfig {
    fn default() -> Self {
        Self {
            list_url: BASKETBALL_LIST_URL.to_string(),
            detail_base: BASKETBALL_DETAIL_BASE.to_string(),
            token_ttl_secs: BASKETBALL_TOKEN_TTL_SECS,
            output: PathBuf::from("IPTV/basketball.m3u"),
            empty_note: "# No matches available",
        }
    }
}

impl BasketballConfig {
    /// Headers the site's own mobile frontend sends
    pub fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(MOBILE_USER_AGENT));
        headers.insert(REFERER, HeaderValue::from_static("https://m.360ba.co/"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://m.360ba.co"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-site"),
            HeaderValue::from_static("same-origin"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-mode"),
            HeaderValue::from_static("cors"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-dest"),
            HeaderValue::from_static("empty"),
        );
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_fatal() {
        let err = YoutubeConfig::from_values(
            YoutubeConfig::live_only,
            String::new(),
            "@someone".into(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "YOUTUBE_API_KEY is not set");
    }

    #[test]
    fn blank_channels_are_fatal() {
        let err = YoutubeConfig::from_values(
            YoutubeConfig::channel_feed,
            "key".into(),
            " \n ".into(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "YOUTUBE_CHANNELS is empty");
    }

    #[test]
    fn variants_differ_in_quality_and_uploads() {
        let cfg = YoutubeConfig::from_values(
            YoutubeConfig::channel_feed,
            " key ".into(),
            "@a,@b\n".into(),
        )
        .unwrap();
        assert_eq!(cfg.api_key, "key");
        assert_eq!(cfg.channels, "@a,@b");
        assert_eq!(cfg.live_quality, "360p");
        assert_eq!(cfg.max_uploads, Some(6));

        let live = YoutubeConfig::live_only("key".into(), "@a".into());
        assert_eq!(live.live_quality, "720p");
        assert_eq!(live.max_uploads, None);
        assert!(!live.tag_titles);
    }
}
