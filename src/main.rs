#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![warn(clippy::perf)]
#![warn(clippy::complexity)]
#![warn(clippy::style)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::{BasketballConfig, YoutubeConfig};
use reqwest::header::HeaderMap;
use tracing::info;
use util::init_http_client;

pub mod basketball;
pub mod config;
pub mod playlist;
pub mod util;
pub mod youtube;

#[cfg(test)]
mod testing;

/// Polls YouTube / basketball streaming APIs and writes M3U playlists
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    pipeline: Pipeline,
}

#[derive(Subcommand, Debug)]
enum Pipeline {
    /// Currently-live streams of the channels in `YOUTUBE_CHANNELS`
    Live {
        /// Where to write the playlist [default: IPTV/yut.m3u]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Live stream plus latest uploads of the channels in `YOUTUBE_CHANNELS`
    Channels {
        /// Where to write the playlist [default: IPTV/河南yut.m3u]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Amount of recent uploads listed per channel
        #[arg(
            short,
            long,
            default_value_t = config::DEFAULT_MAX_UPLOADS,
            value_parser = clap::value_parser!(u32).range(0..=i64::from(config::MAX_UPLOADS_LIMIT))
        )]
        max_videos: u32,
    },

    /// Today's basketball matches
    Basketball {
        /// Where to write the playlist [default: IPTV/basketball.m3u]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let args = Args::parse();

    match args.pipeline {
        Pipeline::Live { output } => {
            let mut cfg = YoutubeConfig::from_env(YoutubeConfig::live_only)?;
            if let Some(output) = output {
                cfg.output = output;
            }
            youtube::run(&init_http_client(HeaderMap::new())?, &cfg).await?;
        }
        Pipeline::Channels { output, max_videos } => {
            let mut cfg = YoutubeConfig::from_env(YoutubeConfig::channel_feed)?;
            cfg.max_uploads = Some(max_videos);
            if let Some(output) = output {
                cfg.output = output;
            }
            youtube::run(&init_http_client(HeaderMap::new())?, &cfg).await?;
        }
        Pipeline::Basketball { output } => {
            let mut cfg = BasketballConfig::default();
            if let Some(output) = output {
                cfg.output = output;
            }
            basketball::run(&init_http_client(BasketballConfig::headers())?, &cfg).await?;
        }
    }

    info!("All done successfully!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_videos_is_bounded() {
        let args = Args::try_parse_from(["m3u-squirrel", "channels", "--max-videos", "50"]).unwrap();
        assert!(matches!(args.pipeline, Pipeline::Channels { max_videos: 50, .. }));

        assert!(Args::try_parse_from(["m3u-squirrel", "channels", "--max-videos", "51"]).is_err());

        let args = Args::try_parse_from(["m3u-squirrel", "channels"]).unwrap();
        assert!(matches!(
            args.pipeline,
            Pipeline::Channels { max_videos: config::DEFAULT_MAX_UPLOADS, .. }
        ));
    }
}
