use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use rusty_ytdl::stream::Stream as _;
use rusty_ytdl::{Video, VideoError};
use thiserror::Error;

use super::models::{known_length, video_options};
use crate::domain::{MediaKind, VideoSummary};
use crate::utils::extract_video_id;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid YouTube URL or video ID: {0}")]
    InvalidUrl(String),

    #[error("YouTube request failed: {0}")]
    Video(#[from] VideoError),

    #[error("No playable {0} stream found")]
    NoStream(MediaKind),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Byte stream of a selected media track.
pub type ChunkStream = BoxStream<'static, Result<Bytes>>;

/// Thin wrapper over `rusty_ytdl` that speaks in this crate's types.
#[derive(Clone, Default)]
pub struct YoutubeClient;

impl YoutubeClient {
    pub fn new() -> Self {
        Self
    }

    /// Fetch the title of a video without touching its streams
    pub async fn resolve(&self, url: &str) -> Result<VideoSummary> {
        let video_id =
            extract_video_id(url).ok_or_else(|| ApiError::InvalidUrl(url.to_string()))?;

        // The library only understands a subset of URL forms, the bare ID always works
        let video = Video::new(&video_id)?;
        let info = video.get_basic_info().await?;

        tracing::debug!(%video_id, formats = info.formats.len(), "resolved video info");

        Ok(VideoSummary {
            video_id,
            title: info.video_details.title,
        })
    }

    /// Open the preferred stream for `kind` of an already resolved video
    /// Returns (total_size, stream)
    pub async fn open_stream(
        &self,
        video_id: &str,
        kind: MediaKind,
    ) -> Result<(Option<u64>, ChunkStream)> {
        let video = Video::new_with_options(video_id, video_options(kind))?;

        let source = video.stream().await.map_err(|e| match e {
            VideoError::FormatNotFound => ApiError::NoStream(kind),
            other => ApiError::Video(other),
        })?;

        let total_size = known_length(source.content_length());
        let chunks = stream::try_unfold(source, |source| async move {
            let next = source.chunk().await?;
            Ok::<_, ApiError>(next.map(|chunk| (chunk, source)))
        });

        Ok((total_size, chunks.boxed()))
    }
}
