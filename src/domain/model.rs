use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What the user asked for: the full video or only its audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Video,
    Audio,
}

impl MediaKind {
    /// Extension of the final output file.
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// How a downloaded audio container becomes an `.mp3` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioConversion {
    /// Keep the bytes, only change the extension.
    Rename,
    /// Re-encode with ffmpeg.
    #[default]
    Transcode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub video_id: String,
    pub title: String,
    pub kind: MediaKind,
    pub output_dir: PathBuf,
}

impl DownloadJob {
    /// Hidden file the stream is written to before finalizing.
    pub fn part_path(&self) -> PathBuf {
        self.output_dir
            .join(format!(".{}.{}.part", self.video_id, self.kind))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Resolving,
    AwaitingFolder,
    Downloading,
    Transcoding,
    Completed,
    Failed,
}

impl DownloadPhase {
    /// True while a job owns the UI.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            DownloadPhase::Resolving
                | DownloadPhase::AwaitingFolder
                | DownloadPhase::Downloading
                | DownloadPhase::Transcoding
        )
    }
}
