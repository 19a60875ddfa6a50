use rusty_ytdl::{VideoOptions, VideoQuality, VideoSearchOptions};

use crate::domain::MediaKind;

/// Stream selection for `kind`.
///
/// Video: best progressive stream carrying picture and sound.
/// Audio: best audio-only stream.
pub fn video_options(kind: MediaKind) -> VideoOptions {
    match kind {
        MediaKind::Video => VideoOptions {
            quality: VideoQuality::Highest,
            filter: VideoSearchOptions::VideoAudio,
            ..Default::default()
        },
        MediaKind::Audio => VideoOptions {
            quality: VideoQuality::HighestAudio,
            filter: VideoSearchOptions::Audio,
            ..Default::default()
        },
    }
}

/// Interpret the content length reported by the library.
///
/// Zero means the size is not known up front.
pub fn known_length(reported: usize) -> Option<u64> {
    match reported {
        0 => None,
        n => Some(n as u64),
    }
}
