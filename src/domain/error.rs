use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Please enter a URL")]
    EmptyUrl,

    #[error("Invalid YouTube URL or video ID")]
    InvalidInput,

    #[error("{0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Transcoding failed: {0}")]
    Transcode(String),
}
