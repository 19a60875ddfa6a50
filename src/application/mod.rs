pub mod download_coordinator;
pub mod transcoder;

pub use download_coordinator::{DownloadCoordinator, DownloadEvent};
pub use transcoder::Transcoder;
