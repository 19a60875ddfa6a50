use iced::{
    widget::{button, column, progress_bar, radio, row, text, text_input, Space},
    Element, Length,
};

use crate::domain::{DownloadPhase, MediaKind};

/// Main view state
pub struct DownloadView {
    pub youtube_url: String,
    pub kind: MediaKind,
    pub status_message: String,
    pub phase: DownloadPhase,
    pub download_progress: f32,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self::new(MediaKind::default())
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    KindSelected(MediaKind),
    DownloadPressed,
}

impl DownloadView {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            youtube_url: String::new(),
            kind,
            status_message: "Status: Waiting".to_string(),
            phase: DownloadPhase::Idle,
            download_progress: 0.0,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    pub fn set_status(&mut self, message: impl AsRef<str>) {
        self.status_message = format!("Status: {}", message.as_ref());
    }

    pub fn update(&mut self, message: DownloadMessage) {
        if self.is_busy() {
            return;
        }

        match message {
            DownloadMessage::UrlChanged(url) => {
                self.youtube_url = url;
            }
            DownloadMessage::KindSelected(kind) => {
                self.kind = kind;
            }
            DownloadMessage::DownloadPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let idle = !self.is_busy();

        let modes = row![
            radio(
                "Video",
                MediaKind::Video,
                Some(self.kind),
                DownloadMessage::KindSelected
            ),
            radio(
                "Audio (MP3)",
                MediaKind::Audio,
                Some(self.kind),
                DownloadMessage::KindSelected
            ),
        ]
        .spacing(20);

        // Radios have no disabled state, `update` ignores them while busy.
        column![
            text("YouTube Downloader").size(32),
            Space::new().height(Length::Fixed(20.0)),
            text("YouTube URL:").size(16),
            text_input("https://www.youtube.com/watch?v=...", &self.youtube_url)
                .on_input_maybe(idle.then_some(DownloadMessage::UrlChanged))
                .on_submit_maybe(idle.then_some(DownloadMessage::DownloadPressed))
                .padding(10),
            modes,
            Space::new().height(Length::Fixed(10.0)),
            button("Download")
                .on_press_maybe(idle.then_some(DownloadMessage::DownloadPressed))
                .padding([10, 20]),
            progress_bar(0.0..=1.0, self.download_progress),
            text(&self.status_message).size(14),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}
