use std::path::PathBuf;

use iced::Task;

use crate::api::YoutubeClient;
use crate::application::{DownloadCoordinator, DownloadEvent, Transcoder};
use crate::config::{self, AppConfig};
use crate::domain::{AppError, DownloadJob, DownloadPhase, VideoSummary};
use crate::ui::{DownloadMessage, DownloadView};

pub struct DownloadApp {
    view: DownloadView,
    coordinator: DownloadCoordinator,
    config: AppConfig,
    config_path: Option<PathBuf>,
    // Resolved video, kept until the job ends
    pending: Option<VideoSummary>,
}

impl DownloadApp {
    pub fn new(config: AppConfig, config_path: Option<PathBuf>) -> Self {
        let coordinator = DownloadCoordinator::new(
            YoutubeClient::new(),
            Transcoder::new(config.ffmpeg_path.clone(), config.mp3_quality),
            config.audio_conversion,
        );

        Self {
            view: DownloadView::new(config.default_kind),
            coordinator,
            config,
            config_path,
            pending: None,
        }
    }

    fn finish(&mut self, phase: DownloadPhase, status: String) {
        self.view.phase = phase;
        self.view.download_progress = 0.0;
        self.pending = None;
        self.view.set_status(status);
    }

    /// Record `dir` as the next dialog start and persist it in the background.
    fn remember_output_dir(&mut self, dir: PathBuf) -> Task<Message> {
        if !self.config.remember_output_dir || self.config.last_output_dir.as_ref() == Some(&dir) {
            return Task::none();
        }
        self.config.last_output_dir = Some(dir);

        match &self.config_path {
            Some(path) => {
                let (cfg, path) = (self.config.clone(), path.clone());
                Task::perform(
                    async move { config::save_async(&cfg, &path).await.map_err(|e| e.to_string()) },
                    Message::ConfigSaved,
                )
            }
            None => Task::none(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    VideoResolved(Result<VideoSummary, AppError>),
    FolderSelected(Option<PathBuf>),
    Download(DownloadEvent),
    ConfigSaved(Result<(), String>),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            if app.view.is_busy() {
                return Task::none();
            }
            app.view.update(ui_msg.clone());

            if let DownloadMessage::DownloadPressed = ui_msg {
                let url = app.view.youtube_url.trim().to_string();
                if url.is_empty() {
                    app.view.set_status(AppError::EmptyUrl.to_string());
                    return Task::none();
                }

                app.view.phase = DownloadPhase::Resolving;
                app.view.set_status("Fetching video info...");

                let coordinator = app.coordinator.clone();
                // Step 1: Resolve title
                return Task::perform(
                    async move { coordinator.prepare(url).await },
                    Message::VideoResolved,
                );
            }
        }
        Message::VideoResolved(result) => match result {
            Ok(summary) => {
                app.view.phase = DownloadPhase::AwaitingFolder;
                app.view.set_status(format!("Downloading {}...", summary.title));
                app.pending = Some(summary);

                // Step 2: Ask where to save
                let coordinator = app.coordinator.clone();
                let start = app.config.last_output_dir.clone();
                return Task::perform(
                    async move { coordinator.choose_output_dir(start).await },
                    Message::FolderSelected,
                );
            }
            Err(e) => app.finish(DownloadPhase::Failed, format!("Error - {}", e)),
        },
        Message::FolderSelected(dir) => match (dir, app.pending.clone()) {
            (Some(output_dir), Some(summary)) => {
                app.view.phase = DownloadPhase::Downloading;

                let job = DownloadJob {
                    video_id: summary.video_id.clone(),
                    title: summary.title.clone(),
                    kind: app.view.kind,
                    output_dir: output_dir.clone(),
                };
                let save = app.remember_output_dir(output_dir);

                // Step 3: Stream to disk, then finalize
                return Task::batch([
                    Task::run(app.coordinator.download_stream(job), Message::Download),
                    save,
                ]);
            }
            _ => {
                tracing::info!("download cancelled");
                app.finish(DownloadPhase::Idle, "Download cancelled".to_string());
            }
        },
        Message::Download(event) => {
            let title = app
                .pending
                .as_ref()
                .map(|summary| summary.title.clone())
                .unwrap_or_default();

            match event {
                DownloadEvent::Progress(progress) => {
                    app.view.download_progress = progress;
                    app.view
                        .set_status(format!("Downloading {} ({:.1}%)", title, progress * 100.0));
                }
                DownloadEvent::Transcoding => {
                    app.view.phase = DownloadPhase::Transcoding;
                    app.view.set_status(format!("Converting {} to MP3...", title));
                }
                DownloadEvent::Completed(path) => {
                    let name = path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    app.finish(
                        DownloadPhase::Completed,
                        format!("{} downloaded successfully", name),
                    );
                }
                DownloadEvent::Failed(e) => {
                    app.finish(DownloadPhase::Failed, format!("Error - {}", e));
                }
            }
        }
        Message::ConfigSaved(result) => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "failed to persist output directory");
            }
        }
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}
