use std::path::PathBuf;

use futures::{future::BoxFuture, stream::BoxStream, FutureExt, StreamExt};
use tokio::io::AsyncWriteExt;

use crate::{
    api::{client::ChunkStream, YoutubeClient},
    application::transcoder::Transcoder,
    domain::{AppError, AudioConversion, DownloadJob, MediaKind, VideoSummary},
    utils::{extract_video_id, unique_filename},
};

/// Pending open of a media stream: (total_size, chunks).
pub type StreamSource = BoxFuture<'static, crate::api::client::Result<(Option<u64>, ChunkStream)>>;

#[derive(Debug, Clone)]
pub enum DownloadEvent {
    Progress(f32),
    Transcoding,
    Completed(PathBuf),
    Failed(AppError),
}

#[derive(Clone)]
pub struct DownloadCoordinator {
    client: YoutubeClient,
    transcoder: Transcoder,
    conversion: AudioConversion,
}

impl DownloadCoordinator {
    pub fn new(client: YoutubeClient, transcoder: Transcoder, conversion: AudioConversion) -> Self {
        Self {
            client,
            transcoder,
            conversion,
        }
    }

    pub async fn prepare(&self, youtube_url: String) -> Result<VideoSummary, AppError> {
        let youtube_url = youtube_url.trim();
        if youtube_url.is_empty() {
            return Err(AppError::EmptyUrl);
        }
        extract_video_id(youtube_url).ok_or(AppError::InvalidInput)?;

        let summary = self
            .client
            .resolve(youtube_url)
            .await
            .map_err(|e| AppError::Api(e.to_string()))?;

        tracing::info!(video_id = %summary.video_id, title = %summary.title, "resolved video");
        Ok(summary)
    }

    pub async fn choose_output_dir(&self, start: Option<PathBuf>) -> Option<PathBuf> {
        let mut dialog = rfd::AsyncFileDialog::new().set_title("Select Download Directory");
        if let Some(dir) = start.filter(|dir| dir.is_dir()) {
            dialog = dialog.set_directory(dir);
        }

        dialog
            .pick_folder()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    pub fn download_stream(&self, job: DownloadJob) -> BoxStream<'static, DownloadEvent> {
        let client = self.client.clone();
        let (video_id, kind) = (job.video_id.clone(), job.kind);
        let source = async move { client.open_stream(&video_id, kind).await }.boxed();

        self.write_stream(job, source)
    }

    /// Write the chunks of `source` into the part file of `job`, then finalize it.
    /// Ends with exactly one `Completed` or `Failed`.
    pub fn write_stream(
        &self,
        job: DownloadJob,
        source: StreamSource,
    ) -> BoxStream<'static, DownloadEvent> {
        tracing::info!(video_id = %job.video_id, kind = %job.kind, dir = %job.output_dir.display(), "starting download");

        futures::stream::unfold(
            DownloadRuntimeState::Start {
                coordinator: self.clone(),
                job,
                source,
            },
            |state| async move {
                match state {
                    DownloadRuntimeState::Start {
                        coordinator,
                        job,
                        source,
                    } => {
                        let part = job.part_path();
                        let file = match tokio::fs::File::create(&part).await {
                            Ok(file) => file,
                            Err(e) => {
                                return Some(fail(
                                    AppError::Io(format!("Failed to create file: {}", e)),
                                    None,
                                )
                                .await);
                            }
                        };

                        match source.await {
                            Ok((total_size, stream)) => Some((
                                DownloadEvent::Progress(0.0),
                                DownloadRuntimeState::Downloading {
                                    coordinator,
                                    job,
                                    file,
                                    stream,
                                    downloaded: 0,
                                    total: total_size,
                                },
                            )),
                            Err(e) => {
                                drop(file);
                                Some(fail(AppError::Api(e.to_string()), Some(part)).await)
                            }
                        }
                    }
                    DownloadRuntimeState::Downloading {
                        coordinator,
                        job,
                        mut file,
                        mut stream,
                        mut downloaded,
                        total,
                    } => match stream.next().await {
                        Some(Ok(chunk)) => {
                            if let Err(e) = file.write_all(&chunk).await {
                                drop(file);
                                return Some(
                                    fail(
                                        AppError::Io(format!("Write error: {}", e)),
                                        Some(job.part_path()),
                                    )
                                    .await,
                                );
                            }

                            downloaded += chunk.len() as u64;

                            Some((
                                DownloadEvent::Progress(progress(downloaded, total)),
                                DownloadRuntimeState::Downloading {
                                    coordinator,
                                    job,
                                    file,
                                    stream,
                                    downloaded,
                                    total,
                                },
                            ))
                        }
                        Some(Err(e)) => {
                            drop(file);
                            Some(fail(AppError::Api(e.to_string()), Some(job.part_path())).await)
                        }
                        None => {
                            if let Err(e) = file.sync_all().await {
                                drop(file);
                                return Some(
                                    fail(
                                        AppError::Io(format!("Failed to sync file: {}", e)),
                                        Some(job.part_path()),
                                    )
                                    .await,
                                );
                            }
                            drop(file);

                            tracing::debug!(video_id = %job.video_id, bytes = downloaded, "stream finished");

                            if job.kind == MediaKind::Audio
                                && coordinator.conversion == AudioConversion::Transcode
                            {
                                Some((
                                    DownloadEvent::Transcoding,
                                    DownloadRuntimeState::Finalizing { coordinator, job },
                                ))
                            } else {
                                Some(coordinator.finalize(job).await)
                            }
                        }
                    },
                    DownloadRuntimeState::Finalizing { coordinator, job } => {
                        Some(coordinator.finalize(job).await)
                    }
                    DownloadRuntimeState::Finished => None,
                }
            },
        )
        .boxed()
    }

    /// Move the part file to its collision-free final name.
    async fn finalize(&self, job: DownloadJob) -> (DownloadEvent, DownloadRuntimeState) {
        let part = job.part_path();
        let filename = unique_filename(&job.output_dir, &job.title, job.kind.extension());
        let target = job.output_dir.join(&filename);

        let result = match job.kind {
            MediaKind::Video => tokio::fs::rename(&part, &target)
                .await
                .map_err(|e| AppError::Io(format!("Failed to rename file: {}", e))),
            MediaKind::Audio => {
                self.transcoder
                    .finalize_audio(self.conversion, &part, &target)
                    .await
            }
        };

        match result {
            Ok(()) => {
                tracing::info!(path = %target.display(), "download finished");
                (
                    DownloadEvent::Completed(target),
                    DownloadRuntimeState::Finished,
                )
            }
            Err(e) => fail(e, Some(part)).await,
        }
    }
}

/// Fraction downloaded, or 0 when the size is unknown.
fn progress(downloaded: u64, total: Option<u64>) -> f32 {
    match total {
        Some(total_size) if total_size > 0 => (downloaded as f32 / total_size as f32).min(1.0),
        _ => 0.0,
    }
}

/// Log `error`, remove the part file and end the stream.
async fn fail(error: AppError, part: Option<PathBuf>) -> (DownloadEvent, DownloadRuntimeState) {
    tracing::error!(error = %error, "download failed");

    if let Some(part) = part {
        if let Err(e) = tokio::fs::remove_file(&part).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %part.display(), error = %e, "failed to remove part file");
            }
        }
    }

    (DownloadEvent::Failed(error), DownloadRuntimeState::Finished)
}

enum DownloadRuntimeState {
    Start {
        coordinator: DownloadCoordinator,
        job: DownloadJob,
        source: StreamSource,
    },
    Downloading {
        coordinator: DownloadCoordinator,
        job: DownloadJob,
        file: tokio::fs::File,
        stream: ChunkStream,
        downloaded: u64,
        total: Option<u64>,
    },
    Finalizing {
        coordinator: DownloadCoordinator,
        job: DownloadJob,
    },
    Finished,
}
