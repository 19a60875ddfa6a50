use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::domain::{AppError, AudioConversion};

/// Drives the external `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct Transcoder {
    ffmpeg: PathBuf,
    quality: u8,
}

impl Transcoder {
    /// `quality` is the libmp3lame VBR level, clamped to 0..=9.
    pub fn new(ffmpeg: impl Into<PathBuf>, quality: u8) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            quality: quality.min(9),
        }
    }

    fn mp3_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        args.extend(["-hide_banner", "-loglevel", "error", "-y", "-i"].map(OsString::from));
        args.push(input.into());
        args.extend(["-vn", "-codec:a", "libmp3lame", "-q:a"].map(OsString::from));
        args.push(self.quality.to_string().into());
        args.push(output.into());
        args
    }

    /// Decode `input` and encode it as MP3 into `output`.
    pub async fn to_mp3(&self, input: &Path, output: &Path) -> Result<(), AppError> {
        let result = Command::new(&self.ffmpeg)
            .args(self.mp3_args(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output_log = match result {
            Ok(out) => out,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::Transcode(format!(
                    "{} not found, install ffmpeg or set ffmpeg_path",
                    self.ffmpeg.display()
                )));
            }
            Err(e) => {
                return Err(AppError::Transcode(format!(
                    "Failed to start {}: {}",
                    self.ffmpeg.display(),
                    e
                )));
            }
        };

        if !output_log.status.success() {
            let stderr = String::from_utf8_lossy(&output_log.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no diagnostics")
                .trim()
                .to_string();
            return Err(AppError::Transcode(format!(
                "ffmpeg exited with {}: {}",
                output_log.status, reason
            )));
        }

        Ok(())
    }

    /// Turn a downloaded audio container into `output` using `conversion`.
    ///
    /// Encoding goes to a hidden sibling of `output`, so a failed run never
    /// leaves a truncated file under the final name.
    pub async fn finalize_audio(
        &self,
        conversion: AudioConversion,
        input: &Path,
        output: &Path,
    ) -> Result<(), AppError> {
        match conversion {
            AudioConversion::Rename => tokio::fs::rename(input, output)
                .await
                .map_err(|e| AppError::Io(format!("Failed to rename file: {}", e))),
            AudioConversion::Transcode => {
                let encoding = encoding_path(output);

                if let Err(e) = self.to_mp3(input, &encoding).await {
                    remove_if_present(&encoding).await;
                    return Err(e);
                }

                if let Err(e) = tokio::fs::rename(&encoding, output).await {
                    remove_if_present(&encoding).await;
                    return Err(AppError::Io(format!("Failed to rename file: {}", e)));
                }

                remove_if_present(input).await;
                Ok(())
            }
        }
    }
}

/// Hidden file ffmpeg writes to; keeps the `.mp3` extension so the muxer is inferred.
fn encoding_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".{}.encoding.mp3", name))
}

async fn remove_if_present(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove file");
        }
    }
}

/// Shell script standing in for ffmpeg: writes its last argument, prints
/// `decode error` to stderr and exits with `code`.
#[cfg(all(test, unix))]
pub(crate) fn fake_ffmpeg(dir: &Path, code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(format!("fake-ffmpeg-{}", code));
    let script = format!(
        "#!/bin/sh\nfor last in \"$@\"; do :; done\nprintf 'ID3 encoded' > \"$last\"\necho 'decode error' >&2\nexit {}\n",
        code
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_is_clamped() {
        let transcoder = Transcoder::new("ffmpeg", 42);
        let args = transcoder.mp3_args(Path::new("in.webm"), Path::new("out.mp3"));
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            [
                "-hide_banner", "-loglevel", "error", "-y", "-i", "in.webm", "-vn", "-codec:a",
                "libmp3lame", "-q:a", "9", "out.mp3"
            ]
        );
    }

    #[tokio::test]
    async fn test_rename_keeps_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join(".abc.audio.part");
        let output = dir.path().join("song.mp3");
        tokio::fs::write(&input, b"opus bytes").await.unwrap();

        Transcoder::new("ffmpeg", 2)
            .finalize_audio(AudioConversion::Rename, &input, &output)
            .await
            .unwrap();

        assert!(!input.exists());
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"opus bytes");
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.webm");
        tokio::fs::write(&input, b"x").await.unwrap();

        let err = Transcoder::new(dir.path().join("no-such-ffmpeg"), 2)
            .finalize_audio(
                AudioConversion::Transcode,
                &input,
                &dir.path().join("out.mp3"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Transcode(msg) if msg.contains("not found")));
        assert!(input.exists());
    }

    #[test]
    fn test_encoding_path_is_hidden_sibling() {
        assert_eq!(
            encoding_path(Path::new("/music/Song.mp3")),
            PathBuf::from("/music/.Song.mp3.encoding.mp3")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_transcode_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join(".abc.audio.part");
        let output = dir.path().join("Song.mp3");
        tokio::fs::write(&input, b"webm").await.unwrap();

        let err = Transcoder::new(fake_ffmpeg(dir.path(), 1), 2)
            .finalize_audio(AudioConversion::Transcode, &input, &output)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Transcode(msg) if msg.contains("decode error")));
        assert!(!output.exists());
        assert!(!encoding_path(&output).exists());
        assert_eq!(
            crate::utils::unique_filename(dir.path(), "Song", "mp3"),
            "Song.mp3"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_transcode_replaces_source() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join(".abc.audio.part");
        let output = dir.path().join("Song.mp3");
        tokio::fs::write(&input, b"webm").await.unwrap();

        Transcoder::new(fake_ffmpeg(dir.path(), 0), 2)
            .finalize_audio(AudioConversion::Transcode, &input, &output)
            .await
            .unwrap();

        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"ID3 encoded");
        assert!(!input.exists());
        assert!(!encoding_path(&output).exists());
    }
}
