use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{AudioConversion, MediaKind};

/// Points at an alternative config file.
pub const CONFIG_ENV: &str = "TUBE_GRAB_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No home directory to place the config file in")]
    NoProjectDirs,

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Mode selected when the window opens.
    pub default_kind: MediaKind,
    pub audio_conversion: AudioConversion,
    pub ffmpeg_path: PathBuf,
    /// libmp3lame VBR quality, 0 (best) to 9.
    pub mp3_quality: u8,
    pub remember_output_dir: bool,
    pub last_output_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_kind: MediaKind::Video,
            audio_conversion: AudioConversion::Transcode,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            mp3_quality: 2,
            remember_output_dir: true,
            last_output_dir: None,
        }
    }
}

/// Location of the config file, honouring `TUBE_GRAB_CONFIG`.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let proj = ProjectDirs::from("dev", "tube-grab", "tube-grab").ok_or(ConfigError::NoProjectDirs)?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Read the config at `path`, writing defaults first if it does not exist.
pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        let cfg = AppConfig::default();
        save(&cfg, path)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save(cfg: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let raw = toml::to_string_pretty(cfg)?;
    fs::write(path, raw).map_err(io_err)
}

/// Same as [`save`] without blocking the caller's thread.
pub async fn save_async(cfg: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let raw = toml::to_string_pretty(cfg)?;
    tokio::fs::write(path, raw).await.map_err(io_err)
}

/// Load the config, falling back to defaults on any error.
pub fn load_or_default() -> (AppConfig, Option<PathBuf>) {
    let path = match config_path() {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(error = %e, "config disabled, using defaults");
            return (AppConfig::default(), None);
        }
    };

    match load(&path) {
        Ok(cfg) => {
            tracing::info!(path = %path.display(), "loaded config");
            (cfg, Some(path))
        }
        Err(e) => {
            tracing::warn!(error = %e, "using default config");
            (AppConfig::default(), Some(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = load(&path).unwrap();

        assert_eq!(cfg, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_kind = \"audio\"\naudio_conversion = \"rename\"\n").unwrap();

        let cfg = load(&path).unwrap();

        assert_eq!(cfg.default_kind, MediaKind::Audio);
        assert_eq!(cfg.audio_conversion, AudioConversion::Rename);
        assert_eq!(cfg.mp3_quality, 2);
        assert_eq!(cfg.ffmpeg_path, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_save_then_load_keeps_last_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = AppConfig {
            last_output_dir: Some(PathBuf::from("/music")),
            ..AppConfig::default()
        };

        save(&cfg, &path).unwrap();

        assert_eq!(load(&path).unwrap(), cfg);
    }

    #[test]
    fn test_bad_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_kind = 12").unwrap();

        assert!(matches!(load(&path), Err(ConfigError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_save_async_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("config.toml");
        let cfg = AppConfig {
            audio_conversion: AudioConversion::Rename,
            ..AppConfig::default()
        };

        save_async(&cfg, &path).await.unwrap();

        assert_eq!(load(&path).unwrap(), cfg);
    }
}
