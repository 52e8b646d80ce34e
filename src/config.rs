//! User settings persistence
//!
//! Stored in ~/.config/tunesort/config.json. Missing keys fall back to
//! defaults, so an empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::pipeline::PipelineOptions;

const CONFIG_DIR: &str = "tunesort";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root for playlist folders and replicated trees
    pub output_root: PathBuf,
    /// Requested audio bitrate
    pub bitrate_kbps: u32,
    /// Replaces `%%` in streaming-service cover URIs
    pub cover_size: String,
    /// yt-dlp executable name or path
    pub yt_dlp_path: String,
    pub replicate_language_genre: bool,
    pub replicate_genre: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            bitrate_kbps: 320,
            cover_size: "200x200".to_string(),
            yt_dlp_path: "yt-dlp".to_string(),
            replicate_language_genre: true,
            replicate_genre: true,
        }
    }
}

impl Settings {
    /// Load settings from the user config directory
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load settings from a specific file; a missing file means defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let settings: Self = serde_json::from_str(&contents).map_err(|e| {
            Error::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to the user config directory
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()
            .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize settings: {}", e)))?;
        fs::write(path, contents)?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Pipeline options derived from these settings
    pub fn pipeline_options(&self, replicate: bool) -> PipelineOptions {
        PipelineOptions {
            output_root: self.output_root.clone(),
            bitrate_kbps: self.bitrate_kbps,
            replicate_language_genre: replicate && self.replicate_language_genre,
            replicate_genre: replicate && self.replicate_genre,
        }
    }
}
