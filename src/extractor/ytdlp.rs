//! Playlist source backed by the `yt-dlp` command-line extractor

use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

use super::models::{ExtractorEntry, ExtractorInfo};
use crate::error::{Error, Result};
use crate::source::playlist_url::clean_input;
use crate::source::{Playlist, PlaylistSource, TrackInfo};

/// Fallback name when the extractor reports no title
const DEFAULT_PLAYLIST_NAME: &str = "Playlist";

/// Wrapper around a yt-dlp binary
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: String,
}

impl YtDlp {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }

    fn fetch_args(reference: &str) -> Vec<String> {
        vec![
            "--dump-single-json".to_string(),
            "--flat-playlist".to_string(),
            "--no-warnings".to_string(),
            reference.to_string(),
        ]
    }

    fn download_args(url: &str, dest: &Path, bitrate_kbps: u32) -> Vec<String> {
        vec![
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            "mp3".to_string(),
            "--audio-quality".to_string(),
            format!("{}K", bitrate_kbps),
            "--no-playlist".to_string(),
            "--force-overwrites".to_string(),
            "--no-warnings".to_string(),
            "--output".to_string(),
            output_template(dest).to_string_lossy().into_owned(),
            url.to_string(),
        ]
    }

    /// Turn the extractor's JSON document into a playlist
    fn parse_playlist(json: &[u8]) -> anyhow::Result<Playlist> {
        let info: ExtractorInfo =
            serde_json::from_slice(json).context("Failed to parse yt-dlp output")?;

        let name = info
            .entry
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PLAYLIST_NAME.to_string());

        let entries: Vec<ExtractorEntry> = match info.entries {
            Some(entries) => entries.into_iter().flatten().collect(),
            None => vec![info.entry],
        };

        let mut tracks: Vec<TrackInfo> = Vec::with_capacity(entries.len());
        for entry in entries {
            let label = entry.title.clone().unwrap_or_else(|| "<untitled>".to_string());
            match entry.into_track_info() {
                Some(track) => tracks.push(track),
                None => warn!("Entry '{}' has no downloadable URL, skipping", label),
            }
        }

        Ok(Playlist { name, tracks })
    }
}

/// yt-dlp picks the extension itself; `%(ext)s` resolves to `mp3` after conversion
fn output_template(dest: &Path) -> PathBuf {
    let mut template = dest.with_extension("").into_os_string();
    template.push(".%(ext)s");
    PathBuf::from(template)
}

#[async_trait]
impl PlaylistSource for YtDlp {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch_playlist(&self, reference: &str) -> Result<Playlist> {
        let reference = clean_input(reference)?;
        debug!("Extracting playlist with {}: {}", self.binary, reference);

        let output = Command::new(&self.binary)
            .args(Self::fetch_args(reference))
            .output()
            .await
            .with_context(|| format!("Failed to run '{}' (is it installed?)", self.binary))
            .map_err(Error::Fetch)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Fetch(anyhow::anyhow!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        Self::parse_playlist(&output.stdout).map_err(Error::Fetch)
    }

    async fn download_track(&self, track: &TrackInfo, dest: &Path, bitrate_kbps: u32) -> Result<()> {
        let download_error = |source: anyhow::Error| Error::Download {
            track: format!("{} - {}", track.artist(), track.title),
            source,
        };

        debug!("Downloading {} to {}", track.id, dest.display());
        let output = Command::new(&self.binary)
            .args(Self::download_args(&track.id, dest, bitrate_kbps))
            .output()
            .await
            .with_context(|| format!("Failed to run '{}'", self.binary))
            .map_err(download_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(download_error(anyhow::anyhow!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        if !dest.exists() {
            return Err(download_error(anyhow::anyhow!(
                "{} reported success but {} was not created",
                self.binary,
                dest.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_template() {
        let template = output_template(Path::new("Road Trip/Band - First.mp3"));
        assert_eq!(template, PathBuf::from("Road Trip/Band - First.%(ext)s"));
    }

    #[test]
    fn test_download_args_request_mp3_bitrate() {
        let args = YtDlp::download_args("https://example.com/v", Path::new("out/A - B.mp3"), 320);
        let pos = args.iter().position(|a| a == "--audio-quality").unwrap();
        assert_eq!(args[pos + 1], "320K");
        let pos = args.iter().position(|a| a == "--audio-format").unwrap();
        assert_eq!(args[pos + 1], "mp3");
        assert_eq!(args.last().unwrap(), "https://example.com/v");
    }

    #[test]
    fn test_parse_playlist_single_video() {
        let json = br#"{"id": "x", "title": "Solo", "webpage_url": "https://example.com/x"}"#;
        let playlist = YtDlp::parse_playlist(json).unwrap();
        assert_eq!(playlist.name, "Solo");
        assert_eq!(playlist.tracks.len(), 1);
        assert_eq!(playlist.tracks[0].id, "https://example.com/x");
    }

    #[test]
    fn test_parse_playlist_untitled() {
        let json = br#"{"entries": [{"title": "One", "url": "https://example.com/1"}]}"#;
        let playlist = YtDlp::parse_playlist(json).unwrap();
        assert_eq!(playlist.name, DEFAULT_PLAYLIST_NAME);
        assert_eq!(playlist.tracks.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_binary_is_fetch_error() {
        let ytdlp = YtDlp::new("/nonexistent/yt-dlp-binary");
        let err = ytdlp.fetch_playlist("https://example.com/list").await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_empty_reference_is_invalid_input() {
        let ytdlp = YtDlp::new("yt-dlp");
        let err = ytdlp.fetch_playlist("  ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
