//! Playlist sources: where track lists and audio come from

use async_trait::async_trait;
use std::path::Path;

pub mod playlist_url;

pub use playlist_url::parse_playlist_url;

/// Language sentinel for tracks that carry no language
pub const UNKNOWN_LANGUAGE: &str = "Unknown";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const UNKNOWN_GENRE: &str = "Unknown Genre";
pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Metadata for one track as reported by a source
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    /// Source-specific handle used to download the audio
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub album: String,
    pub genre: String,
    pub language: String,
    pub cover_url: Option<String>,
}

impl TrackInfo {
    /// Artists joined for display and for the artist tag
    pub fn artist(&self) -> String {
        if self.artists.is_empty() {
            UNKNOWN_ARTIST.to_string()
        } else {
            self.artists.join(", ")
        }
    }

    pub fn has_language(&self) -> bool {
        !self.language.is_empty() && self.language != UNKNOWN_LANGUAGE
    }
}

/// A fetched playlist
#[derive(Debug, Clone)]
pub struct Playlist {
    pub name: String,
    pub tracks: Vec<TrackInfo>,
}

/// Anything that can list a playlist and download its tracks
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Resolve a playlist reference (URL or id) into a track list
    async fn fetch_playlist(&self, reference: &str) -> crate::error::Result<Playlist>;

    /// Download one track as MP3 at the requested bitrate to `dest`
    async fn download_track(
        &self,
        track: &TrackInfo,
        dest: &Path,
        bitrate_kbps: u32,
    ) -> crate::error::Result<()>;
}
