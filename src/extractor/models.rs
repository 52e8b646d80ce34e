//! yt-dlp JSON output models
//!
//! Only the fields used for tagging are modelled; everything else is ignored.

use serde::Deserialize;

use crate::source::{TrackInfo, UNKNOWN_ALBUM, UNKNOWN_GENRE, UNKNOWN_LANGUAGE, UNKNOWN_TITLE};

/// Top-level document from `--dump-single-json`
///
/// Playlists carry `entries`; a single video has its fields at the top level.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorInfo {
    #[serde(flatten)]
    pub entry: ExtractorEntry,
    pub entries: Option<Vec<Option<ExtractorEntry>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractorEntry {
    pub title: Option<String>,
    pub track: Option<String>,
    pub artist: Option<String>,
    pub artists: Option<Vec<String>>,
    pub uploader: Option<String>,
    pub channel: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub genres: Option<Vec<String>>,
    pub language: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    pub webpage_url: Option<String>,
    pub original_url: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ExtractorEntry {
    /// URL to hand back to yt-dlp when downloading this entry
    pub fn download_url(&self) -> Option<String> {
        non_empty(self.webpage_url.clone())
            .or_else(|| non_empty(self.original_url.clone()))
            .or_else(|| non_empty(self.url.clone()))
    }

    /// Best-effort conversion into a track descriptor
    ///
    /// Returns `None` when the entry has no downloadable URL.
    pub fn into_track_info(self) -> Option<TrackInfo> {
        let id = self.download_url()?;

        let artists = match self.artists.filter(|a| !a.is_empty()) {
            Some(artists) => artists,
            None => non_empty(self.artist)
                .or_else(|| non_empty(self.uploader))
                .or_else(|| non_empty(self.channel))
                .into_iter()
                .collect(),
        };

        let genre = non_empty(self.genre)
            .or_else(|| self.genres.and_then(|g| g.into_iter().next()))
            .unwrap_or_else(|| UNKNOWN_GENRE.to_string());

        let cover_url = non_empty(self.thumbnail)
            .or_else(|| self.thumbnails.into_iter().last().map(|t| t.url));

        Some(TrackInfo {
            id,
            title: non_empty(self.track)
                .or_else(|| non_empty(self.title))
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            artists,
            album: non_empty(self.album).unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            genre,
            language: non_empty(self.language).unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
            cover_url,
        })
    }
}
