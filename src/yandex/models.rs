//! Yandex Music API response models

use serde::{Deserialize, Deserializer};

use crate::source::{
    TrackInfo, UNKNOWN_ALBUM, UNKNOWN_GENRE, UNKNOWN_LANGUAGE, UNKNOWN_TITLE,
};

/// Wrapper for all API responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub name: String,
    pub message: Option<String>,
}

// Account status (used to verify a token)
#[derive(Debug, Clone, Deserialize)]
pub struct AccountStatus {
    pub account: Account,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub uid: Option<u64>,
    pub login: Option<String>,
}

/// A user's playlist with its track list
#[derive(Debug, Clone, Deserialize)]
pub struct Playlist {
    pub title: String,
    #[serde(default)]
    pub tracks: Vec<TrackShort>,
}

/// Playlist entry; `track` is only present when the server inlines it
#[derive(Debug, Clone, Deserialize)]
pub struct TrackShort {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "albumId", default, deserialize_with = "opt_string_or_number")]
    pub album_id: Option<String>,
    pub track: Option<Track>,
}

impl TrackShort {
    /// `<track>:<album>` form accepted by the tracks endpoint
    pub fn track_id(&self) -> String {
        match &self.album_id {
            Some(album) => format!("{}:{}", self.id, album),
            None => self.id.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub albums: Vec<AlbumRef>,
    #[serde(rename = "coverUri")]
    pub cover_uri: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumRef {
    pub title: Option<String>,
    pub genre: Option<String>,
}

impl Track {
    /// Convert into a source-agnostic descriptor
    ///
    /// `cover_size` replaces the `%%` placeholder in the cover URI, e.g. `200x200`.
    pub fn into_track_info(self, cover_size: &str) -> TrackInfo {
        let first_album = self.albums.first();
        let album = first_album
            .and_then(|a| a.title.clone())
            .unwrap_or_else(|| UNKNOWN_ALBUM.to_string());
        let genre = first_album
            .and_then(|a| a.genre.clone())
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| UNKNOWN_GENRE.to_string());

        TrackInfo {
            id: self.id,
            title: self.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            artists: self.artists.into_iter().map(|a| a.name).collect(),
            album,
            genre,
            language: self
                .language
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
            cover_url: self.cover_uri.map(|uri| uri.replace("%%", cover_size)),
        }
    }
}

/// One downloadable variant of a track
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadInfo {
    pub codec: String,
    #[serde(rename = "bitrateInKbps")]
    pub bitrate_in_kbps: u32,
    #[serde(rename = "downloadInfoUrl")]
    pub download_info_url: String,
}

/// XML document behind `downloadInfoUrl`
#[derive(Debug, Clone, Deserialize)]
pub struct DirectLinkInfo {
    pub host: String,
    pub path: String,
    pub ts: String,
    pub s: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(u64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

// Ids come back as strings from some endpoints and numbers from others
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_playlist_with_mixed_ids() {
        let json = r#"{
            "result": {
                "title": "Mood: Αγάπη",
                "kind": 1003,
                "trackCount": 2,
                "tracks": [
                    {"id": 123, "albumId": 456, "timestamp": "2024-01-01T00:00:00+00:00"},
                    {"id": "789", "track": {
                        "id": "789",
                        "title": "Song",
                        "artists": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
                        "albums": [{"id": 9, "title": "Record", "genre": "pop"}],
                        "coverUri": "avatars.yandex.net/get-music-content/abc/%%"
                    }}
                ]
            }
        }"#;

        let response: ApiResponse<Playlist> = serde_json::from_str(json).unwrap();
        let playlist = response.result.unwrap();
        assert_eq!(playlist.title, "Mood: Αγάπη");
        assert_eq!(playlist.tracks.len(), 2);
        assert_eq!(playlist.tracks[0].track_id(), "123:456");
        assert!(playlist.tracks[0].track.is_none());
        assert_eq!(playlist.tracks[1].track_id(), "789");
    }

    #[test]
    fn test_into_track_info() {
        let json = r#"{
            "id": 789,
            "title": "Song",
            "artists": [{"name": "A"}, {"name": "B"}],
            "albums": [{"title": "Record", "genre": "pop"}],
            "coverUri": "avatars.yandex.net/get-music-content/abc/%%"
        }"#;
        let track: Track = serde_json::from_str(json).unwrap();
        let info = track.into_track_info("200x200");

        assert_eq!(info.id, "789");
        assert_eq!(info.artist(), "A, B");
        assert_eq!(info.album, "Record");
        assert_eq!(info.genre, "pop");
        assert_eq!(info.language, UNKNOWN_LANGUAGE);
        assert_eq!(
            info.cover_url.as_deref(),
            Some("avatars.yandex.net/get-music-content/abc/200x200")
        );
    }

    #[test]
    fn test_into_track_info_defaults() {
        let track: Track = serde_json::from_str(r#"{"id": "1"}"#).unwrap();
        let info = track.into_track_info("200x200");
        assert_eq!(info.title, UNKNOWN_TITLE);
        assert_eq!(info.album, UNKNOWN_ALBUM);
        assert_eq!(info.genre, UNKNOWN_GENRE);
        assert!(info.cover_url.is_none());
    }

    #[test]
    fn test_parse_error_response() {
        let json = r#"{"error": {"name": "not-found", "message": "Playlist not found"}}"#;
        let response: ApiResponse<Playlist> = serde_json::from_str(json).unwrap();
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().name, "not-found");
    }

    #[test]
    fn test_parse_download_info_list() {
        let json = r#"{"result": [
            {"codec": "aac", "bitrateInKbps": 192, "downloadInfoUrl": "https://x/1", "direct": false, "gain": false},
            {"codec": "mp3", "bitrateInKbps": 320, "downloadInfoUrl": "https://x/2", "direct": false, "preview": false}
        ]}"#;
        let response: ApiResponse<Vec<DownloadInfo>> = serde_json::from_str(json).unwrap();
        let infos = response.result.unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[1].codec, "mp3");
        assert_eq!(infos[1].bitrate_in_kbps, 320);
        assert_eq!(infos[1].download_info_url, "https://x/2");
    }

    #[test]
    fn test_parse_download_info_xml() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<download-info><host>s1.storage.yandex.net</host><path>/rmusic/U2FsdGVk/abc</path><ts>0005f1</ts><region>-1</region><s>deadbeef</s></download-info>"#;
        let info: DirectLinkInfo = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(info.host, "s1.storage.yandex.net");
        assert_eq!(info.path, "/rmusic/U2FsdGVk/abc");
        assert_eq!(info.ts, "0005f1");
        assert_eq!(info.s, "deadbeef");
    }
}
