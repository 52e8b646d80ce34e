//! Yandex Music API HTTP client

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use super::auth::{authorization_header, direct_link, CLIENT_NAME};
use super::models::*;
use crate::error::Error;
use crate::source::{parse_playlist_url, Playlist as SourcePlaylist, PlaylistSource, TrackInfo};

const API_BASE: &str = "https://api.music.yandex.net";

/// Authenticated handle to the Yandex Music API
///
/// Built once per run from an OAuth token and passed to every fetch and
/// download call.
#[derive(Clone)]
pub struct YandexMusicClient {
    base_url: String,
    token: String,
    cover_size: String,
    http_client: Client,
}

impl YandexMusicClient {
    /// Create a new client
    pub fn new(token: &str, cover_size: &str) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("tunesort/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: API_BASE.to_string(),
            token: token.to_string(),
            cover_size: cover_size.to_string(),
            http_client,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Unwrap the `result` envelope or turn the `error` block into an error
    fn unwrap_response<T>(response: ApiResponse<T>, what: &str) -> Result<T> {
        if let Some(error) = response.error {
            anyhow::bail!(
                "Yandex Music error '{}': {}",
                error.name,
                error.message.unwrap_or_default()
            );
        }
        response
            .result
            .ok_or_else(|| anyhow::anyhow!("{} not found", what))
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, what: &str) -> Result<T> {
        let url = self.url(endpoint);
        debug!("Fetching {}: {}", what, url);

        let response: ApiResponse<T> = self
            .http_client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, authorization_header(&self.token))
            .header("X-Yandex-Music-Client", CLIENT_NAME)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", what))?
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", what))?;

        Self::unwrap_response(response, what)
    }

    /// Check the token by asking for the account status
    pub async fn account_status(&self) -> Result<AccountStatus> {
        self.get("account/status", "account status").await
    }

    /// Get a user's playlist by owner and kind
    pub async fn users_playlist(&self, user_id: &str, kind: &str) -> Result<Playlist> {
        let endpoint = format!("users/{}/playlists/{}", user_id, kind);
        let playlist: Playlist = self.get(&endpoint, "playlist").await?;
        debug!("Playlist '{}' has {} entries", playlist.title, playlist.tracks.len());
        Ok(playlist)
    }

    /// Fetch full track objects for a list of `<track>[:<album>]` ids
    pub async fn tracks(&self, track_ids: &[String]) -> Result<Vec<Track>> {
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.url("tracks");
        debug!("Fetching {} tracks", track_ids.len());

        let response: ApiResponse<Vec<Track>> = self
            .http_client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, authorization_header(&self.token))
            .header("X-Yandex-Music-Client", CLIENT_NAME)
            .form(&[("track-ids", track_ids.join(",")), ("with-positions", "true".to_string())])
            .send()
            .await
            .context("Failed to fetch tracks")?
            .json()
            .await
            .context("Failed to parse tracks response")?;

        Self::unwrap_response(response, "tracks")
    }

    /// List the available encodings of a track
    pub async fn download_info(&self, track_id: &str) -> Result<Vec<DownloadInfo>> {
        let endpoint = format!("tracks/{}/download-info", track_id);
        self.get(&endpoint, "download info").await
    }

    /// Resolve a download-info entry into a signed direct link
    pub async fn direct_link(&self, info: &DownloadInfo) -> Result<String> {
        debug!("Resolving direct link: {}", info.download_info_url);

        let body = self
            .http_client
            .get(&info.download_info_url)
            .header(reqwest::header::AUTHORIZATION, authorization_header(&self.token))
            .send()
            .await
            .context("Failed to fetch download info document")?
            .error_for_status()
            .context("Download info document unavailable")?
            .text()
            .await
            .context("Failed to read download info document")?;

        let link_info: DirectLinkInfo =
            quick_xml::de::from_str(&body).context("Failed to parse download info document")?;

        Ok(direct_link(&link_info))
    }

    /// Download a track's MP3 bytes at the given bitrate
    pub async fn download(&self, track_id: &str, bitrate_kbps: u32) -> Result<bytes::Bytes> {
        let variants = self.download_info(track_id).await?;
        let info = variants
            .iter()
            .find(|v| v.codec == "mp3" && v.bitrate_in_kbps == bitrate_kbps)
            .ok_or_else(|| {
                let offered: Vec<String> = variants
                    .iter()
                    .map(|v| format!("{}@{}", v.codec, v.bitrate_in_kbps))
                    .collect();
                anyhow::anyhow!(
                    "No mp3 variant at {} kbps (available: {})",
                    bitrate_kbps,
                    offered.join(", ")
                )
            })?;

        let link = self.direct_link(info).await?;
        debug!("Downloading track {}: {}", track_id, link);

        self.http_client
            .get(&link)
            .send()
            .await
            .context("Failed to download track")?
            .error_for_status()
            .context("Track download rejected")?
            .bytes()
            .await
            .context("Failed to read track download")
    }

    /// Fill in full track objects for entries the playlist did not inline
    async fn resolve_tracks(&self, entries: Vec<TrackShort>) -> Result<Vec<TrackInfo>> {
        let missing: Vec<String> = entries
            .iter()
            .filter(|e| e.track.is_none())
            .map(TrackShort::track_id)
            .collect();

        let mut fetched: HashMap<String, Track> = self
            .tracks(&missing)
            .await?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        let mut tracks = Vec::with_capacity(entries.len());
        for entry in entries {
            let track = match entry.track {
                Some(track) => track,
                None => match fetched.remove(&entry.id) {
                    Some(track) => track,
                    None => {
                        warn!("Track {} is not available, skipping", entry.track_id());
                        continue;
                    }
                },
            };
            tracks.push(track.into_track_info(&self.cover_size));
        }
        Ok(tracks)
    }
}

#[async_trait]
impl PlaylistSource for YandexMusicClient {
    fn name(&self) -> &'static str {
        "yandex-music"
    }

    async fn fetch_playlist(&self, reference: &str) -> crate::error::Result<SourcePlaylist> {
        let playlist_ref = parse_playlist_url(reference)?;

        let playlist = self
            .users_playlist(&playlist_ref.user_id, &playlist_ref.playlist_id)
            .await
            .map_err(Error::Fetch)?;

        let tracks = self
            .resolve_tracks(playlist.tracks)
            .await
            .map_err(Error::Fetch)?;

        Ok(SourcePlaylist {
            name: playlist.title,
            tracks,
        })
    }

    async fn download_track(
        &self,
        track: &TrackInfo,
        dest: &Path,
        bitrate_kbps: u32,
    ) -> crate::error::Result<()> {
        let download_error = |source: anyhow::Error| Error::Download {
            track: format!("{} - {}", track.artist(), track.title),
            source,
        };

        let data = self
            .download(&track.id, bitrate_kbps)
            .await
            .map_err(download_error)?;

        tokio::fs::write(dest, &data)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))
            .map_err(download_error)?;

        debug!("Wrote {} bytes to {}", data.len(), dest.display());
        Ok(())
    }
}
