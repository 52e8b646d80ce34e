//! Playlist URL parsing
//!
//! Streaming-service playlist links look like
//! `https://music.yandex.ru/users/<user_id>/playlists/<playlist_id>?utm_source=...`

use crate::error::{Error, Result};

/// Identifiers pulled out of a playlist link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRef {
    pub user_id: String,
    pub playlist_id: String,
}

/// Drop everything from the first `?` onward
pub fn strip_query(url: &str) -> &str {
    match url.find('?') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Trim user input and reject it if nothing is left
pub fn clean_input(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("link cannot be empty".to_string()));
    }
    Ok(trimmed)
}

/// Parse a pasted playlist link into its owner and playlist identifiers
///
/// The owner is the third-from-last path segment and the playlist id is the
/// last one. Identifier contents are not validated here; a bad id surfaces
/// as a fetch error.
pub fn parse_playlist_url(raw: &str) -> Result<PlaylistRef> {
    let url = strip_query(clean_input(raw)?);
    let url = url.trim_end_matches('/');

    let parts: Vec<&str> = url.split('/').collect();
    if parts.len() < 3 {
        return Err(Error::InvalidInput(format!(
            "'{}' does not look like a playlist link",
            raw.trim()
        )));
    }

    Ok(PlaylistRef {
        user_id: parts[parts.len() - 3].to_string(),
        playlist_id: parts[parts.len() - 1].to_string(),
    })
}
