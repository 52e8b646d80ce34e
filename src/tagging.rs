//! ID3 tag reading and writing

use id3::frame::{Picture, PictureType};
use id3::{ErrorKind, Tag, TagLike, Version};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// Frame id for the language field
const LANGUAGE_FRAME: &str = "TLAN";

/// Descriptive fields written to a downloaded track
#[derive(Debug, Clone)]
pub struct TrackTags<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub album: &'a str,
    pub genre: &'a str,
    pub language: Option<&'a str>,
}

fn tag_error(path: &Path, source: id3::Error) -> Error {
    Error::Tag {
        path: path.to_path_buf(),
        source,
    }
}

/// Read the tag container, or start an empty one if the file has none
pub fn open_or_create(path: &Path) -> Result<Tag> {
    match Tag::read_from_path(path) {
        Ok(tag) => Ok(tag),
        Err(id3::Error {
            kind: ErrorKind::NoTag,
            ..
        }) => {
            debug!("No ID3 tag in {}, creating one", path.display());
            Ok(Tag::new())
        }
        Err(e) => Err(tag_error(path, e)),
    }
}

fn save(tag: &Tag, path: &Path) -> Result<()> {
    tag.write_to_path(path, Version::Id3v24)
        .map_err(|e| tag_error(path, e))
}

/// Overwrite title, artist, album, genre and language; embed `cover` as the
/// front cover when given
pub fn write_track_tags(path: &Path, fields: &TrackTags<'_>, cover: Option<Vec<u8>>) -> Result<()> {
    let mut tag = open_or_create(path)?;

    tag.set_title(fields.title);
    tag.set_artist(fields.artist);
    tag.set_album(fields.album);
    tag.set_genre(fields.genre);
    if let Some(language) = fields.language {
        tag.set_text(LANGUAGE_FRAME, language);
    }

    if let Some(data) = cover {
        tag.remove_picture_by_type(PictureType::CoverFront);
        tag.add_frame(Picture {
            mime_type: "image/jpeg".to_string(),
            picture_type: PictureType::CoverFront,
            description: "Cover".to_string(),
            data,
        });
    }

    save(&tag, path)?;
    debug!("Tagged {}", path.display());
    Ok(())
}

/// Set only the album field, creating a tag container if needed
pub fn set_album(path: &Path, album: &str) -> Result<()> {
    let mut tag = open_or_create(path)?;
    tag.set_album(album);
    save(&tag, path)
}

/// First artist value, if the file is tagged with one
pub fn read_artist(path: &Path) -> Result<Option<String>> {
    let tag = match Tag::read_from_path(path) {
        Ok(tag) => tag,
        Err(id3::Error {
            kind: ErrorKind::NoTag,
            ..
        }) => return Ok(None),
        Err(e) => return Err(tag_error(path, e)),
    };

    // ID3v2.4 separates multiple values with NUL
    Ok(tag
        .artist()
        .and_then(|a| a.split('\0').next())
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string))
}
