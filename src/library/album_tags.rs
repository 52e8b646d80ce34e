//! Bulk album tagger: album = name of the folder a file sits in

use std::fs;
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

use super::{ensure_dir, is_mp3};
use crate::error::Result;
use crate::tagging;

/// Outcome of an album tagging pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AlbumTagReport {
    pub updated: usize,
    pub failed: usize,
}

/// Name of the directory containing `path`
///
/// Falls back to the canonical path when the parent is something like `.`.
pub fn containing_folder_name(path: &Path) -> Option<String> {
    let parent = path.parent()?;
    let name = match parent.file_name() {
        Some(name) => name.to_os_string(),
        None => fs::canonicalize(parent).ok()?.file_name()?.to_os_string(),
    };
    Some(name.to_string_lossy().into_owned())
}

/// Walk `root` and set every MP3's album tag to its folder name
pub fn update_album_tags(root: &Path, dry_run: bool) -> Result<AlbumTagReport> {
    ensure_dir(root)?;

    let mut report = AlbumTagReport::default();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_mp3(entry.path()) {
            continue;
        }

        let path = entry.path();
        let Some(album) = containing_folder_name(path) else {
            warn!("Cannot determine folder name for {}", path.display());
            report.failed += 1;
            continue;
        };

        if dry_run {
            info!("[dry run] {} -> album '{}'", path.display(), album);
            report.updated += 1;
            continue;
        }

        match tagging::set_album(path, &album) {
            Ok(()) => {
                info!("Updated {} -> album '{}'", path.display(), album);
                report.updated += 1;
            }
            Err(e) => {
                warn!("{}", e.report());
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
