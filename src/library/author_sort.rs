//! Author sorter: copies tagged MP3s into `author/<artist>/`

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

use super::replicate::{StructureReplicator, AUTHOR_DIR};
use super::{ensure_dir, is_mp3};
use crate::error::Result;
use crate::tagging;

/// Outcome of an author sorting pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuthorSortReport {
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
}

fn is_within(entry: &DirEntry, tree: Option<&PathBuf>) -> bool {
    let Some(tree) = tree else {
        return false;
    };
    entry.file_type().is_dir()
        && fs::canonicalize(entry.path()).is_ok_and(|p| p.starts_with(tree))
}

/// Collect MP3s under `base`, leaving out the sorter's own output tree
fn collect_mp3s(base: &Path, output_tree: &Path) -> Vec<PathBuf> {
    let output_tree = fs::canonicalize(output_tree).ok();

    WalkDir::new(base)
        .into_iter()
        .filter_entry(|e| !is_within(e, output_tree.as_ref()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_mp3(e.path()))
        .map(DirEntry::into_path)
        .collect()
}

/// Copy every MP3 under `base` that has an artist tag into the author tree
pub fn sort_by_author(base: &Path, replicator: &StructureReplicator) -> Result<AuthorSortReport> {
    ensure_dir(base)?;

    let files = collect_mp3s(base, &replicator.root().join(AUTHOR_DIR));
    let mut report = AuthorSortReport::default();

    for path in files {
        let artist = match tagging::read_artist(&path) {
            Ok(Some(artist)) => artist,
            Ok(None) => {
                warn!("Skipping {}: no artist tag", path.display());
                report.skipped += 1;
                continue;
            }
            Err(e) => {
                warn!("{}", e.report());
                report.failed += 1;
                continue;
            }
        };

        match replicator.replicate(&path, &[AUTHOR_DIR, artist.as_str()]) {
            Ok(dest) => {
                info!("Copied to author tree: {}", dest.display());
                report.copied += 1;
            }
            Err(e) => {
                warn!("{}", e.report());
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
