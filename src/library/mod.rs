//! Operations on music already on disk

pub mod album_tags;
pub mod author_sort;
pub mod replicate;

pub use album_tags::update_album_tags;
pub use author_sort::sort_by_author;
pub use replicate::StructureReplicator;

use std::path::Path;

use crate::error::{Error, Result};

/// Case-insensitive `.mp3` check
pub fn is_mp3(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mp3"))
}

/// Reject paths that are not existing directories
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "'{}' is not a directory",
            path.display()
        )))
    }
}
