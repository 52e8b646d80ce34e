//! Copies tagged files into trees keyed by metadata values

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::utils::sanitize_segment;

/// Top-level folder of the author-keyed tree
pub const AUTHOR_DIR: &str = "author";

/// Copies files into `<root>/<key>/<key>/.../<file name>`
#[derive(Debug, Clone)]
pub struct StructureReplicator {
    root: PathBuf,
    dry_run: bool,
}

impl StructureReplicator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
        }
    }

    /// Report copies without touching the filesystem
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a file lands in for the given key values
    pub fn destination_dir<S: AsRef<str>>(&self, keys: &[S]) -> PathBuf {
        keys.iter()
            .fold(self.root.clone(), |dir, key| dir.join(sanitize_segment(key.as_ref())))
    }

    /// Copy `source` into the tree keyed by `keys`, returning the new path
    ///
    /// Directories are created on demand. An existing file with the same name
    /// is replaced.
    pub fn replicate<S: AsRef<str>>(&self, source: &Path, keys: &[S]) -> Result<PathBuf> {
        let file_name = source.file_name().ok_or_else(|| {
            Error::InvalidInput(format!("{} has no file name", source.display()))
        })?;

        let dest_dir = self.destination_dir(keys);
        let dest = dest_dir.join(file_name);

        if self.dry_run {
            debug!("[dry run] {} -> {}", source.display(), dest.display());
            return Ok(dest);
        }

        let copy_error = |e: std::io::Error| Error::Replicate {
            from: source.to_path_buf(),
            to: dest.clone(),
            source: e,
        };

        // create_dir_all treats an existing directory as success
        fs::create_dir_all(&dest_dir).map_err(copy_error)?;

        if dest.exists() {
            if is_same_file(source, &dest) {
                debug!("{} is already in place", dest.display());
                return Ok(dest);
            }
            warn!(
                "Replacing existing {} with {}",
                dest.display(),
                source.display()
            );
        }

        fs::copy(source, &dest).map_err(copy_error)?;
        preserve_mtime(source, &dest);

        debug!("Copied {} -> {}", source.display(), dest.display());
        Ok(dest)
    }

    /// Run several independent replications; one failing doesn't stop the rest
    pub fn replicate_all(&self, source: &Path, targets: &[Vec<String>]) -> Vec<Result<PathBuf>> {
        targets
            .iter()
            .map(|keys| self.replicate(source, keys.as_slice()))
            .collect()
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

// Best effort, a copy with a fresh mtime is still a good copy
fn preserve_mtime(source: &Path, dest: &Path) {
    let modified = match fs::metadata(source).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => return,
    };
    if let Err(e) = File::options()
        .write(true)
        .open(dest)
        .and_then(|f| f.set_modified(modified))
    {
        debug!("Could not preserve mtime on {}: {}", dest.display(), e);
    }
}
