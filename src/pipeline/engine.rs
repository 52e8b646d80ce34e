//! Download pipeline: fetch, download, tag, replicate

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::library::StructureReplicator;
use crate::source::{PlaylistSource, TrackInfo};
use crate::tagging::{self, TrackTags};
use crate::utils::cover_art::CoverFetcher;
use crate::utils::{progress_log, sanitize_segment, track_file_name};

/// Knobs for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Root of the playlist folder and of every replication tree
    pub output_root: PathBuf,
    pub bitrate_kbps: u32,
    /// Copy into `<root>/<language>/<genre>/`
    pub replicate_language_genre: bool,
    /// Copy into `<root>/<genre>/`
    pub replicate_genre: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            bitrate_kbps: 320,
            replicate_language_genre: true,
            replicate_genre: true,
        }
    }
}

/// Result of a pipeline run
#[derive(Debug, Default)]
pub struct PipelineResult {
    pub playlist_name: String,
    pub playlist_dir: PathBuf,
    pub tracks_total: usize,
    pub tracks_downloaded: usize,
    pub tracks_tagged: usize,
    pub tracks_failed: usize,
    pub copies_made: usize,
}

/// What happened to a single downloaded track
#[derive(Debug, Default)]
struct TrackOutcome {
    tagged: bool,
    copies: usize,
}

/// Runs a playlist through download, tagging and replication, one track at a time
pub struct DownloadPipeline<'a> {
    source: &'a dyn PlaylistSource,
    covers: Option<CoverFetcher>,
    replicator: StructureReplicator,
    options: PipelineOptions,
}

impl<'a> DownloadPipeline<'a> {
    /// Create a pipeline; without a cover fetcher, covers are skipped
    pub fn new(
        source: &'a dyn PlaylistSource,
        covers: Option<CoverFetcher>,
        options: PipelineOptions,
    ) -> Self {
        let replicator = StructureReplicator::new(options.output_root.clone());
        Self {
            source,
            covers,
            replicator,
            options,
        }
    }

    /// Replication targets for a track, as lists of key values
    fn replication_targets(&self, track: &TrackInfo) -> Vec<Vec<String>> {
        let mut targets = Vec::new();
        if self.options.replicate_language_genre {
            targets.push(vec![track.language.clone(), track.genre.clone()]);
        }
        if self.options.replicate_genre {
            targets.push(vec![track.genre.clone()]);
        }
        targets
    }

    /// Fetch the playlist and process every track
    ///
    /// A failed fetch, an unusable playlist folder, or a fatal error from a
    /// track aborts the run. Recoverable track errors are logged and the next
    /// track is processed.
    pub async fn run(&self, reference: &str) -> Result<PipelineResult> {
        let playlist = self.source.fetch_playlist(reference).await?;
        info!("Playlist: {}", playlist.name);
        info!("Found {} tracks", playlist.tracks.len());

        let playlist_dir = self
            .options
            .output_root
            .join(sanitize_segment(&playlist.name));
        tokio::fs::create_dir_all(&playlist_dir).await?;

        let mut result = PipelineResult {
            playlist_name: playlist.name.clone(),
            playlist_dir: playlist_dir.clone(),
            tracks_total: playlist.tracks.len(),
            ..Default::default()
        };

        let progress = ProgressBar::new(playlist.tracks.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        let _log_guard = progress_log::activate(&progress);

        for track in &playlist.tracks {
            progress.set_message(format!("{} - {}", track.artist(), track.title));

            match self.process_track(track, &playlist_dir).await {
                Ok(outcome) => {
                    result.tracks_downloaded += 1;
                    if outcome.tagged {
                        result.tracks_tagged += 1;
                    }
                    result.copies_made += outcome.copies;
                }
                Err(e) if e.is_fatal() => {
                    progress.abandon_with_message("Aborted");
                    return Err(e);
                }
                Err(e) => {
                    warn!("{}", e.report());
                    result.tracks_failed += 1;
                }
            }
            progress.inc(1);
        }

        progress.finish_with_message("Downloads complete");
        Ok(result)
    }

    /// Download, tag, and replicate one track
    ///
    /// Only a download failure is returned as an error. Tagging and copy
    /// failures are logged and reflected in the outcome.
    async fn process_track(&self, track: &TrackInfo, playlist_dir: &Path) -> Result<TrackOutcome> {
        let file_path = playlist_dir.join(track_file_name(&track.artist(), &track.title));
        if file_path.exists() {
            info!("Track already exists, overwriting: {}", file_path.display());
        }

        self.source
            .download_track(track, &file_path, self.options.bitrate_kbps)
            .await?;
        info!("Downloaded: {}", track.title);

        let mut outcome = TrackOutcome {
            tagged: self.tag_track(track, &file_path).await,
            copies: 0,
        };

        for copy in self
            .replicator
            .replicate_all(&file_path, &self.replication_targets(track))
        {
            match copy {
                Ok(dest) => {
                    debug!("Copied to {}", dest.display());
                    outcome.copies += 1;
                }
                Err(e) => warn!("{}", e.report()),
            }
        }

        Ok(outcome)
    }

    /// Write metadata and cover; returns whether the tag was saved
    async fn tag_track(&self, track: &TrackInfo, file_path: &Path) -> bool {
        let cover = match (&track.cover_url, &self.covers) {
            (Some(url), Some(fetcher)) => match fetcher.fetch(url).await {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!("{}", e.report());
                    None
                }
            },
            _ => None,
        };
        let has_cover = cover.is_some();

        let artist = track.artist();
        let fields = TrackTags {
            title: &track.title,
            artist: &artist,
            album: &track.album,
            genre: &track.genre,
            language: track.has_language().then_some(track.language.as_str()),
        };

        match tagging::write_track_tags(file_path, &fields, cover) {
            Ok(()) => {
                if has_cover {
                    debug!("Embedded cover art in {}", file_path.display());
                }
                true
            }
            Err(e) => {
                warn!("{}", e.report());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::source::Playlist;
    use crate::utils::cover_art::test_server::{png_bytes, serve_cover};
    use async_trait::async_trait;
    use id3::frame::PictureType;
    use id3::{Tag, TagLike};
    use std::fs;
    use tempfile::TempDir;

    /// Bytes that look like an ID3 header of an unsupported version
    const UNTAGGABLE: &[u8] = b"ID3\x09\x00\x00\x00\x00\x00\x00audio";

    /// In-memory source; ids starting with `fail` refuse to download, `fatal`
    /// fails the whole run and `badtag` writes a file the tagger rejects
    struct FakeSource {
        playlist: Option<Playlist>,
    }

    #[async_trait]
    impl PlaylistSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_playlist(&self, _reference: &str) -> Result<Playlist> {
            self.playlist
                .clone()
                .ok_or_else(|| Error::Fetch(anyhow::anyhow!("playlist not found")))
        }

        async fn download_track(&self, track: &TrackInfo, dest: &Path, bitrate_kbps: u32) -> Result<()> {
            assert_eq!(bitrate_kbps, 320);
            if track.id.starts_with("fail") {
                return Err(Error::Download {
                    track: track.title.clone(),
                    source: anyhow::anyhow!("connection reset"),
                });
            }
            if track.id.starts_with("fatal") {
                return Err(Error::Config("token revoked".to_string()));
            }
            if track.id.starts_with("badtag") {
                tokio::fs::write(dest, UNTAGGABLE).await?;
                return Ok(());
            }
            tokio::fs::write(dest, format!("audio for {}", track.id)).await?;
            Ok(())
        }
    }

    fn track(id: &str, title: &str, genre: &str, language: &str) -> TrackInfo {
        TrackInfo {
            id: id.to_string(),
            title: title.to_string(),
            artists: vec!["Artist".to_string()],
            album: "Album".to_string(),
            genre: genre.to_string(),
            language: language.to_string(),
            cover_url: None,
        }
    }

    fn options(root: &Path) -> PipelineOptions {
        PipelineOptions {
            output_root: root.to_path_buf(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_track_lands_in_all_trees() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource {
            playlist: Some(Playlist {
                name: "Mood: Summer".to_string(),
                tracks: vec![track("1", "Song", "Pop", "English")],
            }),
        };

        let pipeline = DownloadPipeline::new(&source, None, options(dir.path()));
        let result = pipeline.run("any").await.unwrap();

        assert_eq!(result.tracks_downloaded, 1);
        assert_eq!(result.tracks_tagged, 1);
        assert_eq!(result.copies_made, 2);
        assert_eq!(result.playlist_dir, dir.path().join("Mood Summer"));

        let original = dir.path().join("Mood Summer/Artist - Song.mp3");
        let by_language = dir.path().join("English/Pop/Artist - Song.mp3");
        let by_genre = dir.path().join("Pop/Artist - Song.mp3");
        let bytes = fs::read(&original).unwrap();
        assert_eq!(fs::read(&by_language).unwrap(), bytes);
        assert_eq!(fs::read(&by_genre).unwrap(), bytes);

        let tag = Tag::read_from_path(&by_genre).unwrap();
        assert_eq!(tag.title(), Some("Song"));
        assert_eq!(tag.genre(), Some("Pop"));
        assert_eq!(tag.pictures().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_track_does_not_stop_run() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource {
            playlist: Some(Playlist {
                name: "Mixed".to_string(),
                tracks: vec![
                    track("fail-1", "Broken", "Rock", "Unknown"),
                    track("2", "Works", "Rock", "Unknown"),
                ],
            }),
        };

        let pipeline = DownloadPipeline::new(&source, None, options(dir.path()));
        let result = pipeline.run("any").await.unwrap();

        assert_eq!(result.tracks_total, 2);
        assert_eq!(result.tracks_failed, 1);
        assert_eq!(result.tracks_downloaded, 1);
        assert!(!dir.path().join("Mixed/Artist - Broken.mp3").exists());
        assert!(dir.path().join("Mixed/Artist - Works.mp3").exists());
        assert!(dir.path().join("Unknown/Rock/Artist - Works.mp3").exists());
    }

    #[tokio::test]
    async fn test_unknown_language_not_tagged() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource {
            playlist: Some(Playlist {
                name: "P".to_string(),
                tracks: vec![track("1", "Song", "Jazz", "Unknown")],
            }),
        };

        DownloadPipeline::new(&source, None, options(dir.path()))
            .run("any")
            .await
            .unwrap();

        let tag = Tag::read_from_path(dir.path().join("P/Artist - Song.mp3")).unwrap();
        assert!(tag.get("TLAN").is_none());
    }

    #[tokio::test]
    async fn test_replication_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource {
            playlist: Some(Playlist {
                name: "P".to_string(),
                tracks: vec![track("1", "Song", "Pop", "English")],
            }),
        };
        let opts = PipelineOptions {
            replicate_language_genre: false,
            replicate_genre: false,
            ..options(dir.path())
        };

        let result = DownloadPipeline::new(&source, None, opts).run("any").await.unwrap();

        assert_eq!(result.copies_made, 0);
        assert!(!dir.path().join("Pop").exists());
        assert!(!dir.path().join("English").exists());
    }

    #[tokio::test]
    async fn test_existing_file_is_overwritten() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("P/Artist - Song.mp3");
        fs::create_dir_all(existing.parent().unwrap()).unwrap();
        fs::write(&existing, b"stale").unwrap();
        let source = FakeSource {
            playlist: Some(Playlist {
                name: "P".to_string(),
                tracks: vec![track("7", "Song", "Pop", "English")],
            }),
        };

        DownloadPipeline::new(&source, None, options(dir.path()))
            .run("any")
            .await
            .unwrap();

        let bytes = fs::read(&existing).unwrap();
        assert!(bytes.ends_with(b"audio for 7"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource { playlist: None };

        let err = DownloadPipeline::new(&source, None, options(dir.path()))
            .run("any")
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_fatal_track_error_aborts_run() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource {
            playlist: Some(Playlist {
                name: "P".to_string(),
                tracks: vec![
                    track("fatal-1", "First", "Pop", "English"),
                    track("2", "Second", "Pop", "English"),
                ],
            }),
        };

        let err = DownloadPipeline::new(&source, None, options(dir.path()))
            .run("any")
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(matches!(err, Error::Config(_)));
        assert!(!dir.path().join("P/Artist - Second.mp3").exists());
    }

    #[tokio::test]
    async fn test_cover_embedded_on_success() {
        let dir = TempDir::new().unwrap();
        let base = serve_cover(png_bytes(30, 30)).await;
        let source = FakeSource {
            playlist: Some(Playlist {
                name: "P".to_string(),
                tracks: vec![TrackInfo {
                    cover_url: Some(format!("{}/cover.png", base)),
                    ..track("1", "Song", "Pop", "English")
                }],
            }),
        };
        let covers = CoverFetcher::new().unwrap();

        let result = DownloadPipeline::new(&source, Some(covers), options(dir.path()))
            .run("any")
            .await
            .unwrap();

        assert_eq!(result.tracks_tagged, 1);
        for path in ["P/Artist - Song.mp3", "Pop/Artist - Song.mp3"] {
            let tag = Tag::read_from_path(dir.path().join(path)).unwrap();
            let pictures: Vec<_> = tag.pictures().collect();
            assert_eq!(pictures.len(), 1);
            assert_eq!(pictures[0].picture_type, PictureType::CoverFront);
            assert_eq!(&pictures[0].data[..2], &[0xFF, 0xD8]);
        }
    }

    #[tokio::test]
    async fn test_missing_cover_still_tags() {
        let dir = TempDir::new().unwrap();
        let base = serve_cover(png_bytes(30, 30)).await;
        let source = FakeSource {
            playlist: Some(Playlist {
                name: "P".to_string(),
                tracks: vec![TrackInfo {
                    cover_url: Some(format!("{}/gone.png", base)),
                    ..track("1", "Song", "Pop", "English")
                }],
            }),
        };
        let covers = CoverFetcher::new().unwrap();

        let result = DownloadPipeline::new(&source, Some(covers), options(dir.path()))
            .run("any")
            .await
            .unwrap();

        assert_eq!(result.tracks_downloaded, 1);
        assert_eq!(result.tracks_tagged, 1);
        let tag = Tag::read_from_path(dir.path().join("P/Artist - Song.mp3")).unwrap();
        assert_eq!(tag.title(), Some("Song"));
        assert_eq!(tag.album(), Some("Album"));
        assert_eq!(tag.pictures().count(), 0);
    }

    #[tokio::test]
    async fn test_tag_failure_still_replicates() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource {
            playlist: Some(Playlist {
                name: "P".to_string(),
                tracks: vec![
                    track("badtag-1", "Broken Tag", "Rock", "English"),
                    track("2", "Fine", "Rock", "English"),
                ],
            }),
        };

        let result = DownloadPipeline::new(&source, None, options(dir.path()))
            .run("any")
            .await
            .unwrap();

        assert_eq!(result.tracks_downloaded, 2);
        assert_eq!(result.tracks_tagged, 1);
        assert_eq!(result.tracks_failed, 0);
        assert_eq!(result.copies_made, 4);
        let copy = dir.path().join("English/Rock/Artist - Broken Tag.mp3");
        assert_eq!(fs::read(&copy).unwrap(), UNTAGGABLE);
        assert!(dir.path().join("Rock/Artist - Fine.mp3").exists());
    }
}
