//! CLI command handlers

use anyhow::{Context, Result};
use clap_complete::generate;
use colored::Colorize;
use std::io;
use std::path::PathBuf;

use super::{prompt, AuthManager};
use crate::config::Settings;
use crate::extractor::YtDlp;
use crate::library::{self, StructureReplicator};
use crate::pipeline::{DownloadPipeline, PipelineResult};
use crate::source::{parse_playlist_url, playlist_url::clean_input, PlaylistSource};
use crate::utils::cover_art::CoverFetcher;
use crate::yandex::YandexMusicClient;

/// Handle the `playlist` command
pub async fn playlist(url: Option<String>, token: Option<String>, no_replicate: bool) -> Result<()> {
    let settings = Settings::load()?;
    let url = prompt::value_or_prompt(url, "Yandex Music playlist link").await?;

    // Reject a bad link before asking for credentials
    let playlist_ref = parse_playlist_url(&url)?;
    tracing::debug!(
        "Playlist owner {}, id {}",
        playlist_ref.user_id,
        playlist_ref.playlist_id
    );

    let token = AuthManager::resolve(token).await?;
    let client = YandexMusicClient::new(&token, &settings.cover_size)?;

    run_pipeline(&client, &url, &settings, no_replicate).await
}

/// Handle the `extract` command
pub async fn extract(url: Option<String>, no_replicate: bool) -> Result<()> {
    let settings = Settings::load()?;
    let url = prompt::value_or_prompt(url, "Playlist or video link").await?;
    let url = clean_input(&url)?.to_string();

    let extractor = YtDlp::new(&settings.yt_dlp_path);
    run_pipeline(&extractor, &url, &settings, no_replicate).await
}

async fn run_pipeline(
    source: &dyn PlaylistSource,
    reference: &str,
    settings: &Settings,
    no_replicate: bool,
) -> Result<()> {
    println!("{}", format!("Fetching playlist via {}...", source.name()).cyan());

    let covers = CoverFetcher::new()?;
    let pipeline = DownloadPipeline::new(
        source,
        Some(covers),
        settings.pipeline_options(!no_replicate),
    );
    let result = pipeline.run(reference).await?;

    print_summary(&result);
    Ok(())
}

fn print_summary(result: &PipelineResult) {
    println!();
    if result.tracks_failed == 0 {
        println!(
            "{} «{}»",
            "All tracks downloaded from".green().bold(),
            result.playlist_name
        );
    } else {
        println!(
            "{} «{}»",
            "Finished with errors:".yellow().bold(),
            result.playlist_name
        );
    }
    println!("  Folder: {}", result.playlist_dir.display());
    println!(
        "  Tracks downloaded: {}/{}",
        result.tracks_downloaded, result.tracks_total
    );
    println!("  Tracks tagged: {}", result.tracks_tagged);
    if result.tracks_failed > 0 {
        println!("  Tracks failed: {}", result.tracks_failed.to_string().red());
    }
    println!("  Copies made: {}", result.copies_made);
}

async fn directory_or_prompt(dir: Option<PathBuf>, message: &str) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => {
            let answer = prompt::input(message).await?;
            Ok(PathBuf::from(clean_input(&answer)?))
        }
    }
}

/// Handle the `album-tags` command
pub async fn album_tags(dir: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let dir = directory_or_prompt(dir, "Music directory").await?;

    let report = tokio::task::spawn_blocking(move || library::update_album_tags(&dir, dry_run))
        .await
        .context("Album tagging task panicked")??;

    println!();
    if dry_run {
        println!("{}", "[DRY RUN] No files were changed.".yellow());
    }
    println!("{}", "Album tags updated!".green().bold());
    println!("  Files updated: {}", report.updated);
    if report.failed > 0 {
        println!("  Files failed: {}", report.failed.to_string().red());
    }
    Ok(())
}

/// Handle the `sort-authors` command
pub async fn sort_authors(dir: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let settings = Settings::load()?;
    let dir = directory_or_prompt(dir, "Folder to sort").await?;
    let replicator = StructureReplicator::new(settings.output_root).with_dry_run(dry_run);

    let report = tokio::task::spawn_blocking(move || library::sort_by_author(&dir, &replicator))
        .await
        .context("Author sorting task panicked")??;

    println!();
    if dry_run {
        println!("{}", "[DRY RUN] No files were copied.".yellow());
    }
    println!("{}", "Sorting complete!".green().bold());
    println!("  Files copied: {}", report.copied);
    println!("  Files skipped (no artist): {}", report.skipped);
    if report.failed > 0 {
        println!("  Files failed: {}", report.failed.to_string().red());
    }
    Ok(())
}

/// Handle the `auth` command
pub async fn auth(token: Option<String>, force: bool) -> Result<()> {
    println!("{}", "Configuring Yandex Music token...".cyan());

    let settings = Settings::load()?;
    AuthManager::authenticate(token, force, &settings.cover_size).await?;
    let config_path = settings.save()?;

    println!();
    println!("{}", "Authentication successful!".green().bold());
    println!("Token stored securely in system keyring.");
    println!("Settings: {}", config_path.display());

    Ok(())
}

/// Handle the `completion` command
pub fn completion(shell: clap_complete::Shell) {
    let mut cmd = <super::Cli as clap::CommandFactory>::command();
    generate(shell, &mut cmd, "tunesort", &mut io::stdout());
}
