//! tunesort - Download music playlists, tag them, and sort them into folders

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod error;
mod extractor;
mod library;
mod pipeline;
mod source;
mod tagging;
mod utils;
mod yandex;

use cli::{Cli, Commands};
use utils::progress_log::ProgressAwareStderr;

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Playlist {
            url,
            token,
            no_replicate,
        } => {
            cli::commands::playlist(url, token, no_replicate).await?;
        }
        Commands::Extract { url, no_replicate } => {
            cli::commands::extract(url, no_replicate).await?;
        }
        Commands::AlbumTags { dir, dry_run } => {
            cli::commands::album_tags(dir, dry_run).await?;
        }
        Commands::SortAuthors { dir, dry_run } => {
            cli::commands::sort_authors(dir, dry_run).await?;
        }
        Commands::Auth { token, force } => {
            cli::commands::auth(token, force).await?;
        }
        Commands::Completion { shell } => {
            cli::commands::completion(shell);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "tunesort=debug,reqwest=debug"
    } else {
        "tunesort=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(ProgressAwareStderr),
        )
        .init();

    tokio::select! {
        result = run(cli) => match result {
            Ok(()) => ExitCode::SUCCESS,
            // A prompt saw the Ctrl-C before the signal handler did
            Err(e) if error::is_interrupted(&e) => {
                print_interrupted();
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            print_interrupted();
            // A prompt may still be blocking a worker thread; don't wait for it
            std::process::exit(0);
        }
    }
}

fn print_interrupted() {
    println!();
    println!("{}", "Interrupted by user.".yellow());
}
