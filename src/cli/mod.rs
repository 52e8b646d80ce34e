//! CLI module for tunesort

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod auth;
pub mod commands;
pub mod prompt;

pub use auth::AuthManager;

#[derive(Parser, Debug)]
#[command(name = "tunesort", about = "Download playlists, tag them, and sort them into folders")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download a Yandex Music playlist, tag it, and sort copies by language and genre
    Playlist {
        /// Playlist link (prompted for if omitted)
        #[arg(value_name = "URL")]
        url: Option<String>,

        /// OAuth token (falls back to the keyring, then a prompt)
        #[arg(long, env = "YANDEX_MUSIC_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Only download into the playlist folder
        #[arg(long)]
        no_replicate: bool,
    },

    /// Download a playlist through yt-dlp
    Extract {
        /// Playlist or video link (prompted for if omitted)
        #[arg(value_name = "URL")]
        url: Option<String>,

        /// Only download into the playlist folder
        #[arg(long)]
        no_replicate: bool,
    },

    /// Set each MP3's album tag to the name of its folder
    AlbumTags {
        /// Music directory (prompted for if omitted)
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Show what would change without writing tags
        #[arg(long)]
        dry_run: bool,
    },

    /// Copy MP3s into author/<artist>/ based on their artist tag
    SortAuthors {
        /// Directory to sort (prompted for if omitted)
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Show what would be copied without copying
        #[arg(long)]
        dry_run: bool,
    },

    /// Store a Yandex Music token in the system keyring
    Auth {
        /// OAuth token
        #[arg(long, env = "YANDEX_MUSIC_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Force re-authentication (ignore stored token)
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
