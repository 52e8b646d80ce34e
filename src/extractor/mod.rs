//! Generic media extractor (yt-dlp) source

pub mod models;
pub mod ytdlp;

pub use ytdlp::YtDlp;
