//! Utility functions

pub mod cover_art;
pub mod progress_log;
mod sanitize;

pub use sanitize::{sanitize_segment, track_file_name};
