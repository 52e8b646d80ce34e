//! Playlist download pipeline

pub mod engine;

pub use engine::{DownloadPipeline, PipelineOptions, PipelineResult};
