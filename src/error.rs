//! Error types shared by the download pipeline and the library walkers

use std::path::PathBuf;
use thiserror::Error;

/// How far an error is allowed to propagate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Abort the whole run
    Fatal,
    /// Skip the current track or sub-step and keep going
    Recoverable,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to fetch playlist")]
    Fetch(#[source] anyhow::Error),

    #[error("failed to download '{track}'")]
    Download {
        track: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to tag {path:?}")]
    Tag {
        path: PathBuf,
        #[source]
        source: id3::Error,
    },

    #[error("failed to fetch cover art from {url}: {reason}")]
    Cover { url: String, reason: String },

    #[error("failed to copy {from:?} to {to:?}")]
    Replicate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("filesystem error")]
    Io(#[from] std::io::Error),

    /// Ctrl-C arrived while a prompt was reading the terminal
    #[error("interrupted by user")]
    Interrupted,
}

impl Error {
    pub fn severity(&self) -> Severity {
        match self {
            Error::InvalidInput(_) | Error::Config(_) | Error::Fetch(_) | Error::Interrupted => {
                Severity::Fatal
            }
            Error::Download { .. }
            | Error::Tag { .. }
            | Error::Cover { .. }
            | Error::Replicate { .. }
            | Error::Io(_) => Severity::Recoverable,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// The message followed by every underlying cause, `: `-separated
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str(": ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

/// Whether `err`, or anything it wraps, is a Ctrl-C caught by a prompt
pub fn is_interrupted(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| matches!(cause.downcast_ref::<Error>(), Some(Error::Interrupted)))
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_and_fetch_errors_are_fatal() {
        assert!(Error::InvalidInput("empty".into()).is_fatal());
        assert!(Error::Fetch(anyhow::anyhow!("404")).is_fatal());
        assert!(Error::Config("bad json".into()).is_fatal());
    }

    #[test]
    fn test_per_track_errors_are_recoverable() {
        let err = Error::Download {
            track: "Song".into(),
            source: anyhow::anyhow!("timeout"),
        };
        assert_eq!(err.severity(), Severity::Recoverable);

        let err = Error::Cover {
            url: "https://example.com/a.jpg".into(),
            reason: "HTTP 404".into(),
        };
        assert_eq!(err.severity(), Severity::Recoverable);
    }

    #[test]
    fn test_download_error_message_names_track() {
        let err = Error::Download {
            track: "Artist - Song".into(),
            source: anyhow::anyhow!("no mp3 at 320 kbps"),
        };
        assert_eq!(err.to_string(), "failed to download 'Artist - Song'");
        assert_eq!(err.report(), "failed to download 'Artist - Song': no mp3 at 320 kbps");
    }

    #[test]
    fn test_cause_printed_once() {
        let cause = anyhow::anyhow!("connection refused").context("Failed to fetch playlist");
        let err = anyhow::Error::new(Error::Fetch(cause));

        assert_eq!(
            format!("{:#}", err),
            "failed to fetch playlist: Failed to fetch playlist: connection refused"
        );
        assert_eq!(
            Error::Fetch(anyhow::anyhow!("connection refused")).report(),
            "failed to fetch playlist: connection refused"
        );
    }

    #[test]
    fn test_interrupted_found_through_context() {
        let err = anyhow::Error::new(Error::Interrupted).context("Failed to read input");
        assert!(is_interrupted(&err));
        assert!(Error::Interrupted.is_fatal());

        let err = anyhow::anyhow!("read failed").context("Failed to read input");
        assert!(!is_interrupted(&err));
    }
}
