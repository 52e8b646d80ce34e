//! Path segment sanitization

/// Segment used when nothing survives sanitization
pub const EMPTY_SEGMENT: &str = "Unknown";

/// Strip every character outside the allow-list (alphanumerics, space,
/// underscore) and trim the result
///
/// Alphanumeric is Unicode-aware, so Cyrillic or Greek names survive intact.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitize a metadata value for use as a directory name
pub fn sanitize_segment(value: &str) -> String {
    let clean = sanitize_name(value);
    if clean.is_empty() {
        EMPTY_SEGMENT.to_string()
    } else {
        clean
    }
}

/// Build the `"<artist> - <title>.mp3"` file name for a track
pub fn track_file_name(artist: &str, title: &str) -> String {
    format!("{} - {}.mp3", sanitize_segment(artist), sanitize_segment(title))
}
