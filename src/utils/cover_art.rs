//! Cover art fetching and normalisation
//!
//! Covers are embedded as `image/jpeg`, so whatever the server hands back is
//! re-encoded as baseline JPEG and scaled down to at most MAX_COVER_SIZE.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use reqwest::Client;
use std::io::Cursor;
use tracing::{debug, warn};

use crate::error::Error;

/// Maximum dimension for cover art (width or height)
const MAX_COVER_SIZE: u32 = 500;

/// JPEG quality (0-100)
const JPEG_QUALITY: u8 = 85;

/// Repair a cover URL as it comes out of track metadata
///
/// `https:host/x` becomes `https://host/x`; anything without a recognised
/// scheme is assumed to be HTTPS.
pub fn normalize_cover_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with("https://") || raw.starts_with("http://") {
        raw.to_string()
    } else if let Some(rest) = raw.strip_prefix("https:") {
        format!("https://{}", rest.trim_start_matches('/'))
    } else {
        format!("https://{}", raw.trim_start_matches('/'))
    }
}

/// Downloads cover images
#[derive(Clone)]
pub struct CoverFetcher {
    http_client: Client,
}

impl CoverFetcher {
    pub fn new() -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("tunesort/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { http_client })
    }

    /// Fetch a cover and prepare it for embedding
    ///
    /// Only a success status counts; anything else is an `Error::Cover`.
    pub async fn fetch(&self, raw_url: &str) -> crate::error::Result<Vec<u8>> {
        let url = normalize_cover_url(raw_url);
        if let Err(e) = url::Url::parse(&url) {
            return Err(Error::Cover {
                url,
                reason: e.to_string(),
            });
        }

        debug!("Fetching cover art: {}", url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Cover {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Error::Cover {
                url,
                reason: format!("HTTP status {}", response.status()),
            });
        }

        let data = response.bytes().await.map_err(|e| Error::Cover {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        Ok(prepare_cover(&data))
    }
}

/// Re-encode a cover as JPEG, or keep the original bytes if it can't be decoded
pub fn prepare_cover(data: &[u8]) -> Vec<u8> {
    match process_cover_art(data) {
        Ok(jpeg) => jpeg,
        Err(e) => {
            warn!("Could not re-encode cover art, embedding as fetched: {:#}", e);
            data.to_vec()
        }
    }
}

/// Decode, shrink, and encode as baseline JPEG
pub fn process_cover_art(data: &[u8]) -> Result<Vec<u8>> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("Failed to guess image format")?
        .decode()
        .context("Failed to decode cover art")?;

    let img = resize_to_fit(img);

    let mut output = Vec::new();
    JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY)
        .encode_image(&img.to_rgb8())
        .context("Failed to encode cover art as JPEG")?;

    debug!(
        "Processed cover art: {}x{} -> {} bytes",
        img.width(),
        img.height(),
        output.len()
    );
    Ok(output)
}

/// Resize image to fit within MAX_COVER_SIZE while maintaining aspect ratio
fn resize_to_fit(img: DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());

    if width <= MAX_COVER_SIZE && height <= MAX_COVER_SIZE {
        return img;
    }

    let (new_width, new_height) = if width > height {
        let ratio = MAX_COVER_SIZE as f64 / width as f64;
        (MAX_COVER_SIZE, (height as f64 * ratio) as u32)
    } else {
        let ratio = MAX_COVER_SIZE as f64 / height as f64;
        ((width as f64 * ratio) as u32, MAX_COVER_SIZE)
    };

    debug!(
        "Resizing cover art: {}x{} -> {}x{}",
        width, height, new_width, new_height
    );

    img.resize(new_width, new_height, FilterType::Lanczos3)
}
