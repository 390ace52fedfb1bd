//! Turning uploaded image bytes into a text field that fits in a document.
//!
//! The stored form is a `data:` URI with standard base64. Small uploads are
//! stored as they are; uploads whose encoding would exceed the size budget
//! are decoded, scaled down and re-encoded as JPEG.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Encoded-text budget: a ~1 MiB document field after base64 expansion.
pub const DEFAULT_THRESHOLD: usize = 1_048_487;
pub const DEFAULT_MAX_WIDTH: u32 = 800;
pub const DEFAULT_QUALITY: u8 = 70;

const MIN_QUALITY: u8 = 25;
const QUALITY_STEP: u8 = 15;
const MIN_WIDTH: u32 = 16;
const COMPRESSED_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Maximum length in bytes of the encoded text.
    pub threshold: usize,
    /// Width compressed images are scaled down to.
    pub max_width: u32,
    /// JPEG quality (1-100) of the first compression pass.
    pub quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_width: DEFAULT_MAX_WIDTH,
            quality: DEFAULT_QUALITY,
        }
    }
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("not a recognised image format")]
    UnknownFormat,
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("image does not fit in {threshold} bytes (smallest encoding was {smallest} bytes)")]
    OverBudget { threshold: usize, smallest: usize },
    #[error("image encoding task failed: {0}")]
    Task(String),
}

/// An image encoded as a `data:` URI.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Wraps text read back from a stored document.
    pub fn from_stored(text: impl Into<String>) -> Self {
        EncodedImage(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// MIME type declared in the URI header.
    pub fn mime_type(&self) -> Option<&str> {
        let header = self.0.strip_prefix("data:")?.split_once(',')?.0;
        header.strip_suffix(";base64")
    }

    /// Raw image bytes, if the URI is well formed.
    pub fn decode_bytes(&self) -> Option<Vec<u8>> {
        let (header, payload) = self.0.split_once(',')?;
        if !header.starts_with("data:") || !header.ends_with(";base64") {
            return None;
        }
        STANDARD.decode(payload).ok()
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EncodedImage({}, {} bytes)",
            self.mime_type().unwrap_or("?"),
            self.0.len()
        )
    }
}

fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Rounded height keeping the aspect ratio at `target_width`.
fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scaled = (u64::from(height) * u64::from(target_width) + u64::from(width) / 2)
        / u64::from(width.max(1));
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Encodes uploads under the configured size budget.
#[derive(Debug, Clone, Default)]
pub struct ImageEncoder {
    config: ImageConfig,
}

impl ImageEncoder {
    pub fn new(config: ImageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    /// Encodes `raw` as a `data:` URI no longer than the threshold.
    ///
    /// If the plain encoding fits it is returned unchanged. Otherwise the
    /// image is scaled to at most `max_width` (never up) and re-encoded as
    /// JPEG, lowering quality and then width until the result fits.
    pub fn encode(&self, raw: &[u8]) -> Result<EncodedImage, ImageError> {
        let format = image::guess_format(raw).map_err(|_| ImageError::UnknownFormat)?;
        // A valid header is not enough; the whole body has to decode.
        let source =
            image::load_from_memory_with_format(raw, format).map_err(ImageError::Decode)?;
        let (width, height) = (source.width(), source.height());

        let encoded = data_uri(format.to_mime_type(), raw);
        if encoded.len() <= self.config.threshold {
            debug!(width, height, len = encoded.len(), "image fits, storing as is");
            return Ok(EncodedImage(encoded));
        }

        debug!(
            width,
            height,
            len = encoded.len(),
            threshold = self.config.threshold,
            "image over budget, compressing"
        );
        self.compress(&source)
    }

    /// Runs [`ImageEncoder::encode`] on the blocking thread pool.
    pub async fn encode_async(&self, raw: Vec<u8>) -> Result<EncodedImage, ImageError> {
        let encoder = self.clone();
        tokio::task::spawn_blocking(move || encoder.encode(&raw))
            .await
            .map_err(|e| ImageError::Task(e.to_string()))?
    }

    fn compress(&self, source: &DynamicImage) -> Result<EncodedImage, ImageError> {
        let mut width = source.width().min(self.config.max_width).max(1);
        let mut quality = self.config.quality.clamp(1, 100);
        let mut smallest = usize::MAX;

        loop {
            let encoded = Self::jpeg_at(source, width, quality)?;
            debug!(width, quality, len = encoded.len(), "compression pass");
            if encoded.len() <= self.config.threshold {
                return Ok(EncodedImage(encoded));
            }
            smallest = smallest.min(encoded.len());

            if quality > MIN_QUALITY {
                quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
            } else if width > MIN_WIDTH {
                width = (width / 2).max(MIN_WIDTH);
            } else {
                return Err(ImageError::OverBudget {
                    threshold: self.config.threshold,
                    smallest,
                });
            }
        }
    }

    fn jpeg_at(source: &DynamicImage, width: u32, quality: u8) -> Result<String, ImageError> {
        let resized;
        let frame = if width == source.width() {
            source
        } else {
            let height = scaled_height(source.width(), source.height(), width);
            resized = source.resize_exact(width, height, FilterType::Triangle);
            &resized
        };

        // JPEG has no alpha channel; transparent pixels are flattened.
        let rgb = frame.to_rgb8();
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality)
            .encode_image(&rgb)
            .map_err(ImageError::Encode)?;

        Ok(data_uri(COMPRESSED_MIME, &jpeg))
    }
}
