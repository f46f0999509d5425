/// Content-based image format detection
///
/// Formats are always derived from the leading bytes of a file. The file
/// extension plays no part here.

use crate::constants::SNIFF_HEADER_LEN;
use crate::error::{RecompressError, Result};
use image::ImageFormat;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Image formats that can be decoded and re-encoded in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    /// Lossy JPEG, the main target of recompression
    Jpeg,
    /// PNG, optimized losslessly with oxipng
    Png,
    Gif,
    /// WebP, re-encoded lossy at the resolved quality
    WebP,
    Bmp,
    Tiff,
    /// Portable anymap (PBM/PGM/PPM)
    Pnm,
}

impl ImageKind {
    pub const ALL: [ImageKind; 7] = [
        ImageKind::Jpeg,
        ImageKind::Png,
        ImageKind::Gif,
        ImageKind::WebP,
        ImageKind::Bmp,
        ImageKind::Tiff,
        ImageKind::Pnm,
    ];

    /// Short upper-case name used in logs and as the per-format quality key
    pub fn name(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "JPEG",
            ImageKind::Png => "PNG",
            ImageKind::Gif => "GIF",
            ImageKind::WebP => "WEBP",
            ImageKind::Bmp => "BMP",
            ImageKind::Tiff => "TIFF",
            ImageKind::Pnm => "PPM",
        }
    }

    /// Convert to the image crate's ImageFormat
    pub fn to_image_format(&self) -> ImageFormat {
        match self {
            ImageKind::Jpeg => ImageFormat::Jpeg,
            ImageKind::Png => ImageFormat::Png,
            ImageKind::Gif => ImageFormat::Gif,
            ImageKind::WebP => ImageFormat::WebP,
            ImageKind::Bmp => ImageFormat::Bmp,
            ImageKind::Tiff => ImageFormat::Tiff,
            ImageKind::Pnm => ImageFormat::Pnm,
        }
    }

    /// Map an image crate format onto a re-encodable kind
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Gif => Some(ImageKind::Gif),
            ImageFormat::WebP => Some(ImageKind::WebP),
            ImageFormat::Bmp => Some(ImageKind::Bmp),
            ImageFormat::Tiff => Some(ImageKind::Tiff),
            ImageFormat::Pnm => Some(ImageKind::Pnm),
            _ => None,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageKind {
    type Err = RecompressError;

    fn from_str(s: &str) -> Result<Self> {
        ImageKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| RecompressError::UnsupportedFormat(s.to_string()))
    }
}

/// Classify a byte buffer by its magic number
pub fn detect_bytes(bytes: &[u8]) -> Option<ImageKind> {
    image::guess_format(bytes)
        .ok()
        .and_then(ImageKind::from_image_format)
}

/// Read the head of `path` and classify it.
///
/// Returns `Ok(None)` for content that is not a re-encodable image.
pub fn detect(path: &Path) -> Result<Option<ImageKind>> {
    let mut header = Vec::with_capacity(SNIFF_HEADER_LEN);
    File::open(path)?
        .take(SNIFF_HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    Ok(detect_bytes(&header))
}
