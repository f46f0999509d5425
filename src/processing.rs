use crate::constants::{
    HIGH_QUALITY_THRESHOLD, LIBDEFLATER_HIGH_LEVEL, LIBDEFLATER_LOW_LEVEL, OXIPNG_PRESET,
    ZOPFLI_ITERATIONS, ZOPFLI_QUALITY_THRESHOLD,
};
use crate::error::{RecompressError, Result};
use crate::formats::{self, ImageKind};
use crate::quality::QualityResolver;
use crate::utils::{dotted_extension, format_file_size};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::DynamicImage;
use jpeg_encoder::{ColorType as JpegColor, Encoder as JpegEncoder};
use oxipng::{Deflaters, Options};
use std::borrow::Cow;
use std::fs;
use std::io::{Cursor, Write};
use std::num::NonZeroU8;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::{error, info};

/// Result of recompressing one file.
///
/// `format` and `quality` are filled in as soon as they are known, so a
/// failed outcome still reports how far processing got.
#[derive(Debug)]
pub struct RecompressOutcome {
    pub path: PathBuf,
    /// Dotted extension as found on disk, e.g. `.jpg`
    pub extension: String,
    pub format: Option<ImageKind>,
    pub quality: Option<u8>,
    pub elapsed: Duration,
    pub original_size: u64,
    pub recompressed_size: Option<u64>,
    pub error: Option<RecompressError>,
}

impl RecompressOutcome {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            extension: dotted_extension(path),
            format: None,
            quality: None,
            elapsed: Duration::ZERO,
            original_size: 0,
            recompressed_size: None,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn format_name(&self) -> &'static str {
        self.format.map_or("unknown", |kind| kind.name())
    }
}

/// Recompress a single file in place.
///
/// The format is sniffed again from the file content, the quality resolved
/// for that format, and the image re-encoded in the same format back to the
/// original path, whatever its extension says. The file is only overwritten
/// once encoding succeeded. Failures are logged and returned inside the
/// outcome; this function never aborts the caller.
pub fn recompress(path: &Path, resolver: &QualityResolver) -> RecompressOutcome {
    let start = Instant::now();
    let mut outcome = RecompressOutcome::new(path);

    if let Err(e) = recompress_into(path, resolver, &mut outcome) {
        error!(
            format = %outcome.format_name(),
            path = %path.display(),
            error = %e,
            "recompression failed"
        );
        outcome.error = Some(e);
    }

    outcome.elapsed = start.elapsed();
    log_outcome(&outcome);
    outcome
}

fn recompress_into(
    path: &Path,
    resolver: &QualityResolver,
    outcome: &mut RecompressOutcome,
) -> Result<()> {
    let original = fs::read(path)?;
    outcome.original_size = original.len() as u64;

    let kind = formats::detect_bytes(&original)
        .ok_or_else(|| RecompressError::UnknownFormat(path.to_path_buf()))?;
    outcome.format = Some(kind);

    let quality = resolver.resolve(kind.name());
    outcome.quality = Some(quality);

    let img = image::load_from_memory_with_format(&original, kind.to_image_format())?;
    let encoded = encode_image(&img, kind, quality)?;

    replace_file(path, &encoded)?;
    outcome.recompressed_size = Some(encoded.len() as u64);

    Ok(())
}

/// Overwrite the file behind `path` with `contents` in one rename.
///
/// The bytes go to a temporary file next to the target first, so a failed
/// write leaves the original untouched. Symlinks are resolved and their
/// target is replaced, keeping the link itself.
fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    let target = fs::canonicalize(path)?;
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(&target)?.permissions();

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.as_file().set_permissions(permissions)?;
    tmp.persist(&target).map_err(|e| e.error)?;

    Ok(())
}

fn log_outcome(outcome: &RecompressOutcome) {
    let quality = outcome
        .quality
        .map_or_else(|| "-".to_string(), |q| q.to_string());
    let after = outcome
        .recompressed_size
        .map_or_else(|| "-".to_string(), format_file_size);

    info!(
        ext = %outcome.extension,
        format = %outcome.format_name(),
        quality = %quality,
        time = %format!("{:.2}s", outcome.elapsed.as_secs_f64()),
        before = %format_file_size(outcome.original_size),
        after = %after,
        path = %outcome.path.display(),
        "{}",
        if outcome.is_success() { "recompressed" } else { "failed" }
    );
}

/// Encode `img` as `kind` at `quality`.
///
/// Quality drives the JPEG and WebP encoders directly and picks the oxipng
/// deflater for PNG. The remaining formats are written by their image crate
/// encoder and ignore it.
pub fn encode_image(img: &DynamicImage, kind: ImageKind, quality: u8) -> Result<Vec<u8>> {
    let img = encodable_for(img, kind);

    match kind {
        ImageKind::Jpeg => encode_jpeg(&img, quality),
        ImageKind::WebP => encode_webp(&img, quality),
        ImageKind::Png => {
            let mut buf = Vec::new();
            let encoder =
                PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
            img.write_with_encoder(encoder)?;
            oxipng::optimize_from_memory(&buf, &png_options(quality))
                .map_err(|e| RecompressError::PngOptimization(e.to_string()))
        }
        _ => {
            let mut buf = Vec::new();
            img.write_to(&mut Cursor::new(&mut buf), kind.to_image_format())?;
            Ok(buf)
        }
    }
}

/// Baseline JPEG with Huffman tables built from the image statistics
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let too_large = || RecompressError::ImageTooLarge {
        format: ImageKind::Jpeg.name(),
        width: img.width(),
        height: img.height(),
    };
    let width = u16::try_from(img.width()).map_err(|_| too_large())?;
    let height = u16::try_from(img.height()).map_err(|_| too_large())?;

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new(&mut buf, quality);
    encoder.set_optimized_huffman_tables(true);

    match img {
        DynamicImage::ImageLuma8(luma) => {
            encoder.encode(luma.as_raw(), width, height, JpegColor::Luma)?
        }
        DynamicImage::ImageRgb8(rgb) => encoder.encode(rgb.as_raw(), width, height, JpegColor::Rgb)?,
        other => encoder.encode(&other.to_rgb8(), width, height, JpegColor::Rgb)?,
    }

    Ok(buf)
}

/// Lossy WebP at the resolved quality
fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let encoder = webp::Encoder::from_image(img)
        .map_err(|e| RecompressError::WebPEncoding(e.to_string()))?;
    let encoded = encoder
        .encode_simple(false, f32::from(quality))
        .map_err(|e| RecompressError::WebPEncoding(format!("{:?}", e)))?;
    Ok(encoded.to_vec())
}

/// oxipng settings for a quality level: Zopfli for the top range, strong
/// libdeflate below that, lighter libdeflate for low qualities.
pub fn png_options(quality: u8) -> Options {
    let mut options = Options::from_preset(OXIPNG_PRESET);

    options.deflate = if quality >= ZOPFLI_QUALITY_THRESHOLD {
        Deflaters::Zopfli {
            iterations: NonZeroU8::new(ZOPFLI_ITERATIONS).unwrap_or(NonZeroU8::MIN),
        }
    } else if quality >= HIGH_QUALITY_THRESHOLD {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_HIGH_LEVEL,
        }
    } else {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_LOW_LEVEL,
        }
    };

    options
}

/// Convert the decoded buffer to a pixel layout the target encoder accepts.
fn encodable_for(img: &DynamicImage, kind: ImageKind) -> Cow<'_, DynamicImage> {
    use DynamicImage::*;

    match (kind, img) {
        (
            ImageKind::Png,
            ImageLuma8(_) | ImageLumaA8(_) | ImageRgb8(_) | ImageRgba8(_) | ImageLuma16(_)
            | ImageLumaA16(_) | ImageRgb16(_) | ImageRgba16(_),
        ) => Cow::Borrowed(img),
        (
            ImageKind::Tiff,
            ImageLuma8(_) | ImageRgb8(_) | ImageRgba8(_) | ImageLuma16(_) | ImageRgb16(_)
            | ImageRgba16(_),
        ) => Cow::Borrowed(img),
        (
            ImageKind::Bmp,
            ImageLuma8(_) | ImageLumaA8(_) | ImageRgb8(_) | ImageRgba8(_),
        ) => Cow::Borrowed(img),
        (ImageKind::WebP, ImageRgb8(_) | ImageRgba8(_)) => Cow::Borrowed(img),
        (ImageKind::WebP, ImageLuma8(_) | ImageLuma16(_) | ImageRgb16(_) | ImageRgb32F(_)) => {
            Cow::Owned(ImageRgb8(img.to_rgb8()))
        }
        (ImageKind::Gif, ImageRgba8(_)) => Cow::Borrowed(img),
        // JPEG and PNM carry no alpha channel
        (ImageKind::Jpeg | ImageKind::Pnm, ImageLuma8(_) | ImageRgb8(_)) => Cow::Borrowed(img),
        (ImageKind::Jpeg | ImageKind::Pnm, ImageLumaA8(_) | ImageLuma16(_) | ImageLumaA16(_)) => {
            Cow::Owned(ImageLuma8(img.to_luma8()))
        }
        (ImageKind::Jpeg | ImageKind::Pnm, _) => Cow::Owned(ImageRgb8(img.to_rgb8())),
        _ => Cow::Owned(ImageRgba8(img.to_rgba8())),
    }
}
