use crate::constants::{MAX_QUALITY, MIN_QUALITY};
use crate::error::{RecompressError, Result};
use crate::formats::ImageKind;
use std::path::Path;

/// Validate that the scan root exists and is a directory
pub fn validate_root_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(RecompressError::RootNotFound(path.to_path_buf()));
    }

    if !path.is_dir() {
        return Err(RecompressError::NotADirectory(path.to_path_buf()));
    }

    Ok(())
}

/// Parse a quality value coming from configuration.
///
/// Surrounding whitespace is ignored; anything that is not an integer in
/// 1..=100 is rejected.
pub fn parse_quality(key: &str, raw: &str) -> Result<u8> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|q| (MIN_QUALITY..=MAX_QUALITY).contains(q))
        .ok_or_else(|| RecompressError::InvalidQuality {
            key: key.to_string(),
            value: raw.to_string(),
        })
}

/// Parse a `FORMAT=QUALITY` pair given on the command line.
///
/// The format must be one of the exact names in [`ImageKind::ALL`].
pub fn parse_format_quality(raw: &str) -> std::result::Result<(String, u8), String> {
    let (format, quality) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FORMAT=QUALITY, got {:?}", raw))?;

    let format = format.trim();
    if format.is_empty() {
        return Err(format!("missing format name in {:?}", raw));
    }

    let kind: ImageKind = format.parse().map_err(|e: RecompressError| {
        let known: Vec<&str> = ImageKind::ALL.iter().map(ImageKind::name).collect();
        format!("{} (expected one of {})", e, known.join(", "))
    })?;

    let quality = parse_quality(kind.name(), quality).map_err(|e| e.to_string())?;
    Ok((kind.name().to_string(), quality))
}

/// Check a worker count coming from configuration
pub fn validate_parallelism(parallelism: usize) -> Result<usize> {
    if parallelism == 0 {
        return Err(RecompressError::InvalidParallelism(parallelism));
    }
    Ok(parallelism)
}
