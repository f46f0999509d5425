use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecompressError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("JPEG encoding error: {0}")]
    JpegEncoding(#[from] jpeg_encoder::EncodingError),

    #[error("WebP encoding error: {0}")]
    WebPEncoding(String),

    #[error("Image too large for {format}: {width}x{height}")]
    ImageTooLarge {
        format: &'static str,
        width: u32,
        height: u32,
    },

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("Unrecognized image content: {0}")]
    UnknownFormat(PathBuf),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid quality for {key}: {value:?}. Must be an integer between 1 and 100")]
    InvalidQuality { key: String, value: String },

    #[error("Invalid parallelism: {0}. Must be at least 1")]
    InvalidParallelism(usize),

    #[error("Root directory not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Root path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("Failed to initialize logging: {0}")]
    Logger(String),
}

pub type Result<T> = std::result::Result<T, RecompressError>;
