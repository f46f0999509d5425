pub mod batch;
pub mod cli;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod formats;
pub mod info;
pub mod logger;
pub mod processing;
pub mod quality;
pub mod utils;
pub mod validation;

pub use batch::{partition, run, run_all, run_chunk, ChunkReport, FileChunk, RunSummary};
pub use config::Config;
pub use discovery::discover;
pub use error::{RecompressError, Result};
pub use formats::{detect, detect_bytes, ImageKind};
pub use processing::{encode_image, recompress, RecompressOutcome};
pub use quality::QualityResolver;
