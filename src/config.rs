//! Run configuration.
//!
//! Everything the pipeline needs is gathered once at startup into a
//! [`Config`] value and passed down by reference. Components never read the
//! environment themselves.

use crate::cli::Args;
use crate::constants::{DEFAULT_EXTENSIONS, DEFAULT_ROOT};
use crate::error::Result;
use crate::quality::QualityResolver;
use crate::validation::validate_parallelism;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory whose whole subtree is scanned
    pub root: PathBuf,
    /// Allowed dotted extensions, matched exactly
    pub extensions: Vec<String>,
    pub quality: QualityResolver,
    /// Number of chunks the file list is split into
    pub parallelism: usize,
    /// Exit non-zero when any file failed
    pub strict: bool,
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            extensions: parse_extensions(DEFAULT_EXTENSIONS),
            quality: QualityResolver::default(),
            parallelism: detect_parallelism(),
            strict: false,
            dry_run: false,
        }
    }
}

impl Config {
    /// Build the configuration from parsed arguments plus a key/value source
    /// for the per-format quality overrides.
    ///
    /// Command line `--format-quality` pairs win over looked-up values.
    pub fn from_args<F>(args: &Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut quality = QualityResolver::from_lookup(lookup, args.quality)?;
        for (format, value) in &args.format_quality {
            quality = quality.with_override(format.clone(), *value);
        }

        let parallelism = match args.jobs {
            Some(jobs) => validate_parallelism(jobs)?,
            None => detect_parallelism(),
        };

        Ok(Self {
            root: args.root.clone(),
            extensions: parse_extensions(&args.extensions),
            quality,
            parallelism,
            strict: args.strict,
            dry_run: args.dry_run,
        })
    }

    /// Default configuration rooted at `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

/// Split a comma-separated extension list, trimming whitespace and
/// dropping empty items
pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .map(str::to_string)
        .collect()
}

/// Logical CPU count of the host
pub fn detect_parallelism() -> usize {
    num_cpus::get().max(1)
}
