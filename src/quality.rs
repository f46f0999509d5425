use crate::constants::DEFAULT_QUALITY;
use crate::error::Result;
use crate::formats::ImageKind;
use crate::validation::parse_quality;
use std::collections::HashMap;

/// Maps a detected format name to an encoder quality.
///
/// Lookup order is fixed: a per-format override keyed by the exact format
/// name, then the global default, then [`DEFAULT_QUALITY`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityResolver {
    overrides: HashMap<String, u8>,
    default_quality: Option<u8>,
}

impl QualityResolver {
    pub fn new(overrides: HashMap<String, u8>, default_quality: Option<u8>) -> Self {
        Self {
            overrides,
            default_quality,
        }
    }

    /// Collect per-format overrides from a key/value source, one key per
    /// known format name (`JPEG`, `PNG`, ...).
    pub fn from_lookup<F>(lookup: F, default_quality: Option<u8>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut overrides = HashMap::new();
        for kind in ImageKind::ALL {
            if let Some(raw) = lookup(kind.name()) {
                overrides.insert(kind.name().to_string(), parse_quality(kind.name(), &raw)?);
            }
        }
        Ok(Self::new(overrides, default_quality))
    }

    pub fn with_override(mut self, format: impl Into<String>, quality: u8) -> Self {
        self.overrides.insert(format.into(), quality);
        self
    }

    pub fn default_quality(&self) -> Option<u8> {
        self.default_quality
    }

    pub fn resolve(&self, format: &str) -> u8 {
        self.overrides
            .get(format)
            .copied()
            .or(self.default_quality)
            .unwrap_or(DEFAULT_QUALITY)
    }
}
