//! Extraction and batching configuration

use serde::Deserialize;

use crate::accumulator::DEFAULT_THRESHOLD_BYTES;
use crate::extractor::{FeedTags, Recovery};

/// Runtime configuration for the feed pipeline
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Byte budget per batch
    pub threshold_bytes: usize,
    /// Element names for items and their fields
    pub tags: FeedTags,
    /// Handling of items that are never closed
    pub recovery: Recovery,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold_bytes: DEFAULT_THRESHOLD_BYTES,
            tags: FeedTags::default(),
            recovery: Recovery::Lenient,
        }
    }
}
