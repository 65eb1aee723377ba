//! Configuration for the document store.

use std::path::PathBuf;

/// Configuration for a [`DocumentStore`](crate::store::DocumentStore).
///
/// Chunking parameters are validated when the store is constructed, so an
/// `overlap >= max_chunk_tokens` config surfaces as a configuration error
/// instead of a chunker that never terminates.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the three snapshot artifacts.
    pub data_dir: PathBuf,
    /// Maximum whitespace tokens per chunk.
    pub max_chunk_tokens: usize,
    /// Tokens shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Default number of search results.
    pub default_top_k: usize,
    /// Whether mutations persist a snapshot before returning.
    pub auto_persist: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./quarry_index"),
            max_chunk_tokens: 500,
            chunk_overlap: 100,
            default_top_k: 5,
            auto_persist: true,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for custom configuration.
    #[must_use]
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::new()
    }
}

/// Builder for [`StoreConfig`].
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Creates a builder seeded with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: StoreConfig::default(),
        }
    }

    /// Sets the snapshot directory.
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Sets the maximum tokens per chunk.
    #[must_use]
    pub const fn max_chunk_tokens(mut self, tokens: usize) -> Self {
        self.config.max_chunk_tokens = tokens;
        self
    }

    /// Sets the token overlap between consecutive chunks.
    #[must_use]
    pub const fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Sets the default number of search results.
    #[must_use]
    pub const fn default_top_k(mut self, k: usize) -> Self {
        self.config.default_top_k = k;
        self
    }

    /// Enables or disables persisting after each mutation.
    #[must_use]
    pub const fn auto_persist(mut self, enabled: bool) -> Self {
        self.config.auto_persist = enabled;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> StoreConfig {
        self.config
    }
}
