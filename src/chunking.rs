//! Whitespace-token text chunking.

use crate::error::{QuarryError, Result};

/// Splits text into overlapping windows of whitespace-delimited tokens.
///
/// Windows hold at most `max_tokens` tokens and the start advances by
/// `max_tokens - overlap` tokens per step, so consecutive chunks share
/// `overlap` tokens of context. The final window may be shorter. Empty or
/// all-whitespace input produces no chunks. Chunking is deterministic and
/// side-effect free.
///
/// # Example
///
/// ```rust
/// use quarry::chunking::TokenChunker;
///
/// let chunker = TokenChunker::new(3, 1).unwrap();
/// let chunks = chunker.chunk("a b c d e");
/// assert_eq!(chunks, vec!["a b c", "c d e", "e"]);
/// ```
#[derive(Debug, Clone)]
pub struct TokenChunker {
    max_tokens: usize,
    overlap: usize,
}

impl TokenChunker {
    /// Creates a chunker.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Config`] if `max_tokens` is zero or
    /// `overlap >= max_tokens` (which would make the window advance by zero
    /// and never terminate).
    pub fn new(max_tokens: usize, overlap: usize) -> Result<Self> {
        if max_tokens == 0 {
            return Err(QuarryError::Config("max_tokens must be non-zero".into()));
        }
        if overlap >= max_tokens {
            return Err(QuarryError::Config(format!(
                "overlap ({overlap}) must be less than max_tokens ({max_tokens})"
            )));
        }
        Ok(Self {
            max_tokens,
            overlap,
        })
    }

    /// Creates a chunker with the default window (500 tokens, 100 overlap).
    #[must_use]
    pub fn default_settings() -> Self {
        Self {
            max_tokens: 500,
            overlap: 100,
        }
    }

    /// Splits `text` into chunks, joining each window back with single
    /// spaces.
    #[must_use]
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let step = self.max_tokens - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < tokens.len() {
            let end = (start + self.max_tokens).min(tokens.len());
            chunks.push(tokens[start..end].join(" "));
            start += step;
        }

        chunks
    }

    /// Maximum tokens per chunk.
    #[must_use]
    pub const fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Tokens shared between consecutive chunks.
    #[must_use]
    pub const fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Default for TokenChunker {
    fn default() -> Self {
        Self::default_settings()
    }
}
