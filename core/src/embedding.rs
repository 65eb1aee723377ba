//! Text embedding traits.
//!
//! An embedding model turns text into a dense vector whose geometry encodes
//! semantic similarity: nearby vectors mean related text. The engine uses
//! one model instance per index, and the index's dimensionality is fixed to
//! the model's [`dim`](EmbeddingModel::dim) at construction time — swapping
//! in a model of a different dimensionality (or a retrained model of the
//! same dimensionality) invalidates any persisted index built with the old
//! one. That is an operational hazard for the deployment to manage, not
//! something this trait can detect.

use alloc::string::String;
use alloc::vec::Vec;
use core::future::Future;

/// A type alias for an embedding vector of 32-bit floats.
pub type Embedding = Vec<f32>;

/// Converts text to vector representations.
///
/// # Implementation Requirements
///
/// - [`embed`](EmbeddingModel::embed) must return vectors with length equal
///   to [`dim`](EmbeddingModel::dim).
/// - Vectors are used as-is under Euclidean distance; models whose scores
///   are meant to be cosine similarities should return normalized vectors.
///
/// # Example
///
/// ```rust
/// use quarry_core::EmbeddingModel;
///
/// struct MyEmbedding;
///
/// impl EmbeddingModel for MyEmbedding {
///     fn dim(&self) -> usize {
///         384
///     }
///
///     async fn embed(&self, text: &str) -> quarry_core::Result<Vec<f32>> {
///         let _ = text; // a real implementation would call the model here
///         Ok(vec![0.0; self.dim()])
///     }
/// }
/// ```
pub trait EmbeddingModel: Send + Sync + Sized {
    /// Returns the embedding vector dimension.
    fn dim(&self) -> usize;

    /// Converts one text to an embedding vector of length [`Self::dim`].
    fn embed(&self, text: &str) -> impl Future<Output = crate::Result<Embedding>> + Send;

    /// Converts a batch of texts to embedding vectors, in order.
    ///
    /// The default implementation embeds sequentially; providers with a
    /// native batch endpoint should override it to cut round trips.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = crate::Result<Vec<Embedding>>> + Send {
        async move {
            let mut embeddings = Vec::with_capacity(texts.len());
            for text in texts {
                embeddings.push(self.embed(text).await?);
            }
            Ok(embeddings)
        }
    }
}
