//! Core data types for the document store.

use serde::{Deserialize, Serialize};

/// One ingested logical document.
///
/// Invariant: `chunks` and `vector_ids` have the same length and the same
/// order, and every id in `vector_ids` is live in the similarity index.
/// Re-upserting a `doc_id` replaces the whole record, never appends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Stable unique identifier, typically a file path or repo-relative path.
    pub doc_id: String,
    /// Digest of the text handed to the chunker, used to skip no-op
    /// re-ingestion.
    pub content_hash: u64,
    /// Full extracted text, kept for context re-display.
    pub content: String,
    /// Ordered text chunks derived from `content`.
    pub chunks: Vec<String>,
    /// Similarity-index ids, one per chunk, in chunk order.
    pub vector_ids: Vec<u64>,
}

/// One embedding vector under its stable id, as stored by the index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    /// Process-lifetime-unique handle, never reused after deletion.
    pub id: u64,
    /// The embedding vector.
    pub embedding: Vec<f32>,
}

/// A whole-document search hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Identifier of the matching document.
    pub doc_id: String,
    /// Full document text.
    pub content: String,
    /// The document's chunks, in order.
    pub chunks: Vec<String>,
    /// Squared Euclidean distance of the document's nearest chunk to the
    /// query (smaller is closer).
    pub distance: f32,
}

/// What an upsert did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The document id was new.
    Inserted,
    /// The document existed with a different content hash and was replaced.
    Updated,
    /// The document existed with the same content hash; nothing was touched.
    Skipped,
}

/// What a removal did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The document and all its vectors were removed.
    Removed,
    /// No such document; the store is unchanged.
    NotFound,
}
