//! Incremental retrieval-augmented generation toolkit.
//!
//! The centerpiece is [`DocumentStore`], which glues any
//! [`EmbeddingModel`] to an exact in-memory similarity index and keeps
//! the mapping between logical documents and their chunk vectors
//! consistent across updates:
//! - [`DocumentStore::upsert`] chunks, embeds, and indexes a document,
//!   skipping re-embedding when the content hash is unchanged.
//! - [`DocumentStore::remove`] retires a document and all its vectors.
//! - [`DocumentStore::search`] returns whole-document results, nearest
//!   first, deduplicated across chunks.
//!
//! The store snapshots to three co-located JSON artifacts
//! ([`DocumentStore::persist`] / [`DocumentStore::restore`]), so an index
//! survives process restarts without re-embedding the corpus. On top of
//! it, [`ingest::ingest_directory`] walks a file tree into the store and
//! [`RetrievalPipeline`] turns retrieved context plus a
//! [`TextGenerator`] into grounded answers.
//!
//! # Example
//!
//! ```rust,no_run
//! use quarry::{DocumentStore, StoreConfig};
//! # use quarry::Embedding;
//! # struct MyEmbedder;
//! # impl quarry::EmbeddingModel for MyEmbedder {
//! #     fn dim(&self) -> usize { 3 }
//! #     async fn embed(&self, _text: &str) -> quarry_core::Result<Embedding> {
//! #         Ok(vec![0.0; 3])
//! #     }
//! # }
//!
//! # async fn run() -> quarry::Result<()> {
//! let store = DocumentStore::open(MyEmbedder, StoreConfig::default())?;
//! store.upsert("docs/intro.md", "hello world").await?;
//! let hits = store.search("greeting", 5).await?;
//! # Ok(())
//! # }
//! ```

pub mod chunking;
pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod persistence;
pub mod pipeline;
pub mod store;
pub mod types;

#[doc(inline)]
pub use self::chunking::TokenChunker;
#[doc(inline)]
pub use self::config::{StoreConfig, StoreConfigBuilder};
#[doc(inline)]
pub use self::error::{QuarryError, Result};
#[doc(inline)]
pub use self::index::FlatIndex;
#[doc(inline)]
pub use self::pipeline::{Answer, RetrievalPipeline};
#[doc(inline)]
pub use self::store::{DocumentStore, content_hash};
#[doc(inline)]
pub use self::types::{
    DocumentRecord, RemoveOutcome, SearchResult, UpsertOutcome, VectorEntry,
};

pub use quarry_core::{Embedding, EmbeddingModel, TextGenerator};
