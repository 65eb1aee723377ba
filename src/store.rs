//! The document store: the state machine owning the mapping between
//! documents, content hashes, chunks, and embedding vectors.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use quarry_core::EmbeddingModel;
use xxhash_rust::xxh3::xxh3_64;

use crate::chunking::TokenChunker;
use crate::config::StoreConfig;
use crate::error::{QuarryError, Result};
use crate::index::FlatIndex;
use crate::persistence::{self, Snapshot};
use crate::types::{DocumentRecord, RemoveOutcome, SearchResult, UpsertOutcome};

/// Canonical content hash: xxh3 over the exact text handed to the chunker.
///
/// Ingesters that prefer hashing original source bytes can compute their
/// own digest and pass it through
/// [`DocumentStore::upsert_with_hash`]; whichever input is chosen must be
/// reproducible across ingestion runs for the skip optimization to hold.
#[must_use]
pub fn content_hash(text: &str) -> u64 {
    xxh3_64(text.as_bytes())
}

/// Mutable store state, guarded as one unit so an upsert's index mutation,
/// record swap, and back-reference update are a single atomic step to
/// readers.
struct StoreState {
    index: FlatIndex,
    records: HashMap<String, DocumentRecord>,
    doc_by_vector: HashMap<u64, String>,
    next_vector_id: u64,
}

impl StoreState {
    fn empty(dimension: usize) -> Result<Self> {
        Ok(Self {
            index: FlatIndex::new(dimension)?,
            records: HashMap::new(),
            doc_by_vector: HashMap::new(),
            next_vector_id: 0,
        })
    }

    fn to_snapshot(&self) -> Snapshot {
        let mut records: Vec<DocumentRecord> = self.records.values().cloned().collect();
        records.sort_unstable_by(|a, b| a.doc_id.cmp(&b.doc_id));

        let mut vector_map: Vec<(u64, String)> = self
            .doc_by_vector
            .iter()
            .map(|(&id, doc_id)| (id, doc_id.clone()))
            .collect();
        vector_map.sort_unstable_by_key(|&(id, _)| id);

        Snapshot {
            dimension: self.index.dimension(),
            next_vector_id: self.next_vector_id,
            entries: self.index.entries(),
            records,
            vector_map,
        }
    }

    fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let Snapshot {
            dimension,
            next_vector_id,
            entries,
            records,
            vector_map,
        } = snapshot;

        let index = FlatIndex::from_entries(dimension, entries)?;
        let doc_by_vector: HashMap<u64, String> = vector_map.into_iter().collect();

        let mut record_map = HashMap::with_capacity(records.len());
        for record in records {
            if record.chunks.len() != record.vector_ids.len() {
                return Err(QuarryError::Snapshot(format!(
                    "record {} has {} chunks but {} vector ids",
                    record.doc_id,
                    record.chunks.len(),
                    record.vector_ids.len()
                )));
            }
            for &id in &record.vector_ids {
                if !index.contains(id) {
                    return Err(QuarryError::Snapshot(format!(
                        "record {} references vector id {id} absent from the index",
                        record.doc_id
                    )));
                }
                if doc_by_vector.get(&id) != Some(&record.doc_id) {
                    return Err(QuarryError::Snapshot(format!(
                        "vector id {id} is not mapped back to record {}",
                        record.doc_id
                    )));
                }
                if id >= next_vector_id {
                    return Err(QuarryError::Snapshot(format!(
                        "vector id {id} is not below next_vector_id {next_vector_id}"
                    )));
                }
            }
            record_map.insert(record.doc_id.clone(), record);
        }

        if doc_by_vector.len() != index.len() {
            return Err(QuarryError::Snapshot(format!(
                "{} back-references for {} index entries",
                doc_by_vector.len(),
                index.len()
            )));
        }
        for (id, doc_id) in &doc_by_vector {
            let Some(record) = record_map.get(doc_id) else {
                return Err(QuarryError::Snapshot(format!(
                    "vector id {id} maps to unknown record {doc_id}"
                )));
            };
            if !record.vector_ids.contains(id) {
                return Err(QuarryError::Snapshot(format!(
                    "vector id {id} is not listed by record {doc_id}"
                )));
            }
        }

        Ok(Self {
            index,
            records: record_map,
            doc_by_vector,
            next_vector_id,
        })
    }
}

/// Incremental vector index over logical documents.
///
/// Owns the `doc_id → record` table, the `vector_id → doc_id`
/// back-reference, and the similarity index, and keeps them consistent
/// across idempotent upserts, deletions, and searches. All mutable state
/// sits behind one lock; embedding-provider calls run outside it, so
/// concurrent upserts of different documents overlap their (slow) provider
/// calls while index mutation stays serialized.
pub struct DocumentStore<M> {
    embedder: Arc<M>,
    chunker: TokenChunker,
    config: StoreConfig,
    state: RwLock<StoreState>,
    persist_lock: Mutex<()>,
}

impl<M> std::fmt::Debug for DocumentStore<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("DocumentStore")
            .field("documents", &state.records.len())
            .field("vectors", &state.index.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<M> DocumentStore<M>
where
    M: EmbeddingModel + Send + Sync + 'static,
{
    /// Creates an empty store.
    ///
    /// # Errors
    ///
    /// [`QuarryError::Config`] for invalid chunking parameters or a
    /// zero-dimension embedder.
    pub fn new(embedder: M, config: StoreConfig) -> Result<Self> {
        let chunker = TokenChunker::new(config.max_chunk_tokens, config.chunk_overlap)?;
        let state = StoreState::empty(embedder.dim())?;
        Ok(Self {
            embedder: Arc::new(embedder),
            chunker,
            config,
            state: RwLock::new(state),
            persist_lock: Mutex::new(()),
        })
    }

    /// Creates a store and restores the snapshot in `config.data_dir`, if
    /// one exists.
    ///
    /// # Errors
    ///
    /// Construction errors as for [`DocumentStore::new`], plus restore
    /// errors as for [`DocumentStore::restore`].
    pub fn open(embedder: M, config: StoreConfig) -> Result<Self> {
        let store = Self::new(embedder, config)?;
        store.restore()?;
        Ok(store)
    }

    /// Inserts or updates a document, hashing `content` with
    /// [`content_hash`].
    ///
    /// Unchanged content is skipped without re-embedding. Otherwise the
    /// content is chunked, the chunks are embedded in one batch, a fresh
    /// contiguous block of vector ids is added to the index, any previous
    /// generation of vectors is retired, and the record is replaced —
    /// all of that as one atomic step to readers. The snapshot is
    /// persisted before returning when `auto_persist` is set.
    ///
    /// # Errors
    ///
    /// [`QuarryError::Embedding`] if the provider fails (state unchanged),
    /// [`QuarryError::Persistence`] / [`QuarryError::Serialization`] if
    /// the snapshot write fails (in-memory mutation kept; retry
    /// [`persist`](DocumentStore::persist)).
    pub async fn upsert(&self, doc_id: &str, content: &str) -> Result<UpsertOutcome> {
        self.upsert_with_hash(doc_id, content, content_hash(content))
            .await
    }

    /// [`upsert`](DocumentStore::upsert) with a caller-supplied digest,
    /// for ingesters that hash original source bytes instead of extracted
    /// text.
    ///
    /// # Errors
    ///
    /// As for [`upsert`](DocumentStore::upsert).
    pub async fn upsert_with_hash(
        &self,
        doc_id: &str,
        content: &str,
        hash: u64,
    ) -> Result<UpsertOutcome> {
        if self.is_unchanged(doc_id, hash) {
            tracing::debug!(doc_id, "content unchanged, skipping re-embedding");
            return Ok(UpsertOutcome::Skipped);
        }

        let chunks = self.chunker.chunk(content);
        let embeddings = if chunks.is_empty() {
            Vec::new()
        } else {
            self.embedder
                .embed_batch(&chunks)
                .await
                .map_err(QuarryError::Embedding)?
        };
        if embeddings.len() != chunks.len() {
            return Err(QuarryError::Embedding(anyhow::anyhow!(
                "embedding provider returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let outcome = {
            let mut state = self.state.write();
            // A concurrent upsert may have landed the same content first.
            if state
                .records
                .get(doc_id)
                .is_some_and(|record| record.content_hash == hash)
            {
                return Ok(UpsertOutcome::Skipped);
            }

            let first_id = state.next_vector_id;
            let ids: Vec<u64> = (first_id..first_id + embeddings.len() as u64).collect();
            state.index.add(&ids, embeddings)?;
            state.next_vector_id += ids.len() as u64;
            for &id in &ids {
                state.doc_by_vector.insert(id, doc_id.to_owned());
            }

            let record = DocumentRecord {
                doc_id: doc_id.to_owned(),
                content_hash: hash,
                content: content.to_owned(),
                chunks,
                vector_ids: ids,
            };
            match state.records.insert(doc_id.to_owned(), record) {
                Some(previous) => {
                    state.index.remove(&previous.vector_ids);
                    for id in &previous.vector_ids {
                        state.doc_by_vector.remove(id);
                    }
                    UpsertOutcome::Updated
                }
                None => UpsertOutcome::Inserted,
            }
        };

        tracing::info!(doc_id, ?outcome, "document upserted");
        if self.config.auto_persist {
            self.persist()?;
        }
        Ok(outcome)
    }

    /// Upserts `(doc_id, content)` pairs in order, stopping at the first
    /// error.
    ///
    /// # Errors
    ///
    /// As for [`upsert`](DocumentStore::upsert).
    pub async fn upsert_batch(&self, documents: &[(String, String)]) -> Result<Vec<UpsertOutcome>> {
        let mut outcomes = Vec::with_capacity(documents.len());
        for (doc_id, content) in documents {
            outcomes.push(self.upsert(doc_id, content).await?);
        }
        Ok(outcomes)
    }

    /// Removes a document and retires all its vectors.
    ///
    /// Removing an unknown `doc_id` returns
    /// [`RemoveOutcome::NotFound`] and leaves the store untouched —
    /// ingestion pipelines call this speculatively for files that may
    /// never have been indexed.
    ///
    /// # Errors
    ///
    /// [`QuarryError::Persistence`] / [`QuarryError::Serialization`] if
    /// the snapshot write fails after the in-memory removal.
    pub fn remove(&self, doc_id: &str) -> Result<RemoveOutcome> {
        let removed = {
            let mut state = self.state.write();
            match state.records.remove(doc_id) {
                Some(record) => {
                    state.index.remove(&record.vector_ids);
                    for id in &record.vector_ids {
                        state.doc_by_vector.remove(id);
                    }
                    true
                }
                None => false,
            }
        };

        if !removed {
            return Ok(RemoveOutcome::NotFound);
        }
        tracing::info!(doc_id, "document removed");
        if self.config.auto_persist {
            self.persist()?;
        }
        Ok(RemoveOutcome::Removed)
    }

    /// Embeds the query and returns up to `k` whole-document results,
    /// nearest first.
    ///
    /// The top-`k` vector hits are resolved through the back-reference and
    /// deduplicated by `doc_id`, keeping each document's nearest rank, so
    /// callers receive whole-document context instead of per-chunk
    /// duplicates. An empty index yields an empty result.
    ///
    /// # Errors
    ///
    /// [`QuarryError::Embedding`] if the provider fails.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(QuarryError::Embedding)?;

        let state = self.state.read();
        let hits = state.index.search(&query_embedding, k)?;

        let mut results: Vec<SearchResult> = Vec::new();
        for (vector_id, distance) in hits {
            let Some(doc_id) = state.doc_by_vector.get(&vector_id) else {
                continue;
            };
            if results.iter().any(|result| &result.doc_id == doc_id) {
                continue;
            }
            let Some(record) = state.records.get(doc_id) else {
                continue;
            };
            results.push(SearchResult {
                doc_id: doc_id.clone(),
                content: record.content.clone(),
                chunks: record.chunks.clone(),
                distance,
            });
        }
        Ok(results)
    }

    /// [`search`](DocumentStore::search) with the configured
    /// `default_top_k`.
    ///
    /// # Errors
    ///
    /// As for [`search`](DocumentStore::search).
    pub async fn search_default(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.search(query, self.config.default_top_k).await
    }

    /// Writes the three snapshot artifacts to `config.data_dir`.
    ///
    /// # Errors
    ///
    /// [`QuarryError::Persistence`] / [`QuarryError::Serialization`].
    pub fn persist(&self) -> Result<()> {
        // The write phase stages through fixed tmp paths and must not
        // interleave with another persist of the same directory.
        let _write_phase = self.persist_lock.lock();
        let snapshot = self.state.read().to_snapshot();
        persistence::write_snapshot(&self.config.data_dir, &snapshot)?;
        tracing::debug!(dir = %self.config.data_dir.display(), "snapshot persisted");
        Ok(())
    }

    /// Replaces the in-memory state with the snapshot in
    /// `config.data_dir`, returning the number of restored documents.
    /// With no snapshot on disk this is a no-op returning 0.
    ///
    /// # Errors
    ///
    /// [`QuarryError::Snapshot`] for a partial or inconsistent snapshot,
    /// [`QuarryError::DimensionMismatch`] if the snapshot was built with a
    /// different embedding dimensionality than the current model.
    pub fn restore(&self) -> Result<usize> {
        let Some(snapshot) = persistence::read_snapshot(&self.config.data_dir)? else {
            return Ok(0);
        };
        if snapshot.dimension != self.embedder.dim() {
            return Err(QuarryError::DimensionMismatch {
                expected: self.embedder.dim(),
                actual: snapshot.dimension,
            });
        }
        let state = StoreState::from_snapshot(snapshot)?;
        let count = state.records.len();
        *self.state.write() = state;
        tracing::info!(documents = count, "snapshot restored");
        Ok(count)
    }

    /// Returns the record for `doc_id`, if any.
    #[must_use]
    pub fn get(&self, doc_id: &str) -> Option<DocumentRecord> {
        self.state.read().records.get(doc_id).cloned()
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    /// Returns `true` if no documents are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }

    /// Number of live vectors across all documents.
    #[must_use]
    pub fn vector_count(&self) -> usize {
        self.state.read().index.len()
    }

    /// The store configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The embedding model.
    #[must_use]
    pub fn embedder(&self) -> &M {
        &self.embedder
    }

    fn is_unchanged(&self, doc_id: &str, hash: u64) -> bool {
        self.state
            .read()
            .records
            .get(doc_id)
            .is_some_and(|record| record.content_hash == hash)
    }
}
