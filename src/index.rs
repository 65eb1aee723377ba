//! Exact nearest-neighbour index over stable vector ids.

use std::collections::HashMap;

use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::error::{QuarryError, Result};
use crate::types::VectorEntry;

/// Exact squared-L2 similarity index.
///
/// Vectors are stored under caller-supplied `u64` ids; the index never
/// invents ids and never reuses a slot, so deleting one document cannot
/// shift another document's references. Search is a parallel linear scan:
/// query latency grows with corpus size, the documented trade-off for
/// corpora of thousands (not billions) of chunks in exchange for exact
/// results.
///
/// Distances are squared Euclidean, which orders identically to Euclidean.
/// No normalization is applied; callers wanting cosine ranking must insert
/// normalized vectors.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    vectors: HashMap<u64, Vec<f32>>,
}

impl FlatIndex {
    /// Creates an empty index with a fixed dimensionality.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Config`] for a zero dimension.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(QuarryError::Config(
                "index dimension must be non-zero".into(),
            ));
        }
        Ok(Self {
            dimension,
            vectors: HashMap::new(),
        })
    }

    /// Adds vectors under the given ids, all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Config`] if the id and vector counts differ
    /// or any id is already in use, and [`QuarryError::DimensionMismatch`]
    /// if any vector has the wrong length. Nothing is inserted on error.
    pub fn add(&mut self, ids: &[u64], vectors: Vec<Vec<f32>>) -> Result<()> {
        if ids.len() != vectors.len() {
            return Err(QuarryError::Config(format!(
                "id/vector count mismatch: {} ids, {} vectors",
                ids.len(),
                vectors.len()
            )));
        }
        for id in ids {
            if self.vectors.contains_key(id) {
                return Err(QuarryError::Config(format!("vector id {id} already in use")));
            }
        }
        for vector in &vectors {
            if vector.len() != self.dimension {
                return Err(QuarryError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }

        for (id, vector) in ids.iter().zip(vectors) {
            self.vectors.insert(*id, vector);
        }
        Ok(())
    }

    /// Removes the given ids. Absent ids are a no-op, so retried deletions
    /// after a partial persistence failure stay safe.
    pub fn remove(&mut self, ids: &[u64]) {
        for id in ids {
            self.vectors.remove(id);
        }
    }

    /// Returns up to `k` `(id, distance)` pairs, nearest first.
    ///
    /// An empty index (or `k == 0`) yields an empty result; fewer than `k`
    /// entries yield all of them. Ties break on id for determinism.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::DimensionMismatch`] if the query has the
    /// wrong length.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(u64, f32)>> {
        if query.len() != self.dimension {
            return Err(QuarryError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(u64, f32)> = self
            .vectors
            .par_iter()
            .map(|(&id, vector)| (id, squared_l2(query, vector)))
            .collect();

        scored.par_sort_unstable_by_key(|&(id, distance)| (OrderedFloat(distance), id));
        scored.truncate(k);
        Ok(scored)
    }

    /// Whether `id` is live in the index.
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.vectors.contains_key(&id)
    }

    /// Number of live vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns `true` if no vectors are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// The dimensionality fixed at construction.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// All entries, sorted by id, for snapshotting.
    #[must_use]
    pub fn entries(&self) -> Vec<VectorEntry> {
        let mut entries: Vec<VectorEntry> = self
            .vectors
            .iter()
            .map(|(&id, embedding)| VectorEntry {
                id,
                embedding: embedding.clone(),
            })
            .collect();
        entries.sort_unstable_by_key(|entry| entry.id);
        entries
    }

    /// Rebuilds an index from snapshot entries.
    ///
    /// # Errors
    ///
    /// Same validation as [`FlatIndex::add`]; duplicate ids or wrong-length
    /// embeddings reject the whole snapshot.
    pub fn from_entries(dimension: usize, entries: Vec<VectorEntry>) -> Result<Self> {
        let mut index = Self::new(dimension)?;
        for entry in entries {
            index.add(&[entry.id], vec![entry.embedding])?;
        }
        Ok(index)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
