//! Snapshot persistence for the document store.
//!
//! A snapshot is three co-located JSON artifacts that are always read and
//! written together:
//!
//! - `vectors.json` — the serialized similarity index (dimension plus
//!   id→embedding entries),
//! - `records.json` — the `doc_id → DocumentRecord` table plus the
//!   monotonic `next_vector_id` counter,
//! - `vector_map.json` — the `vector_id → doc_id` back-reference.
//!
//! Writes serialize all three payloads first, land them in temporary
//! siblings, and only then rename each into place, so a failure partway
//! never replaces a good snapshot with a torn one. Loads refuse a
//! partially present triple instead of silently reconstructing an
//! inconsistent store.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{QuarryError, Result};
use crate::types::{DocumentRecord, VectorEntry};

const VECTORS_FILE: &str = "vectors.json";
const RECORDS_FILE: &str = "records.json";
const VECTOR_MAP_FILE: &str = "vector_map.json";

/// In-memory form of one persisted store snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Index dimensionality.
    pub dimension: usize,
    /// Next vector id to hand out; ids below it are never reissued.
    pub next_vector_id: u64,
    /// Live index entries, sorted by id.
    pub entries: Vec<VectorEntry>,
    /// Document records, sorted by `doc_id`.
    pub records: Vec<DocumentRecord>,
    /// `vector_id → doc_id` back-reference, sorted by id.
    pub vector_map: Vec<(u64, String)>,
}

#[derive(Serialize, Deserialize)]
struct VectorsFile {
    dimension: usize,
    entries: Vec<VectorEntry>,
}

#[derive(Serialize, Deserialize)]
struct RecordsFile {
    next_vector_id: u64,
    records: Vec<DocumentRecord>,
}

#[derive(Serialize, Deserialize)]
struct VectorMapFile {
    map: Vec<(u64, String)>,
}

fn io_error(path: &Path, source: io::Error) -> QuarryError {
    QuarryError::Persistence {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes all three snapshot artifacts into `dir`, replacing any previous
/// snapshot atomically per artifact.
///
/// # Errors
///
/// [`QuarryError::Serialization`] if any payload fails to serialize (disk
/// untouched), [`QuarryError::Persistence`] on I/O failure.
pub fn write_snapshot(dir: &Path, snapshot: &Snapshot) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

    let vectors = VectorsFile {
        dimension: snapshot.dimension,
        entries: snapshot.entries.clone(),
    };
    let records = RecordsFile {
        next_vector_id: snapshot.next_vector_id,
        records: snapshot.records.clone(),
    };
    let vector_map = VectorMapFile {
        map: snapshot.vector_map.clone(),
    };

    // Serialize everything before touching the previous snapshot on disk.
    let payloads = [
        (VECTORS_FILE, to_json(&vectors)?),
        (RECORDS_FILE, to_json(&records)?),
        (VECTOR_MAP_FILE, to_json(&vector_map)?),
    ];

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(payloads.len());
    for (name, payload) in &payloads {
        let tmp = dir.join(format!("{name}.tmp"));
        fs::write(&tmp, payload).map_err(|e| io_error(&tmp, e))?;
        staged.push((tmp, dir.join(name)));
    }
    for (tmp, target) in staged {
        fs::rename(&tmp, &target).map_err(|e| io_error(&target, e))?;
    }
    Ok(())
}

/// Reads a snapshot from `dir`.
///
/// Returns `Ok(None)` when no snapshot exists (all three artifacts
/// absent).
///
/// # Errors
///
/// [`QuarryError::Snapshot`] when only some artifacts are present,
/// [`QuarryError::Persistence`] / [`QuarryError::Serialization`] on read
/// or parse failure.
pub fn read_snapshot(dir: &Path) -> Result<Option<Snapshot>> {
    let paths = [
        dir.join(VECTORS_FILE),
        dir.join(RECORDS_FILE),
        dir.join(VECTOR_MAP_FILE),
    ];
    let present = paths.iter().filter(|p| p.exists()).count();
    if present == 0 {
        return Ok(None);
    }
    if present < paths.len() {
        return Err(QuarryError::Snapshot(format!(
            "{} of {} snapshot artifacts present in {}",
            present,
            paths.len(),
            dir.display()
        )));
    }

    let vectors: VectorsFile = from_json_file(&paths[0])?;
    let records: RecordsFile = from_json_file(&paths[1])?;
    let vector_map: VectorMapFile = from_json_file(&paths[2])?;

    Ok(Some(Snapshot {
        dimension: vectors.dimension,
        next_vector_id: records.next_vector_id,
        entries: vectors.entries,
        records: records.records,
        vector_map: vector_map.map,
    }))
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| QuarryError::Serialization(e.to_string()))
}

fn from_json_file<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| io_error(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| QuarryError::Serialization(e.to_string()))
}
