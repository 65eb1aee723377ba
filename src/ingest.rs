//! Directory ingestion into a document store.

use std::fs;
use std::path::{Path, PathBuf};

use quarry_core::EmbeddingModel;

use crate::error::{QuarryError, Result};
use crate::store::DocumentStore;
use crate::types::UpsertOutcome;

/// Options controlling which files a directory walk picks up.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Case-insensitive file extensions to ingest, without leading dots.
    pub extensions: Vec<String>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["md".into(), "txt".into(), "json".into()],
        }
    }
}

impl IngestOptions {
    /// Options matching the given extensions.
    #[must_use]
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}

/// Per-outcome counts of one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents indexed for the first time.
    pub inserted: usize,
    /// Documents re-indexed because their content changed.
    pub updated: usize,
    /// Documents whose content was unchanged.
    pub skipped: usize,
    /// Files that could not be read.
    pub failed: usize,
}

impl IngestReport {
    /// Total files the walk attempted to ingest.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.inserted + self.updated + self.skipped + self.failed
    }

    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Progress event emitted per file during ingestion.
#[derive(Debug, Clone)]
pub enum IngestEvent {
    /// The file was handed to the store.
    Ingested {
        /// Path of the ingested file.
        path: PathBuf,
        /// What the store did with it.
        outcome: UpsertOutcome,
    },
    /// The file could not be read and was skipped.
    Skipped {
        /// Path of the skipped file.
        path: PathBuf,
        /// Why it was skipped.
        reason: String,
    },
}

/// Ingests every matching file under `dir` into the store.
///
/// Files are visited in sorted path order; the document id is the file's
/// path relative to `dir`, so re-running the ingest against the same tree
/// is idempotent. Unreadable files are counted as failed and skipped;
/// store errors abort the run.
///
/// # Errors
///
/// [`QuarryError::Persistence`] if the directory walk fails, plus any
/// error from [`DocumentStore::upsert`].
pub async fn ingest_directory<M>(
    store: &DocumentStore<M>,
    dir: impl AsRef<Path>,
    options: &IngestOptions,
) -> Result<IngestReport>
where
    M: EmbeddingModel + Send + Sync + 'static,
{
    ingest_directory_with_progress(store, dir, options, |_| {}).await
}

/// [`ingest_directory`] with a per-file progress callback.
///
/// # Errors
///
/// As for [`ingest_directory`].
pub async fn ingest_directory_with_progress<M, F>(
    store: &DocumentStore<M>,
    dir: impl AsRef<Path>,
    options: &IngestOptions,
    mut on_event: F,
) -> Result<IngestReport>
where
    M: EmbeddingModel + Send + Sync + 'static,
    F: FnMut(IngestEvent),
{
    let dir = dir.as_ref();
    let (files, unreadable) = collect_files(dir)?;
    let mut report = IngestReport::default();

    for (path, reason) in unreadable {
        if !options.matches(&path) {
            continue;
        }
        tracing::warn!(path = %path.display(), %reason, "skipping unreadable file");
        report.failed += 1;
        on_event(IngestEvent::Skipped { path, reason });
    }

    for path in files {
        if !options.matches(&path) {
            continue;
        }
        let doc_id = path
            .strip_prefix(dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .into_owned();

        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "skipping unreadable file");
                report.failed += 1;
                on_event(IngestEvent::Skipped {
                    path,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let outcome = store.upsert(&doc_id, &content).await?;
        report.record(outcome);
        on_event(IngestEvent::Ingested { path, outcome });
    }

    tracing::info!(
        dir = %dir.display(),
        inserted = report.inserted,
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failed,
        "directory ingested"
    );
    Ok(report)
}

type WalkOutcome = (Vec<PathBuf>, Vec<(PathBuf, String)>);

fn collect_files(root: &Path) -> Result<WalkOutcome> {
    let io_error = |source| QuarryError::Persistence {
        path: root.to_path_buf(),
        source,
    };

    let mut stack = vec![root.to_path_buf()];
    let mut files = Vec::new();
    let mut unreadable = Vec::new();

    while let Some(path) = stack.pop() {
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) => {
                unreadable.push((path, err.to_string()));
                continue;
            }
        };

        if metadata.is_dir() {
            for entry in fs::read_dir(&path).map_err(io_error)? {
                stack.push(entry.map_err(io_error)?.path());
            }
        } else if metadata.is_file() {
            files.push(path);
        }
    }

    files.sort();
    unreadable.sort();
    Ok((files, unreadable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use quarry_core::Embedding;
    use tempfile::tempdir;

    struct LengthEmbedder;

    impl EmbeddingModel for LengthEmbedder {
        fn dim(&self) -> usize {
            2
        }

        #[allow(clippy::cast_precision_loss)]
        async fn embed(&self, text: &str) -> quarry_core::Result<Embedding> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    fn test_store() -> DocumentStore<LengthEmbedder> {
        let config = StoreConfig::builder()
            .data_dir(tempdir().unwrap().keep())
            .max_chunk_tokens(10)
            .chunk_overlap(0)
            .auto_persist(false)
            .build();
        DocumentStore::new(LengthEmbedder, config).unwrap()
    }

    #[tokio::test]
    async fn ingests_matching_files_and_filters_the_rest() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "first document").unwrap();
        fs::write(dir.path().join("b.txt"), "second document").unwrap();
        fs::write(dir.path().join("logo.png"), [0u8, 159, 146, 150]).unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("c.md"), "third document").unwrap();

        let store = test_store();
        let report = ingest_directory(&store, dir.path(), &IngestOptions::default())
            .await
            .unwrap();

        assert_eq!(report.inserted, 3);
        assert_eq!(report.total(), 3);
        assert_eq!(store.len(), 3);
        assert!(store.get("a.md").is_some());
        assert!(store.get(&Path::new("nested").join("c.md").to_string_lossy()).is_some());
        assert!(store.get("logo.png").is_none());
    }

    #[tokio::test]
    async fn second_run_skips_unchanged_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "stable content").unwrap();
        fs::write(dir.path().join("b.md"), "will change").unwrap();

        let store = test_store();
        let options = IngestOptions::default();
        ingest_directory(&store, dir.path(), &options).await.unwrap();

        fs::write(dir.path().join("b.md"), "has changed now").unwrap();
        let report = ingest_directory(&store, dir.path(), &options).await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.inserted, 0);
    }

    #[tokio::test]
    async fn progress_events_cover_every_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "alpha").unwrap();
        fs::write(dir.path().join("b.md"), "beta").unwrap();

        let store = test_store();
        let mut seen = Vec::new();
        ingest_directory_with_progress(&store, dir.path(), &IngestOptions::default(), |event| {
            seen.push(event);
        })
        .await
        .unwrap();

        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|event| matches!(
            event,
            IngestEvent::Ingested {
                outcome: UpsertOutcome::Inserted,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn invalid_utf8_file_is_counted_as_failed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("good.md"), "fine").unwrap();
        fs::write(dir.path().join("bad.md"), [0xff, 0xfe, 0xfd]).unwrap();

        let store = test_store();
        let report = ingest_directory(&store, dir.path(), &IngestOptions::default())
            .await
            .unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.failed, 1);
        assert!(store.get("good.md").is_some());
        assert!(store.get("bad.md").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stat_failure_is_counted_as_failed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("good.md"), "fine").unwrap();
        // A dangling symlink fails the metadata call, not the read.
        std::os::unix::fs::symlink(
            dir.path().join("missing.md"),
            dir.path().join("broken.md"),
        )
        .unwrap();

        let store = test_store();
        let mut skipped = Vec::new();
        let report =
            ingest_directory_with_progress(&store, dir.path(), &IngestOptions::default(), |event| {
                if let IngestEvent::Skipped { path, .. } = event {
                    skipped.push(path);
                }
            })
            .await
            .unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.total(), 2);
        assert_eq!(skipped, vec![dir.path().join("broken.md")]);
        assert!(store.get("broken.md").is_none());
    }

    #[tokio::test]
    async fn custom_extensions_override_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("b.md"), "readme").unwrap();

        let store = test_store();
        let options = IngestOptions::with_extensions(["rs"]);
        let report = ingest_directory(&store, dir.path(), &options).await.unwrap();

        assert_eq!(report.inserted, 1);
        assert!(store.get("a.rs").is_some());
        assert!(store.get("b.md").is_none());
    }

    #[tokio::test]
    async fn empty_directory_yields_empty_report() {
        let dir = tempdir().unwrap();
        let store = test_store();
        let report = ingest_directory(&store, dir.path(), &IngestOptions::default())
            .await
            .unwrap();
        assert_eq!(report, IngestReport::default());
    }
}
