//! Retrieval-augmented answering on top of the document store.

use std::sync::Arc;

use quarry_core::{EmbeddingModel, TextGenerator};

use crate::error::{QuarryError, Result};
use crate::store::DocumentStore;

/// System instructions used when the caller does not supply their own.
const DEFAULT_INSTRUCTIONS: &str = "You are a documentation assistant. Answer the \
question using only the numbered context passages. If the context does not \
contain the answer, say so instead of guessing.";

/// An answer produced by the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Answer {
    /// The generated answer text.
    pub text: String,
    /// Ids of the documents whose content was handed to the generator, in
    /// retrieval rank order, without duplicates.
    pub sources: Vec<String>,
}

/// Ties a [`DocumentStore`] to a [`TextGenerator`].
///
/// `answer` retrieves the nearest documents, assembles a numbered context
/// block, and hands context plus question to the generator. Retrieval and
/// generation failures surface as distinct error variants so callers can
/// tell an index problem from a provider outage.
pub struct RetrievalPipeline<M, G> {
    store: Arc<DocumentStore<M>>,
    generator: G,
    instructions: String,
}

impl<M, G> std::fmt::Debug for RetrievalPipeline<M, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalPipeline")
            .field("instructions", &self.instructions)
            .finish_non_exhaustive()
    }
}

impl<M, G> RetrievalPipeline<M, G>
where
    M: EmbeddingModel + Send + Sync + 'static,
    G: TextGenerator,
{
    /// Creates a pipeline with the default instructions.
    pub fn new(store: Arc<DocumentStore<M>>, generator: G) -> Self {
        Self {
            store,
            generator,
            instructions: DEFAULT_INSTRUCTIONS.to_owned(),
        }
    }

    /// Replaces the system instructions.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Answers `query` using the `k` nearest documents as context.
    ///
    /// With an empty store (or no hits) the generator still runs, with an
    /// empty context block, and `sources` is empty.
    ///
    /// # Errors
    ///
    /// [`QuarryError::Embedding`] if query embedding fails,
    /// [`QuarryError::Generation`] if the generator fails.
    pub async fn answer(&self, query: &str, k: usize) -> Result<Answer> {
        let results = self.store.search(query, k).await?;

        let context = results
            .iter()
            .enumerate()
            .map(|(idx, result)| format!("[{}] {}", idx + 1, result.content))
            .collect::<Vec<_>>()
            .join("\n");
        let sources: Vec<String> = results.into_iter().map(|r| r.doc_id).collect();

        let prompt = format!("Context:\n{context}\n\nQuestion: {query}\nAnswer:");
        tracing::debug!(query, sources = sources.len(), "generating answer");
        let text = self
            .generator
            .generate(&self.instructions, &prompt)
            .await
            .map_err(QuarryError::Generation)?;

        Ok(Answer { text, sources })
    }

    /// Answers `query` with the store's configured `default_top_k`.
    ///
    /// # Errors
    ///
    /// As for [`answer`](RetrievalPipeline::answer).
    pub async fn answer_default(&self, query: &str) -> Result<Answer> {
        self.answer(query, self.store.config().default_top_k).await
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &DocumentStore<M> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use parking_lot::Mutex;
    use quarry_core::Embedding;
    use tempfile::tempdir;

    struct WordEmbedder;

    impl EmbeddingModel for WordEmbedder {
        fn dim(&self) -> usize {
            3
        }

        async fn embed(&self, text: &str) -> quarry_core::Result<Embedding> {
            let mut embedding = vec![0.0; 3];
            for word in text.split_whitespace() {
                let bucket = match word {
                    "alpha" => 0,
                    "beta" => 1,
                    _ => 2,
                };
                embedding[bucket] += 1.0;
            }
            Ok(embedding)
        }
    }

    /// Echoes the prompt back and records what it was called with.
    struct CapturingGenerator {
        seen: Mutex<Vec<(String, String)>>,
    }

    impl CapturingGenerator {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for CapturingGenerator {
        async fn generate(&self, instructions: &str, prompt: &str) -> quarry_core::Result<String> {
            self.seen
                .lock()
                .push((instructions.to_owned(), prompt.to_owned()));
            Ok(format!("echo: {prompt}"))
        }
    }

    struct FailingGenerator;

    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _instructions: &str, _prompt: &str) -> quarry_core::Result<String> {
            anyhow::bail!("generation backend down")
        }
    }

    fn test_store() -> Arc<DocumentStore<WordEmbedder>> {
        let config = StoreConfig::builder()
            .data_dir(tempdir().unwrap().keep())
            .max_chunk_tokens(10)
            .chunk_overlap(0)
            .auto_persist(false)
            .build();
        Arc::new(DocumentStore::new(WordEmbedder, config).unwrap())
    }

    #[tokio::test]
    async fn answer_numbers_context_and_reports_sources() {
        let store = test_store();
        store.upsert("one.md", "alpha alpha").await.unwrap();
        store.upsert("two.md", "beta beta").await.unwrap();

        let pipeline = RetrievalPipeline::new(Arc::clone(&store), CapturingGenerator::new());
        let answer = pipeline.answer("alpha", 2).await.unwrap();

        assert_eq!(answer.sources, vec!["one.md", "two.md"]);
        let calls = pipeline.generator.seen.lock();
        let (instructions, prompt) = &calls[0];
        assert_eq!(instructions, DEFAULT_INSTRUCTIONS);
        assert!(prompt.contains("[1] alpha alpha"));
        assert!(prompt.contains("[2] beta beta"));
        assert!(prompt.contains("Question: alpha"));
    }

    #[tokio::test]
    async fn empty_store_still_answers_with_no_sources() {
        let pipeline = RetrievalPipeline::new(test_store(), CapturingGenerator::new());
        let answer = pipeline.answer("anything", 5).await.unwrap();

        assert!(answer.sources.is_empty());
        assert!(answer.text.starts_with("echo:"));
    }

    #[tokio::test]
    async fn custom_instructions_are_forwarded() {
        let store = test_store();
        store.upsert("doc", "alpha").await.unwrap();

        let pipeline = RetrievalPipeline::new(store, CapturingGenerator::new())
            .with_instructions("Answer in French.");
        pipeline.answer("alpha", 1).await.unwrap();

        let calls = pipeline.generator.seen.lock();
        assert_eq!(calls[0].0, "Answer in French.");
    }

    #[tokio::test]
    async fn generator_failure_maps_to_generation_error() {
        let pipeline = RetrievalPipeline::new(test_store(), FailingGenerator);
        let err = pipeline.answer("alpha", 1).await.unwrap_err();
        assert!(matches!(err, QuarryError::Generation(_)));
    }

    #[tokio::test]
    async fn answer_default_uses_store_top_k() {
        let store = test_store();
        store.upsert("one.md", "alpha").await.unwrap();

        let pipeline = RetrievalPipeline::new(store, CapturingGenerator::new());
        let answer = pipeline.answer_default("alpha").await.unwrap();
        assert_eq!(answer.sources, vec!["one.md"]);
    }
}
