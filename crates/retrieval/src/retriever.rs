//! Ingestion and query orchestration.
//!
//! The Retriever owns the corpus exclusively. Queries take a cheap snapshot
//! of the shared handle and never hold a lock across collaborator I/O;
//! rebuilds construct the replacement corpus entirely off to the side,
//! persist it, and swap the handle in one step. Readers therefore observe
//! either the old corpus or the new one, never a partial mix.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::chunker;
use crate::embeddings::EmbeddingProvider;
use crate::extract::DocumentExtractor;
use crate::sources::{self, SourceDocument};
use crate::store::CorpusStore;
use crate::types::{AttributedChunk, ChunkRecord, Corpus, CorpusStatus, IngestStats, StoreMeta};
use crate::vector_index::VectorIndex;
use docqa_core::{AppError, AppResult};

/// Number of embedding requests in flight during ingestion. Results are
/// collected back in chunk order regardless of completion order.
const EMBED_CONCURRENCY: usize = 4;

/// The loaded corpus together with its persisted metadata.
#[derive(Debug, Clone)]
struct Snapshot {
    corpus: Arc<Corpus>,
    meta: StoreMeta,
}

/// Orchestrates ingestion (documents → persisted corpus) and retrieval
/// (query → attributed chunks).
pub struct Retriever {
    store: CorpusStore,
    extractor: Arc<dyn DocumentExtractor>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunk_window: usize,
    chunk_overlap: usize,
    corpus: RwLock<Option<Snapshot>>,
}

impl Retriever {
    /// Create a retriever with no corpus loaded.
    ///
    /// Chunking parameters are validated eagerly so a misconfiguration
    /// surfaces at startup rather than mid-ingestion.
    pub fn new(
        store: CorpusStore,
        extractor: Arc<dyn DocumentExtractor>,
        embedder: Arc<dyn EmbeddingProvider>,
        chunk_window: usize,
        chunk_overlap: usize,
    ) -> AppResult<Self> {
        chunker::validate_params(chunk_window, chunk_overlap)?;

        Ok(Self {
            store,
            extractor,
            embedder,
            chunk_window,
            chunk_overlap,
            corpus: RwLock::new(None),
        })
    }

    /// Create a retriever and load the persisted corpus if one exists.
    pub fn open(
        store: CorpusStore,
        extractor: Arc<dyn DocumentExtractor>,
        embedder: Arc<dyn EmbeddingProvider>,
        chunk_window: usize,
        chunk_overlap: usize,
    ) -> AppResult<Self> {
        let retriever = Self::new(store, extractor, embedder, chunk_window, chunk_overlap)?;

        if let Some((corpus, meta)) = retriever.store.load()? {
            let mut guard = retriever.corpus.write().unwrap();
            *guard = Some(Snapshot {
                corpus: Arc::new(corpus),
                meta,
            });
        }

        Ok(retriever)
    }

    /// Rebuild the corpus from the given documents and replace the current
    /// one.
    ///
    /// The run is all-or-nothing: extraction or embedding failures abort it
    /// and leave both the persisted and the in-memory corpus untouched.
    /// Documents with no extractable text are valid input — the resulting
    /// empty corpus is persisted and reported, not treated as an error.
    pub async fn ingest(&self, documents: &[SourceDocument]) -> AppResult<IngestStats> {
        let start = Instant::now();

        tracing::info!("Ingesting {} documents", documents.len());

        let (records, pages) = self.collect_chunks(documents)?;

        let corpus = if records.is_empty() {
            tracing::warn!("No text extracted from any document; persisting empty corpus");
            Corpus::empty()
        } else {
            let vectors = self.embed_chunks(&records).await?;

            let mut index = VectorIndex::new();
            index.insert(vectors)?;
            Corpus::new(records, index)?
        };

        let fingerprint = sources::fingerprint(documents)?;
        self.store.save(&corpus, &fingerprint)?;

        let meta = self.store.load_meta()?.ok_or_else(|| {
            AppError::CorruptState("Store metadata missing right after save".to_string())
        })?;

        let stats = IngestStats {
            documents: documents.len(),
            pages,
            chunks: corpus.len(),
            dimension: corpus.index().dimension(),
            duration_secs: start.elapsed().as_secs_f64(),
        };

        // Publish the new corpus in one step
        {
            let mut guard = self.corpus.write().unwrap();
            *guard = Some(Snapshot {
                corpus: Arc::new(corpus),
                meta,
            });
        }

        tracing::info!(
            "Ingestion complete: {} documents, {} pages, {} chunks in {:.2}s",
            stats.documents,
            stats.pages,
            stats.chunks,
            stats.duration_secs
        );

        Ok(stats)
    }

    /// Retrieve the `k` chunks most relevant to `query`, nearest first.
    ///
    /// An absent or empty corpus yields an empty result without calling the
    /// embedding collaborator — "nothing ingested" is a normal answer, not
    /// an error.
    pub async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<AttributedChunk>> {
        let corpus = {
            let guard = self.corpus.read().unwrap();
            match guard.as_ref() {
                Some(snapshot) => Arc::clone(&snapshot.corpus),
                None => return Ok(Vec::new()),
            }
        };

        if corpus.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query).await?;
        let hits = corpus.index().search(&query_vector, k)?;

        // Out-of-range indices would mean a corpus/index desync; skip them
        // instead of failing the query
        let chunks: Vec<AttributedChunk> = hits
            .iter()
            .filter_map(|(index, _)| corpus.chunk(*index))
            .map(AttributedChunk::from)
            .collect();

        tracing::debug!(
            "Retrieved {} chunks for query (requested top-{})",
            chunks.len(),
            k
        );

        Ok(chunks)
    }

    /// Report corpus readiness.
    ///
    /// When the caller supplies the current document-set fingerprint, the
    /// report includes whether the loaded corpus is stale relative to it.
    pub fn status(&self, current_fingerprint: Option<&str>) -> CorpusStatus {
        let guard = self.corpus.read().unwrap();

        match guard.as_ref() {
            Some(snapshot) => CorpusStatus {
                ready: !snapshot.corpus.is_empty(),
                chunks: snapshot.corpus.len(),
                dimension: snapshot.corpus.index().dimension(),
                built_at: Some(snapshot.meta.built_at),
                stale: current_fingerprint.map(|fp| snapshot.meta.fingerprint != fp),
            },
            None => CorpusStatus {
                ready: false,
                chunks: 0,
                dimension: None,
                built_at: None,
                stale: current_fingerprint.map(|_| true),
            },
        }
    }

    /// Extract and chunk all documents, assigning sequence indices.
    fn collect_chunks(
        &self,
        documents: &[SourceDocument],
    ) -> AppResult<(Vec<ChunkRecord>, usize)> {
        let mut records = Vec::new();
        let mut pages_with_text = 0;

        for doc in documents {
            let pages = self.extractor.extract(&doc.path)?;

            for (page, text) in pages {
                if text.trim().is_empty() {
                    continue;
                }
                pages_with_text += 1;

                for content in chunker::split(&text, self.chunk_window, self.chunk_overlap)? {
                    records.push(ChunkRecord {
                        content,
                        source_id: doc.source_id.clone(),
                        page,
                        sequence_index: records.len(),
                    });
                }
            }
        }

        Ok((records, pages_with_text))
    }

    /// Embed all chunks, preserving chunk order.
    async fn embed_chunks(&self, records: &[ChunkRecord]) -> AppResult<Vec<Vec<f32>>> {
        tracing::info!(
            "Embedding {} chunks with provider '{}' (model: {})",
            records.len(),
            self.embedder.provider_name(),
            self.embedder.model_name()
        );

        stream::iter(records.iter().map(|record| {
            let embedder = Arc::clone(&self.embedder);
            let text = record.content.clone();
            async move { embedder.embed(&text).await }
        }))
        .buffered(EMBED_CONCURRENCY)
        .try_collect()
        .await
    }
}
