//! Retrieval system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vector_index::VectorIndex;
use docqa_core::{AppError, AppResult};

/// One chunk of document text together with its provenance.
///
/// Immutable once created. `sequence_index` is the record's position in the
/// flat chunk list and the join key to vector `sequence_index` in the
/// corpus index: record *i* and vector *i* always describe the same chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Chunk text content
    pub content: String,

    /// Source document identifier (path relative to the documents dir)
    pub source_id: String,

    /// 1-based page number within the source document
    pub page: u32,

    /// Position in the flat chunk list; join key to the vector index
    pub sequence_index: usize,
}

/// A retrieved chunk with its source attribution, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedChunk {
    /// Chunk text content
    pub content: String,

    /// Source document identifier
    pub source_id: String,

    /// 1-based page number within the source document
    pub page: u32,
}

impl From<&ChunkRecord> for AttributedChunk {
    fn from(record: &ChunkRecord) -> Self {
        Self {
            content: record.content.clone(),
            source_id: record.source_id.clone(),
            page: record.page,
        }
    }
}

/// The chunk records and their vector index, treated as one unit.
///
/// Construction enforces the cardinality invariant: the number of records
/// always equals the number of indexed vectors. A corpus with zero chunks
/// is the valid **empty** state (documents processed, no extractable text).
#[derive(Debug)]
pub struct Corpus {
    chunks: Vec<ChunkRecord>,
    index: VectorIndex,
}

impl Corpus {
    /// Pair chunk records with their vector index.
    ///
    /// Fails with `CorruptState` when the cardinality invariant does not
    /// hold; mismatches are never silently truncated.
    pub fn new(chunks: Vec<ChunkRecord>, index: VectorIndex) -> AppResult<Self> {
        if chunks.len() != index.count() {
            return Err(AppError::CorruptState(format!(
                "{} chunk records but {} indexed vectors",
                chunks.len(),
                index.count()
            )));
        }
        Ok(Self { chunks, index })
    }

    /// Build the empty corpus (documents processed, zero chunks).
    pub fn empty() -> Self {
        Self {
            chunks: Vec::new(),
            index: VectorIndex::new(),
        }
    }

    /// Number of chunks in the corpus.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when the corpus holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Look up a chunk record by its sequence index.
    pub fn chunk(&self, sequence_index: usize) -> Option<&ChunkRecord> {
        self.chunks.get(sequence_index)
    }

    /// All chunk records in sequence order.
    pub fn chunks(&self) -> &[ChunkRecord] {
        &self.chunks
    }

    /// The vector index paired with the chunk records.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}

/// Metadata persisted alongside the corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreMeta {
    /// Embedding dimension, 0 for an empty corpus
    pub dimension: usize,

    /// Number of persisted chunk records
    pub chunk_count: usize,

    /// Fingerprint of the document set the corpus was built from
    pub fingerprint: String,

    /// When the corpus was built
    pub built_at: DateTime<Utc>,
}

/// Statistics from an ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    /// Number of source documents processed
    pub documents: usize,

    /// Number of pages with extractable text
    pub pages: usize,

    /// Number of chunks created
    pub chunks: usize,

    /// Embedding dimension of the built index, if any chunks were produced
    pub dimension: Option<usize>,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Corpus readiness report for the status operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStatus {
    /// True when a corpus with at least one chunk is loaded
    pub ready: bool,

    /// Number of chunks in the loaded corpus (0 when absent or empty)
    pub chunks: usize,

    /// Embedding dimension, when known
    pub dimension: Option<usize>,

    /// When the persisted corpus was built, when one exists
    pub built_at: Option<DateTime<Utc>>,

    /// Whether the document set changed since the last build, when that
    /// could be determined
    pub stale: Option<bool>,
}

/// A grounded answer: generated text plus the chunks that grounded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Generated answer text
    pub answer: String,

    /// Retrieved chunks in ranking order (nearest first)
    pub chunks: Vec<AttributedChunk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seq: usize) -> ChunkRecord {
        ChunkRecord {
            content: format!("chunk {}", seq),
            source_id: "doc.txt".to_string(),
            page: 1,
            sequence_index: seq,
        }
    }

    #[test]
    fn test_corpus_cardinality_enforced() {
        let mut index = VectorIndex::new();
        index.insert(vec![vec![1.0, 0.0]]).unwrap();

        let result = Corpus::new(vec![record(0), record(1)], index);
        assert!(matches!(result, Err(AppError::CorruptState(_))));
    }

    #[test]
    fn test_corpus_lookup() {
        let mut index = VectorIndex::new();
        index.insert(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();

        let corpus = Corpus::new(vec![record(0), record(1)], index).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.chunk(1).unwrap().content, "chunk 1");
        assert!(corpus.chunk(2).is_none());
    }

    #[test]
    fn test_empty_corpus() {
        let corpus = Corpus::empty();
        assert!(corpus.is_empty());
        assert_eq!(corpus.index().count(), 0);
    }
}
