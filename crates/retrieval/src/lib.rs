//! Retrieval core for the docqa tool.
//!
//! Turns a directory of documents into a persisted corpus of embedded text
//! chunks (ingestion) and answers queries by exact nearest-neighbor search
//! over that corpus with source attribution (retrieval), feeding a
//! generation collaborator for grounded answers.

pub mod ask;
pub mod chunker;
pub mod embeddings;
pub mod extract;
pub mod prompt;
pub mod retriever;
pub mod sources;
pub mod store;
pub mod types;
pub mod vector_index;

// Re-export commonly used types
pub use ask::{ask, NO_INFORMATION_ANSWER};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use extract::{DocumentExtractor, PlainTextExtractor};
pub use retriever::Retriever;
pub use sources::SourceDocument;
pub use store::CorpusStore;
pub use types::{
    Answer, AttributedChunk, ChunkRecord, Corpus, CorpusStatus, IngestStats, StoreMeta,
};
pub use vector_index::VectorIndex;
