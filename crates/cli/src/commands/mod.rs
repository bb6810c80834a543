//! Command handlers for the docqa CLI.

mod ask;
mod ingest;
mod status;

pub use ask::AskCommand;
pub use ingest::IngestCommand;
pub use status::StatusCommand;

use docqa_core::{AppConfig, AppResult};
use docqa_retrieval::{
    create_provider, CorpusStore, DocumentExtractor, PlainTextExtractor, Retriever,
};
use std::sync::Arc;

/// Build a retriever from the application configuration, loading the
/// persisted corpus when one exists.
pub(crate) fn open_retriever(config: &AppConfig) -> AppResult<Retriever> {
    let store = CorpusStore::new(config.store_path());
    let extractor: Arc<dyn DocumentExtractor> = Arc::new(PlainTextExtractor::new());
    let embedder = create_provider(
        &config.provider,
        &config.embedding_model,
        config.embedding_dimensions,
        config.endpoint.as_deref(),
    )?;

    Retriever::open(
        store,
        extractor,
        embedder,
        config.chunk_window,
        config.chunk_overlap,
    )
}

/// The extractor used for document discovery, matching the one ingestion
/// runs with.
pub(crate) fn extractor() -> PlainTextExtractor {
    PlainTextExtractor::new()
}
