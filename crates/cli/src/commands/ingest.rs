//! Ingest command handler.
//!
//! Rebuilds the corpus from the documents directory and atomically
//! replaces the persisted store.

use clap::Args;
use docqa_core::{AppConfig, AppResult};
use docqa_retrieval::sources;

/// Build (or rebuild) the corpus from the documents directory
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let documents_dir = config.documents_dir();
        tracing::info!("Executing ingest command for {:?}", documents_dir);

        let documents = sources::discover(&documents_dir, &super::extractor())?;
        if documents.is_empty() {
            tracing::warn!("No supported documents found in {:?}", documents_dir);
        }

        let retriever = super::open_retriever(config)?;
        let stats = retriever.ingest(&documents).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!(
                "Ingested {} documents ({} pages, {} chunks) in {:.2}s",
                stats.documents, stats.pages, stats.chunks, stats.duration_secs
            );
            if let Some(dimension) = stats.dimension {
                println!("Embedding dimension: {}", dimension);
            }
        }

        Ok(())
    }
}
