//! Ask command handler.

use clap::Args;
use docqa_core::{AppConfig, AppResult};
use docqa_retrieval::sources;

/// Ask a question against the document corpus
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Question text
    pub query: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let retriever = super::open_retriever(config)?;

        // Warn when the corpus no longer matches the documents on disk;
        // answering continues against the loaded corpus either way
        let documents = sources::discover(&config.documents_dir(), &super::extractor())?;
        let fingerprint = sources::fingerprint(&documents)?;
        let status = retriever.status(Some(&fingerprint));
        if status.stale == Some(true) && status.ready {
            tracing::warn!(
                "Document set changed since the corpus was built; run 'docqa ingest' to refresh"
            );
        }

        let llm = docqa_llm::create_client(&config.provider, config.endpoint.as_deref())?;
        let top_k = self.top_k.unwrap_or(config.top_k);

        let answer = docqa_retrieval::ask(
            &retriever,
            llm.as_ref(),
            &config.model,
            &self.query,
            top_k,
        )
        .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            println!("{}", answer.answer);

            if !answer.chunks.is_empty() {
                println!();
                println!("Sources:");
                for chunk in &answer.chunks {
                    println!("- {} (page {})", chunk.source_id, chunk.page);
                }
            }
        }

        Ok(())
    }
}
