//! Status command handler.

use clap::Args;
use docqa_core::{AppConfig, AppResult};
use docqa_retrieval::sources;

/// Show corpus readiness and staleness
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing status command");

        let retriever = super::open_retriever(config)?;

        let documents = sources::discover(&config.documents_dir(), &super::extractor())?;
        let fingerprint = sources::fingerprint(&documents)?;
        let status = retriever.status(Some(&fingerprint));

        if self.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            println!("Corpus: {}", if status.ready { "ready" } else { "not ready" });
            println!("  Chunks: {}", status.chunks);
            if let Some(dimension) = status.dimension {
                println!("  Dimension: {}", dimension);
            }
            if let Some(built_at) = status.built_at {
                println!("  Built: {}", built_at);
            }
            match status.stale {
                Some(true) => println!("  Documents changed since last build (stale)"),
                Some(false) => println!("  Up to date with the documents directory"),
                None => {}
            }
        }

        Ok(())
    }
}
