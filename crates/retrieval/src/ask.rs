//! Grounded question answering.
//!
//! Combines retrieval with the generation collaborator: retrieve the
//! most relevant chunks, assemble the prompt, generate the answer. When
//! retrieval finds nothing the fixed no-information answer is returned and
//! the generation collaborator is never called — that outcome is distinct
//! from a collaborator failure, which propagates as an error.

use crate::prompt;
use crate::retriever::Retriever;
use crate::types::Answer;
use docqa_core::AppResult;
use docqa_llm::{LlmClient, LlmRequest};

/// Answer returned when the corpus holds nothing relevant (or nothing at
/// all).
pub const NO_INFORMATION_ANSWER: &str =
    "No relevant information found in the document collection.";

/// Sampling temperature for grounded answers; low to keep the model close
/// to the source material.
const ANSWER_TEMPERATURE: f32 = 0.1;

/// Answer `query` from the corpus, grounded by at most `top_k` retrieved
/// chunks.
pub async fn ask(
    retriever: &Retriever,
    llm: &dyn LlmClient,
    model: &str,
    query: &str,
    top_k: usize,
) -> AppResult<Answer> {
    tracing::info!("Answering query with top-{} retrieval", top_k);

    let chunks = retriever.retrieve(query, top_k).await?;

    if chunks.is_empty() {
        tracing::info!("No relevant chunks found; skipping generation");
        return Ok(Answer {
            answer: NO_INFORMATION_ANSWER.to_string(),
            chunks,
        });
    }

    let prompt = prompt::assemble(query, &chunks);
    let request = LlmRequest::new(prompt, model).with_temperature(ANSWER_TEMPERATURE);

    let response = llm.complete(&request).await?;

    Ok(Answer {
        answer: response.content,
        chunks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::EmbeddingProvider;
    use crate::extract::DocumentExtractor;
    use crate::sources::SourceDocument;
    use crate::store::CorpusStore;
    use docqa_core::AppError;
    use docqa_llm::{LlmResponse, LlmUsage};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct OnePageExtractor {
        text: String,
    }

    impl DocumentExtractor for OnePageExtractor {
        fn supports(&self, _path: &Path) -> bool {
            true
        }

        fn extract(&self, _path: &Path) -> AppResult<Vec<(u32, String)>> {
            Ok(vec![(1, self.text.clone())])
        }
    }

    #[derive(Debug)]
    struct UnitEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for UnitEmbedder {
        fn provider_name(&self) -> &str {
            "test"
        }

        fn model_name(&self) -> &str {
            "unit"
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    struct CountingLlm {
        calls: Arc<AtomicUsize>,
        reply: String,
    }

    #[async_trait::async_trait]
    impl LlmClient for CountingLlm {
        fn provider_name(&self) -> &str {
            "test"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.temperature, Some(0.1));
            Ok(LlmResponse {
                content: self.reply.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    struct FailingLlm;

    #[async_trait::async_trait]
    impl LlmClient for FailingLlm {
        fn provider_name(&self) -> &str {
            "test"
        }

        async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
            Err(AppError::GenerationFailed("model offline".to_string()))
        }
    }

    fn empty_retriever(temp: &TempDir) -> Retriever {
        Retriever::new(
            CorpusStore::new(temp.path().join("corpus.sqlite")),
            Arc::new(OnePageExtractor {
                text: String::new(),
            }),
            Arc::new(UnitEmbedder),
            800,
            150,
        )
        .unwrap()
    }

    async fn populated_retriever(temp: &TempDir) -> Retriever {
        let retriever = Retriever::new(
            CorpusStore::new(temp.path().join("corpus.sqlite")),
            Arc::new(OnePageExtractor {
                text: "the turbine hall requires hearing protection".to_string(),
            }),
            Arc::new(UnitEmbedder),
            800,
            150,
        )
        .unwrap();

        let doc_path = temp.path().join("doc.txt");
        std::fs::write(&doc_path, "placeholder").unwrap();
        retriever
            .ingest(&[SourceDocument {
                path: doc_path,
                source_id: "doc.txt".to_string(),
            }])
            .await
            .unwrap();

        retriever
    }

    #[tokio::test]
    async fn test_ask_empty_corpus_skips_generation() {
        let temp = TempDir::new().unwrap();
        let retriever = empty_retriever(&temp);

        let calls = Arc::new(AtomicUsize::new(0));
        let llm = CountingLlm {
            calls: Arc::clone(&calls),
            reply: "unused".to_string(),
        };

        let answer = ask(&retriever, &llm, "llama3.2:1b", "anything", 4)
            .await
            .unwrap();

        assert_eq!(answer.answer, NO_INFORMATION_ANSWER);
        assert!(answer.chunks.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ask_returns_generated_answer_with_sources() {
        let temp = TempDir::new().unwrap();
        let retriever = populated_retriever(&temp).await;

        let calls = Arc::new(AtomicUsize::new(0));
        let llm = CountingLlm {
            calls: Arc::clone(&calls),
            reply: "Wear hearing protection.".to_string(),
        };

        let answer = ask(&retriever, &llm, "llama3.2:1b", "what about the turbine hall?", 4)
            .await
            .unwrap();

        assert_eq!(answer.answer, "Wear hearing protection.");
        assert_eq!(answer.chunks.len(), 1);
        assert_eq!(answer.chunks[0].source_id, "doc.txt");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ask_propagates_generation_failure() {
        let temp = TempDir::new().unwrap();
        let retriever = populated_retriever(&temp).await;

        let result = ask(&retriever, &FailingLlm, "llama3.2:1b", "question", 4).await;
        assert!(matches!(result, Err(AppError::GenerationFailed(_))));
    }
}
