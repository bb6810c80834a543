//! Prompt assembly for grounded answering.
//!
//! Retrieved chunks are formatted into the instruction text handed to the
//! generation collaborator. Assembly is deterministic and preserves the
//! ranking order produced by retrieval — it never re-sorts.

use crate::types::AttributedChunk;

/// Assemble the generation prompt from a query and its retrieved chunks.
///
/// Each chunk appears in the given order, annotated with its source and
/// page, followed by the question and the output-formatting instructions.
pub fn assemble(query: &str, chunks: &[AttributedChunk]) -> String {
    let context = chunks
        .iter()
        .map(|chunk| {
            format!(
                "{}\n[Source: {}, Page {}]",
                chunk.content, chunk.source_id, chunk.page
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are an assistant answering questions about a document collection. Answer the question using the context below.

**IMPORTANT: Format your answer using Markdown:**
- Use **bold** for important rules and key points
- Use bullet points (-) for steps, procedures, or lists
- Use numbered lists (1., 2., 3.) for sequential procedures
- Use `backticks` for specific values like temperatures, pressures, or measurements
- Use ## for section headers when organizing your answer

CONTEXT:
{}

QUESTION: {}

**Answer (use Markdown formatting):**"#,
        context, query
    )
}
