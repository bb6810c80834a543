//! Text chunking into overlapping word windows.
//!
//! Splitting is a pure function of its inputs, so re-ingesting an unchanged
//! document always reproduces the same chunk boundaries. That determinism is
//! what makes the persisted corpus a usable cache.

use docqa_core::{AppError, AppResult};

/// Validate chunking parameters.
///
/// `window` must be positive and `overlap` strictly smaller than `window`,
/// otherwise the stride would be zero or negative and splitting could never
/// terminate.
pub fn validate_params(window: usize, overlap: usize) -> AppResult<()> {
    if window == 0 {
        return Err(AppError::InvalidConfig(
            "chunk window must be at least 1 word".to_string(),
        ));
    }
    if overlap >= window {
        return Err(AppError::InvalidConfig(format!(
            "chunk overlap ({}) must be smaller than the window ({})",
            overlap, window
        )));
    }
    Ok(())
}

/// Split text into overlapping windows of whitespace-delimited words.
///
/// Successive windows hold `window` words and start `window - overlap`
/// words apart, so consecutive chunks share `overlap` words of context.
/// The final window may be shorter when fewer words remain. Text that fits
/// in a single window is returned as exactly one chunk. Empty or
/// whitespace-only input yields an empty sequence, not an error.
pub fn split(text: &str, window: usize, overlap: usize) -> AppResult<Vec<String>> {
    validate_params(window, overlap)?;

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    if words.len() <= window {
        return Ok(vec![words.join(" ")]);
    }

    let stride = window - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + window).min(words.len());
        chunks.push(words[start..end].join(" "));
        start += stride;
    }

    tracing::debug!(
        "Split {} words into {} chunks (window: {}, overlap: {})",
        words.len(),
        chunks.len(),
        window,
        overlap
    );

    Ok(chunks)
}
