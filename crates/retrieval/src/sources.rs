//! Source document discovery and document-set fingerprinting.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::extract::DocumentExtractor;
use docqa_core::AppResult;

/// A discovered source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Absolute path to the file
    pub path: PathBuf,

    /// Identifier used for attribution: the path relative to the documents
    /// directory
    pub source_id: String,
}

/// Discover the source documents under `dir` that `extractor` can handle.
///
/// The result is sorted by `source_id` so discovery order — and with it the
/// chunk sequence and the fingerprint — is deterministic. A missing
/// directory yields an empty set: no documents is a reportable state, not
/// an error.
pub fn discover(dir: &Path, extractor: &dyn DocumentExtractor) -> AppResult<Vec<SourceDocument>> {
    if !dir.exists() {
        tracing::warn!("Documents directory {:?} does not exist", dir);
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || !extractor.supports(path) {
            continue;
        }

        let source_id = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "/");

        documents.push(SourceDocument {
            path: path.to_path_buf(),
            source_id,
        });
    }

    documents.sort_by(|a, b| a.source_id.cmp(&b.source_id));

    tracing::debug!("Discovered {} documents under {:?}", documents.len(), dir);

    Ok(documents)
}

/// Fingerprint a document set.
///
/// SHA-256 over each document's identifier, byte length, and modification
/// time, in discovery order. Adding, removing, renaming, or touching a
/// document changes the fingerprint, which is how a persisted corpus is
/// recognized as stale.
pub fn fingerprint(documents: &[SourceDocument]) -> AppResult<String> {
    let mut hasher = Sha256::new();

    for doc in documents {
        let metadata = std::fs::metadata(&doc.path)?;
        let mtime = metadata
            .modified()?
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        hasher.update(doc.source_id.as_bytes());
        hasher.update(0u8.to_le_bytes());
        hasher.update(metadata.len().to_le_bytes());
        hasher.update(mtime.to_le_bytes());
    }

    Ok(format!("{:x}", hasher.finalize()))
}
