//! SQLite-backed persistence for the corpus.
//!
//! Chunk records and their embeddings are co-versioned in one database
//! file: each row carries both the record fields and the little-endian f32
//! bytes of its vector, so the two collections cannot drift apart on disk.
//! `save` writes a fresh database next to the live one and renames it into
//! place, so a crash mid-write never leaves a half-written store.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

use crate::types::{ChunkRecord, Corpus, StoreMeta};
use crate::vector_index::VectorIndex;
use docqa_core::{AppError, AppResult};

/// Persisted store schema version. Bumped on incompatible layout changes.
const SCHEMA_VERSION: &str = "1";

/// Persistent store for a corpus (chunk records + vectors + build metadata).
#[derive(Debug, Clone)]
pub struct CorpusStore {
    path: PathBuf,
}

impl CorpusStore {
    /// Create a store handle for the given database path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when a persisted corpus exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the persisted corpus.
    ///
    /// Returns `Ok(None)` when no store file exists (the **absent** state).
    /// Any internal inconsistency — row count disagreeing with the recorded
    /// count, gaps in the sequence, or embedding blobs that do not match the
    /// recorded dimension — fails with `CorruptState`; partial state is
    /// never returned.
    pub fn load(&self) -> AppResult<Option<(Corpus, StoreMeta)>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let conn = Connection::open(&self.path)
            .map_err(|e| AppError::CorruptState(format!("Failed to open store: {}", e)))?;

        let meta = read_meta(&conn)?;

        let mut stmt = conn
            .prepare(
                "SELECT seq, content, source_id, page, embedding FROM chunks ORDER BY seq",
            )
            .map_err(|e| AppError::CorruptState(format!("Failed to query chunks: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Vec<u8>>(4)?,
                ))
            })
            .map_err(|e| AppError::CorruptState(format!("Failed to read chunks: {}", e)))?;

        let mut chunks = Vec::with_capacity(meta.chunk_count);
        let mut vectors = Vec::with_capacity(meta.chunk_count);

        for (i, row) in rows.enumerate() {
            let (seq, content, source_id, page, blob) = row
                .map_err(|e| AppError::CorruptState(format!("Unreadable chunk row: {}", e)))?;

            if seq != i as i64 {
                return Err(AppError::CorruptState(format!(
                    "Chunk sequence gap: expected {}, found {}",
                    i, seq
                )));
            }

            let embedding = embedding_from_bytes(&blob)?;
            if embedding.len() != meta.dimension {
                return Err(AppError::CorruptState(format!(
                    "Chunk {} has a {}-dimension embedding, store records {}",
                    i,
                    embedding.len(),
                    meta.dimension
                )));
            }

            chunks.push(ChunkRecord {
                content,
                source_id,
                page: page as u32,
                sequence_index: i,
            });
            vectors.push(embedding);
        }

        if chunks.len() != meta.chunk_count {
            return Err(AppError::CorruptState(format!(
                "Store records {} chunks but holds {}",
                meta.chunk_count,
                chunks.len()
            )));
        }

        let mut index = VectorIndex::new();
        index
            .insert(vectors)
            .map_err(|e| AppError::CorruptState(format!("Inconsistent vectors: {}", e)))?;

        let corpus = Corpus::new(chunks, index)?;

        tracing::info!(
            "Loaded {} chunks from {:?} (built {})",
            corpus.len(),
            self.path,
            meta.built_at
        );

        Ok(Some((corpus, meta)))
    }

    /// Read only the persisted metadata, without hydrating the corpus.
    pub fn load_meta(&self) -> AppResult<Option<StoreMeta>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let conn = Connection::open(&self.path)
            .map_err(|e| AppError::CorruptState(format!("Failed to open store: {}", e)))?;

        read_meta(&conn).map(Some)
    }

    /// Atomically replace the persisted corpus.
    ///
    /// The new database is written to `<path>.tmp` and renamed over the
    /// live file only once fully written.
    pub fn save(&self, corpus: &Corpus, fingerprint: &str) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.tmp_path();
        if tmp_path.exists() {
            std::fs::remove_file(&tmp_path)?;
        }

        let built_at = Utc::now();
        let dimension = corpus.index().dimension().unwrap_or(0);

        {
            let mut conn = Connection::open(&tmp_path)
                .map_err(|e| AppError::CorruptState(format!("Failed to create store: {}", e)))?;

            conn.execute_batch(
                r#"
                CREATE TABLE meta (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE TABLE chunks (
                    seq INTEGER PRIMARY KEY,
                    content TEXT NOT NULL,
                    source_id TEXT NOT NULL,
                    page INTEGER NOT NULL,
                    embedding BLOB NOT NULL
                );
                "#,
            )
            .map_err(|e| AppError::CorruptState(format!("Failed to create tables: {}", e)))?;

            let tx = conn
                .transaction()
                .map_err(|e| AppError::CorruptState(format!("Failed to open transaction: {}", e)))?;

            let meta_rows = [
                ("schema_version", SCHEMA_VERSION.to_string()),
                ("dimension", dimension.to_string()),
                ("chunk_count", corpus.len().to_string()),
                ("fingerprint", fingerprint.to_string()),
                ("built_at", built_at.to_rfc3339()),
            ];
            for (key, value) in &meta_rows {
                tx.execute(
                    "INSERT INTO meta (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )
                .map_err(|e| AppError::CorruptState(format!("Failed to write meta: {}", e)))?;
            }

            for record in corpus.chunks() {
                // Corpus construction guarantees the paired vector exists
                let vector = corpus.index().vector(record.sequence_index).ok_or_else(|| {
                    AppError::CorruptState(format!(
                        "No vector for chunk {}",
                        record.sequence_index
                    ))
                })?;

                tx.execute(
                    "INSERT INTO chunks (seq, content, source_id, page, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        record.sequence_index as i64,
                        record.content,
                        record.source_id,
                        record.page as i64,
                        embedding_to_bytes(vector),
                    ],
                )
                .map_err(|e| AppError::CorruptState(format!("Failed to write chunk: {}", e)))?;
            }

            tx.commit()
                .map_err(|e| AppError::CorruptState(format!("Failed to commit store: {}", e)))?;
        }

        std::fs::rename(&tmp_path, &self.path)?;

        tracing::info!(
            "Persisted {} chunks (dimension {}) to {:?}",
            corpus.len(),
            dimension,
            self.path
        );

        Ok(())
    }

    /// Check whether the persisted corpus was built from a different
    /// document set than `current_fingerprint` describes.
    ///
    /// An absent store is reported as stale: there is nothing fresh to
    /// serve from.
    pub fn is_stale(&self, current_fingerprint: &str) -> AppResult<bool> {
        match self.load_meta()? {
            Some(meta) => Ok(meta.fingerprint != current_fingerprint),
            None => Ok(true),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Read and validate the meta table.
fn read_meta(conn: &Connection) -> AppResult<StoreMeta> {
    let get = |key: &str| -> AppResult<String> {
        conn.query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .map_err(|e| AppError::CorruptState(format!("Missing meta key '{}': {}", key, e)))
    };

    let version = get("schema_version")?;
    if version != SCHEMA_VERSION {
        return Err(AppError::CorruptState(format!(
            "Unsupported store schema version '{}'",
            version
        )));
    }

    let dimension: usize = get("dimension")?
        .parse()
        .map_err(|e| AppError::CorruptState(format!("Invalid dimension in meta: {}", e)))?;

    let chunk_count: usize = get("chunk_count")?
        .parse()
        .map_err(|e| AppError::CorruptState(format!("Invalid chunk count in meta: {}", e)))?;

    let fingerprint = get("fingerprint")?;

    let built_at: DateTime<Utc> = get("built_at")?
        .parse()
        .map_err(|e| AppError::CorruptState(format!("Invalid build timestamp in meta: {}", e)))?;

    Ok(StoreMeta {
        dimension,
        chunk_count,
        fingerprint,
        built_at,
    })
}

/// Convert an embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert stored bytes back to an embedding vector.
fn embedding_from_bytes(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::CorruptState(
            "Embedding blob length is not a multiple of 4".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        embedding.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_corpus() -> Corpus {
        let chunks = vec![
            ChunkRecord {
                content: "pressure relief valves must be tested monthly".to_string(),
                source_id: "safety.txt".to_string(),
                page: 1,
                sequence_index: 0,
            },
            ChunkRecord {
                content: "wear hearing protection in the turbine hall".to_string(),
                source_id: "safety.txt".to_string(),
                page: 2,
                sequence_index: 1,
            },
        ];

        let mut index = VectorIndex::new();
        index
            .insert(vec![vec![0.25, -1.5, 3.0], vec![1.0e-7, 42.0, -0.0]])
            .unwrap();

        Corpus::new(chunks, index).unwrap()
    }

    #[test]
    fn test_load_absent_store() {
        let temp = TempDir::new().unwrap();
        let store = CorpusStore::new(temp.path().join("corpus.sqlite"));

        assert!(!store.exists());
        assert!(store.load().unwrap().is_none());
        assert!(store.load_meta().unwrap().is_none());
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = CorpusStore::new(temp.path().join("corpus.sqlite"));
        let corpus = sample_corpus();

        store.save(&corpus, "fp-1").unwrap();
        let (loaded, meta) = store.load().unwrap().unwrap();

        assert_eq!(loaded.chunks(), corpus.chunks());
        assert_eq!(meta.dimension, 3);
        assert_eq!(meta.chunk_count, 2);
        assert_eq!(meta.fingerprint, "fp-1");

        // Persisted floats must round-trip bitwise
        for i in 0..corpus.len() {
            let original = corpus.index().vector(i).unwrap();
            let restored = loaded.index().vector(i).unwrap();
            assert_eq!(original.len(), restored.len());
            for (a, b) in original.iter().zip(restored.iter()) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }

    #[test]
    fn test_save_replaces_previous_state() {
        let temp = TempDir::new().unwrap();
        let store = CorpusStore::new(temp.path().join("corpus.sqlite"));

        store.save(&sample_corpus(), "fp-1").unwrap();
        store.save(&Corpus::empty(), "fp-2").unwrap();

        let (loaded, meta) = store.load().unwrap().unwrap();
        assert!(loaded.is_empty());
        assert_eq!(meta.fingerprint, "fp-2");
        assert_eq!(meta.dimension, 0);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn test_empty_corpus_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = CorpusStore::new(temp.path().join("corpus.sqlite"));

        store.save(&Corpus::empty(), "fp-empty").unwrap();
        let (loaded, meta) = store.load().unwrap().unwrap();

        assert!(loaded.is_empty());
        assert_eq!(meta.chunk_count, 0);
    }

    #[test]
    fn test_load_detects_count_mismatch() {
        let temp = TempDir::new().unwrap();
        let store = CorpusStore::new(temp.path().join("corpus.sqlite"));
        store.save(&sample_corpus(), "fp-1").unwrap();

        // Tamper: delete a row without updating the recorded count
        let conn = Connection::open(store.path()).unwrap();
        conn.execute("DELETE FROM chunks WHERE seq = 1", []).unwrap();
        drop(conn);

        assert!(matches!(
            store.load(),
            Err(AppError::CorruptState(_))
        ));
    }

    #[test]
    fn test_load_detects_sequence_gap() {
        let temp = TempDir::new().unwrap();
        let store = CorpusStore::new(temp.path().join("corpus.sqlite"));
        store.save(&sample_corpus(), "fp-1").unwrap();

        let conn = Connection::open(store.path()).unwrap();
        conn.execute("UPDATE chunks SET seq = 5 WHERE seq = 1", [])
            .unwrap();
        drop(conn);

        assert!(matches!(store.load(), Err(AppError::CorruptState(_))));
    }

    #[test]
    fn test_load_detects_truncated_embedding() {
        let temp = TempDir::new().unwrap();
        let store = CorpusStore::new(temp.path().join("corpus.sqlite"));
        store.save(&sample_corpus(), "fp-1").unwrap();

        let conn = Connection::open(store.path()).unwrap();
        conn.execute(
            "UPDATE chunks SET embedding = ?1 WHERE seq = 0",
            params![vec![0u8; 7]],
        )
        .unwrap();
        drop(conn);

        assert!(matches!(store.load(), Err(AppError::CorruptState(_))));
    }

    #[test]
    fn test_staleness_detection() {
        let temp = TempDir::new().unwrap();
        let store = CorpusStore::new(temp.path().join("corpus.sqlite"));

        // Nothing persisted yet: nothing fresh to serve
        assert!(store.is_stale("fp-1").unwrap());

        store.save(&sample_corpus(), "fp-1").unwrap();
        assert!(!store.is_stale("fp-1").unwrap());
        assert!(store.is_stale("fp-2").unwrap());
    }
}
