//! Configuration management for the docqa tool.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Environment variables
//! - Command-line flags
//! - Config file (.docqa/config.yaml)
//!
//! The configuration is workspace-centric: the document set lives under the
//! workspace and all derived state (the persisted corpus) is stored in
//! `.docqa/`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Default chunk window in words, matching the ingestion contract.
pub const DEFAULT_CHUNK_WINDOW: usize = 800;

/// Default overlap between consecutive chunks in words.
pub const DEFAULT_CHUNK_OVERLAP: usize = 150;

/// Default number of chunks retrieved per query.
pub const DEFAULT_TOP_K: usize = 4;

/// Main application configuration.
///
/// Holds all global options that affect behavior across commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docqa/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Directory holding the source documents, relative to the workspace
    /// unless absolute
    pub documents: PathBuf,

    /// LLM provider for generation and embeddings (e.g., "ollama")
    pub provider: String,

    /// Optional provider endpoint override
    pub endpoint: Option<String>,

    /// Generation model identifier
    pub model: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Expected embedding dimension
    pub embedding_dimensions: usize,

    /// Chunk window in words
    pub chunk_window: usize,

    /// Overlap between consecutive chunks in words
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per query
    pub top_k: usize,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// On-disk configuration file structure (.docqa/config.yaml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    documents: Option<PathBuf>,
    llm: Option<LlmSection>,
    chunking: Option<ChunkingSection>,
    retrieval: Option<RetrievalSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    endpoint: Option<String>,
    model: Option<String>,
    #[serde(rename = "embeddingModel")]
    embedding_model: Option<String>,
    #[serde(rename = "embeddingDimensions")]
    embedding_dimensions: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ChunkingSection {
    window: Option<usize>,
    overlap: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RetrievalSection {
    #[serde(rename = "topK")]
    top_k: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            documents: PathBuf::from("data"),
            provider: "ollama".to_string(), // Local-first default
            endpoint: None,
            model: "llama3.2:1b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dimensions: 768,
            chunk_window: DEFAULT_CHUNK_WINDOW,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, then merge the YAML
    /// config file if one exists.
    ///
    /// Environment variables:
    /// - `DOCQA_WORKSPACE`: Override workspace path
    /// - `DOCQA_CONFIG`: Path to config file
    /// - `DOCQA_PROVIDER`: LLM provider
    /// - `DOCQA_MODEL`: Generation model identifier
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("DOCQA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("DOCQA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::InvalidConfig(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.workspace.join(".docqa/config.yaml"));

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let file: ConfigFile = serde_yaml::from_str(&content).map_err(|e| {
                AppError::InvalidConfig(format!(
                    "Failed to parse config at {:?}: {}",
                    config_path, e
                ))
            })?;
            config.merge_file(file);
            tracing::debug!("Loaded config file from {:?}", config_path);
        }

        if let Ok(provider) = std::env::var("DOCQA_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("DOCQA_MODEL") {
            config.model = model;
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge values from the config file into this configuration.
    ///
    /// File values override built-in defaults but not environment variables
    /// or CLI flags, which are applied afterwards.
    fn merge_file(&mut self, file: ConfigFile) {
        if let Some(documents) = file.documents {
            self.documents = documents;
        }

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                self.provider = provider;
            }
            if llm.endpoint.is_some() {
                self.endpoint = llm.endpoint;
            }
            if let Some(model) = llm.model {
                self.model = model;
            }
            if let Some(embedding_model) = llm.embedding_model {
                self.embedding_model = embedding_model;
            }
            if let Some(dims) = llm.embedding_dimensions {
                self.embedding_dimensions = dims;
            }
        }

        if let Some(chunking) = file.chunking {
            if let Some(window) = chunking.window {
                self.chunk_window = window;
            }
            if let Some(overlap) = chunking.overlap {
                self.chunk_overlap = overlap;
            }
        }

        if let Some(retrieval) = file.retrieval {
            if let Some(top_k) = retrieval.top_k {
                self.top_k = top_k;
            }
        }

        if let Some(logging) = file.logging {
            if self.log_level.is_none() {
                self.log_level = logging.level;
            }
            if logging.color == Some(false) {
                self.no_color = true;
            }
        }
    }

    /// Apply CLI flag overrides on top of the loaded configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }
        if config_file.is_some() {
            self.config_file = config_file;
        }
        if let Some(provider) = provider {
            self.provider = provider;
        }
        if let Some(model) = model {
            self.model = model;
        }
        if log_level.is_some() {
            self.log_level = log_level;
        }
        if verbose {
            self.verbose = true;
            self.log_level = Some("debug".to_string());
        }
        if no_color {
            self.no_color = true;
        }
        self
    }

    /// Absolute path to the source documents directory.
    pub fn documents_dir(&self) -> PathBuf {
        if self.documents.is_absolute() {
            self.documents.clone()
        } else {
            self.workspace.join(&self.documents)
        }
    }

    /// Path to the persisted corpus store.
    pub fn store_path(&self) -> PathBuf {
        self.workspace.join(".docqa").join("corpus.sqlite")
    }

    /// Ensure the .docqa state directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let dir = self.workspace.join(".docqa");
        std::fs::create_dir_all(&dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.chunk_window, 800);
        assert_eq!(config.chunk_overlap, 150);
        assert_eq!(config.top_k, 4);
    }

    #[test]
    fn test_merge_file_overrides_defaults() {
        let mut config = AppConfig::default();
        let file: ConfigFile = serde_yaml::from_str(
            r#"
documents: corpus
llm:
  provider: ollama
  model: llama3.2
  embeddingModel: nomic-embed-text
  embeddingDimensions: 384
chunking:
  window: 400
  overlap: 50
retrieval:
  topK: 8
"#,
        )
        .unwrap();

        config.merge_file(file);

        assert_eq!(config.documents, PathBuf::from("corpus"));
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.embedding_dimensions, 384);
        assert_eq!(config.chunk_window, 400);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.top_k, 8);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            Some(PathBuf::from("/tmp")),
            None,
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(config.workspace, PathBuf::from("/tmp"));
        assert_eq!(config.model, "llama3.2");
        assert!(config.verbose);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_paths() {
        let temp = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.workspace = temp.path().to_path_buf();

        assert_eq!(config.documents_dir(), temp.path().join("data"));
        assert_eq!(
            config.store_path(),
            temp.path().join(".docqa").join("corpus.sqlite")
        );

        config.ensure_state_dir().unwrap();
        assert!(temp.path().join(".docqa").is_dir());
    }
}
