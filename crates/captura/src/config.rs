//! Configuration for the capture pipeline
//!
//! Built once at process start and passed by reference into each stage;
//! secrets come from the environment, everything else from an optional
//! TOML file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapturaConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage area configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Document-extraction service configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Generative model configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Destination database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl CapturaConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        toml::from_str(&raw).map_err(|e| Error::Config(format!("invalid config file: {}", e)))
    }

    /// Load configuration: `CAPTURA_CONFIG` path if set, `captura.toml` if
    /// present, otherwise defaults; environment secrets applied on top.
    pub fn load() -> Result<Self> {
        let mut config = if let Ok(path) = std::env::var("CAPTURA_CONFIG") {
            Self::from_file(path)?
        } else if Path::new("captura.toml").exists() {
            Self::from_file("captura.toml")?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Overlay secrets and connection settings from the environment
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("VISION_AGENT_API_KEY") {
            self.extraction.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.model.api_key = key;
        }
        if let Ok(host) = std::env::var("DB_HOST") {
            self.database.host = host;
        }
        if let Ok(port) = std::env::var("DB_PORT") {
            if let Ok(port) = port.parse() {
                self.database.port = port;
            }
        }
        if let Ok(name) = std::env::var("DB_NAME") {
            self.database.dbname = name;
        }
        if let Ok(user) = std::env::var("DB_USER") {
            self.database.user = user;
        }
        if let Ok(password) = std::env::var("DB_PASSWORD") {
            self.database.password = password;
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
        }
    }
}

/// Storage area configuration
///
/// Stage transitions are signaled purely by artifact presence in these
/// directories; all are created at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Uploaded source documents awaiting /split
    pub incoming_dir: PathBuf,
    /// Per-page documents produced by /split
    pub pages_dir: PathBuf,
    /// Chunk tables produced by /extract
    pub chunks_dir: PathBuf,
    /// Generated tables produced by /generate
    pub tables_dir: PathBuf,
    /// Consumed source documents (moved here, never deleted)
    pub archive_dir: PathBuf,
    /// Public base URL under which original documents are served
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            incoming_dir: PathBuf::from("files"),
            pages_dir: PathBuf::from("pages"),
            chunks_dir: PathBuf::from("results"),
            tables_dir: PathBuf::from("tables"),
            archive_dir: PathBuf::from("archive"),
            public_base_url: "https://files.captura.example.com".to_string(),
        }
    }
}

/// Document-extraction service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Extraction API URL
    pub api_url: String,
    /// API key (from `VISION_AGENT_API_KEY`)
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Ask the service to include marginalia chunks
    pub include_marginalia: bool,
    /// Ask the service to include chunk metadata in markdown output
    pub include_metadata_in_markdown: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.va.landing.ai/v1/tools/agentic-document-analysis".to_string(),
            api_key: None,
            timeout_secs: 120,
            include_marginalia: true,
            include_metadata_in_markdown: true,
        }
    }
}

/// Generative model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Chat-completions endpoint URL
    pub api_url: String,
    /// API key (from `OPENAI_API_KEY`)
    pub api_key: String,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token budget
    pub max_completion_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "o4-mini-2025-04-16".to_string(),
            temperature: 1.0,
            max_completion_tokens: 32_000,
            timeout_secs: 120,
        }
    }
}

/// Destination database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password (from `DB_PASSWORD`)
    pub password: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "captura".to_string(),
            user: "captura".to_string(),
            password: String::new(),
        }
    }
}
