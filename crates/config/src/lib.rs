//! Configuration loading, validation, and management for Tribuna.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables (the binary loads `.env` into the environment
//! first). Validation runs last and refuses to start without the planner,
//! embedding and store credentials.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tribuna.toml";

/// The root configuration structure.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Planner LLM (Groq, OpenAI-compatible API)
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding model used for ingestion and retrieval
    #[serde(default)]
    pub embeddings: EmbeddingConfig,

    /// Knowledge store backend
    #[serde(default)]
    pub store: StoreConfig,

    /// PDF ingestion and chunking
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Similarity search
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Agent loop and streaming
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("llm", &self.llm)
            .field("embeddings", &self.embeddings)
            .field("store", &self.store)
            .field("ingest", &self.ingest)
            .field("retrieval", &self.retrieval)
            .field("agent", &self.agent)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_url")]
    pub api_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Cap on tokens per planner response. Unset leaves it to the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_llm_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn default_llm_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_llm_url(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_url")]
    pub api_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Texts per embedding request during ingestion
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_embedding_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_batch_size() -> usize {
    100
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_embedding_url(),
            model: default_embedding_model(),
            batch_size: default_batch_size(),
        }
    }
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

/// Which knowledge store implementation to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Supabase Postgres + pgvector, through PostgREST
    #[default]
    Supabase,
    /// Process-local index, lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(Self::Supabase),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_key: Option<String>,

    #[serde(default = "default_table")]
    pub table: String,

    /// Name of the similarity-search SQL function exposed over RPC
    #[serde(default = "default_query_name")]
    pub query_name: String,
}

fn default_table() -> String {
    "wilmer_documents".into()
}
fn default_query_name() -> String {
    "match_wilmer_documents".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: None,
            service_key: None,
            table: default_table(),
            query_name: default_query_name(),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("url", &self.url)
            .field("service_key", &redact(&self.service_key))
            .field("table", &self.table)
            .field("query_name", &self.query_name)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    4
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: default_top_k() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Act/observe cycles allowed per chat turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Pause between streamed words, in milliseconds
    #[serde(default = "default_word_delay_ms")]
    pub word_delay_ms: u64,

    /// Replaces the built-in persona prompt when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_file: Option<PathBuf>,
}

fn default_max_iterations() -> usize {
    5
}
fn default_word_delay_ms() -> u64 {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            word_delay_ms: default_word_delay_ms(),
            persona_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Allowed CORS origins; `["*"]` allows any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path` (or `tribuna.toml` when present), apply
    /// process environment overrides, and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |name| std::env::var(name).ok())
    }

    /// Like [`AppConfig::load`], reading variables through `lookup`.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load_from(Path::new(DEFAULT_CONFIG_FILE))?,
        };
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path without validating it.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Overlay environment variables on top of file/default values.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("GROQ_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = var("GROQ_API_URL") {
            self.llm.api_url = v;
        }
        if let Some(v) = var("GROQ_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = var("LLM_TEMPERATURE") {
            self.llm.temperature = parse_env("LLM_TEMPERATURE", &v)?;
        }
        if let Some(v) = var("LLM_MAX_TOKENS") {
            self.llm.max_tokens = Some(parse_env("LLM_MAX_TOKENS", &v)?);
        }

        if let Some(v) = var("OPENAI_API_KEY") {
            self.embeddings.api_key = Some(v);
        }
        if let Some(v) = var("OPENAI_API_URL") {
            self.embeddings.api_url = v;
        }
        if let Some(v) = var("OPENAI_EMBEDDING_MODEL") {
            self.embeddings.model = v;
        }

        if let Some(v) = var("STORE_BACKEND") {
            self.store.backend = v
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { name: "STORE_BACKEND".into(), value: v })?;
        }
        if let Some(v) = var("SUPABASE_URL") {
            self.store.url = Some(v);
        }
        if let Some(v) = var("SUPABASE_SERVICE_ROLE_KEY") {
            self.store.service_key = Some(v);
        }

        if let Some(v) = var("CHUNK_SIZE") {
            self.ingest.chunk_size = parse_env("CHUNK_SIZE", &v)?;
        }
        if let Some(v) = var("CHUNK_OVERLAP") {
            self.ingest.chunk_overlap = parse_env("CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = var("SIMILARITY_TOP_K") {
            self.retrieval.top_k = parse_env("SIMILARITY_TOP_K", &v)?;
        }
        if let Some(v) = var("AGENT_MAX_ITERATIONS") {
            self.agent.max_iterations = parse_env("AGENT_MAX_ITERATIONS", &v)?;
        }
        if let Some(v) = var("STREAM_WORD_DELAY_MS") {
            self.agent.word_delay_ms = parse_env("STREAM_WORD_DELAY_MS", &v)?;
        }

        if let Some(v) = var("TRIBUNA_HOST") {
            self.gateway.host = v;
        }
        if let Some((name, v)) = var("TRIBUNA_PORT")
            .map(|v| ("TRIBUNA_PORT", v))
            .or_else(|| var("PORT").map(|v| ("PORT", v)))
        {
            self.gateway.port = parse_env(name, &v)?;
        }

        Ok(())
    }

    /// Validate the configuration, including required credentials.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_key.is_none() {
            return Err(ConfigError::MissingCredential { name: "GROQ_API_KEY" });
        }
        if self.embeddings.api_key.is_none() {
            return Err(ConfigError::MissingCredential { name: "OPENAI_API_KEY" });
        }
        if self.store.backend == StoreBackend::Supabase {
            if self.store.url.is_none() {
                return Err(ConfigError::MissingCredential { name: "SUPABASE_URL" });
            }
            if self.store.service_key.is_none() {
                return Err(ConfigError::MissingCredential { name: "SUPABASE_SERVICE_ROLE_KEY" });
            }
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.llm.max_tokens == Some(0) {
            return Err(ConfigError::ValidationError("llm.max_tokens must be > 0".into()));
        }
        if self.ingest.chunk_size == 0 {
            return Err(ConfigError::ValidationError("ingest.chunk_size must be > 0".into()));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(ConfigError::ValidationError(
                "ingest.chunk_overlap must be smaller than ingest.chunk_size".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError("retrieval.top_k must be >= 1".into()));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError("agent.max_iterations must be >= 1".into()));
        }
        if self.embeddings.batch_size == 0 {
            return Err(ConfigError::ValidationError("embeddings.batch_size must be >= 1".into()));
        }

        Ok(())
    }

    /// Render the default configuration as TOML (for `doctor --print-defaults`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Missing required credential: set {name}")]
    MissingCredential { name: &'static str },

    #[error("Invalid value for {name}: '{value}'")]
    InvalidEnv { name: String, value: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn credentials() -> Vec<(&'static str, &'static str)> {
        vec![
            ("GROQ_API_KEY", "gsk-test"),
            ("OPENAI_API_KEY", "sk-test"),
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
        ]
    }

    const NO_FILE: &str = "/nonexistent/tribuna.toml";

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.embeddings.model, "text-embedding-3-small");
        assert_eq!(config.ingest.chunk_size, 1000);
        assert_eq!(config.ingest.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.store.table, "wilmer_documents");
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn loads_with_all_credentials() {
        let config = AppConfig::load_with_env(Some(Path::new(NO_FILE)), env(&credentials())).unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.store.url.as_deref(), Some("https://demo.supabase.co"));
    }

    #[test]
    fn missing_groq_key_fails_startup() {
        let vars: Vec<_> = credentials().into_iter().filter(|(k, _)| *k != "GROQ_API_KEY").collect();
        let err = AppConfig::load_with_env(Some(Path::new(NO_FILE)), env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { name: "GROQ_API_KEY" }));
    }

    #[test]
    fn missing_supabase_key_fails_startup() {
        let vars: Vec<_> = credentials()
            .into_iter()
            .filter(|(k, _)| *k != "SUPABASE_SERVICE_ROLE_KEY")
            .collect();
        let err = AppConfig::load_with_env(Some(Path::new(NO_FILE)), env(&vars)).unwrap_err();
        assert!(err.to_string().contains("SUPABASE_SERVICE_ROLE_KEY"));
    }

    #[test]
    fn memory_backend_needs_no_store_credentials() {
        let config = AppConfig::load_with_env(
            Some(Path::new(NO_FILE)),
            env(&[
                ("GROQ_API_KEY", "gsk"),
                ("OPENAI_API_KEY", "sk"),
                ("STORE_BACKEND", "memory"),
            ]),
        )
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn blank_env_values_count_as_missing() {
        let mut vars = credentials();
        vars.retain(|(k, _)| *k != "OPENAI_API_KEY");
        vars.push(("OPENAI_API_KEY", "   "));
        let err = AppConfig::load_with_env(Some(Path::new(NO_FILE)), env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { name: "OPENAI_API_KEY" }));
    }

    #[test]
    fn numeric_env_overrides() {
        let mut vars = credentials();
        vars.extend([("CHUNK_SIZE", "500"), ("CHUNK_OVERLAP", "50"), ("SIMILARITY_TOP_K", "6"), ("PORT", "9001")]);
        let config = AppConfig::load_with_env(Some(Path::new(NO_FILE)), env(&vars)).unwrap();
        assert_eq!(config.ingest.chunk_size, 500);
        assert_eq!(config.ingest.chunk_overlap, 50);
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.gateway.port, 9001);
    }

    #[test]
    fn unparsable_env_value_is_reported() {
        let mut vars = credentials();
        vars.push(("SIMILARITY_TOP_K", "four"));
        let err = AppConfig::load_with_env(Some(Path::new(NO_FILE)), env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref name, .. } if name == "SIMILARITY_TOP_K"));
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut vars = credentials();
        vars.extend([("CHUNK_SIZE", "100"), ("CHUNK_OVERLAP", "100")]);
        let err = AppConfig::load_with_env(Some(Path::new(NO_FILE)), env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn file_values_are_overridden_by_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[llm]
model = "llama-3.1-8b-instant"
temperature = 0.2

[retrieval]
top_k = 8
"#
        )
        .unwrap();

        let mut vars = credentials();
        vars.push(("GROQ_MODEL", "mixtral-8x7b"));
        let config = AppConfig::load_with_env(Some(file.path()), env(&vars)).unwrap();
        assert_eq!(config.llm.model, "mixtral-8x7b");
        assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.retrieval.top_k, 8);
    }

    #[test]
    fn max_tokens_from_env() {
        let mut vars = credentials();
        vars.push(("LLM_MAX_TOKENS", "512"));
        let config = AppConfig::load_with_env(Some(Path::new(NO_FILE)), env(&vars)).unwrap();
        assert_eq!(config.llm.max_tokens, Some(512));

        let config = AppConfig::load_with_env(Some(Path::new(NO_FILE)), env(&credentials())).unwrap();
        assert_eq!(config.llm.max_tokens, None);
    }

    #[test]
    fn zero_max_tokens_is_rejected() {
        let mut vars = credentials();
        vars.push(("LLM_MAX_TOKENS", "0"));
        let err = AppConfig::load_with_env(Some(Path::new(NO_FILE)), env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[llm\nmodel = ").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = AppConfig::load_with_env(Some(Path::new(NO_FILE)), env(&credentials())).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("gsk-test"));
        assert!(!debug.contains("service-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_roundtrips() {
        let toml_str = AppConfig::default_toml();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.store.query_name, "match_wilmer_documents");
        assert_eq!(parsed.gateway.cors_origins, vec!["*".to_string()]);
    }
}
