//! Configuration for the HTTP server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use agent402_embeddings::generator::DEFAULT_MAX_TEXT_LENGTH;
use agent402_embeddings::search::{DEFAULT_TOP_K, MAX_TOP_K};
use agent402_embeddings::{EmbeddingProvider, HttpProvider, LocalProvider};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or applying configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`ServerConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parsed but do not make sense together.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener settings.
    pub server: HttpConfig,

    /// Embedding provider configuration.
    pub embedding: EmbeddingConfig,

    /// Search defaults and limits.
    pub search: SearchConfig,

    /// Listing defaults and limits.
    pub store: StoreConfig,

    /// Log filter used when `RUST_LOG` is unset.
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the listen address.
    pub fn with_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.server.listen_addr = addr.into();
        self
    }

    /// Set the search configuration.
    pub fn with_search(mut self, config: SearchConfig) -> Self {
        self.search = config;
        self
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let search = &self.search;
        if search.max_top_k == 0 || !(1..=search.max_top_k).contains(&search.default_top_k) {
            return Err(ConfigError::Invalid(format!(
                "search.default_top_k ({}) must be between 1 and search.max_top_k ({})",
                search.default_top_k, search.max_top_k
            )));
        }
        let store = &self.store;
        if store.max_list_limit == 0 || !(1..=store.max_list_limit).contains(&store.default_list_limit)
        {
            return Err(ConfigError::Invalid(format!(
                "store.default_list_limit ({}) must be between 1 and store.max_list_limit ({})",
                store.default_list_limit, store.max_list_limit
            )));
        }
        if self.embedding.max_text_length == 0 {
            return Err(ConfigError::Invalid(
                "embedding.max_text_length must be positive".to_string(),
            ));
        }
        if self.embedding.provider == EmbeddingProviderType::Http
            && self.embedding.base_url.is_none()
        {
            return Err(ConfigError::Invalid(
                "embedding.base_url is required when embedding.provider = \"http\"".to_string(),
            ));
        }
        Ok(())
    }
}

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Address the API binds to.
    pub listen_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Configuration for the embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which provider to use.
    pub provider: EmbeddingProviderType,

    /// Base URL of the embeddings API, for the `http` provider.
    pub base_url: Option<String>,

    /// Environment variable holding the API key, for the `http` provider.
    pub api_key_env: String,

    /// Maximum accepted text length, in characters.
    pub max_text_length: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderType::Local,
            base_url: None,
            api_key_env: "EMBEDDING_API_KEY".to_string(),
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }
}

impl EmbeddingConfig {
    /// Instantiate the configured provider.
    pub fn build_provider(&self) -> Result<Arc<dyn EmbeddingProvider>, ConfigError> {
        match self.provider {
            EmbeddingProviderType::Local => Ok(Arc::new(
                LocalProvider::new().with_max_text_length(self.max_text_length),
            )),
            EmbeddingProviderType::Http => {
                let base_url = self.base_url.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("embedding.base_url is not set".to_string())
                })?;
                let mut provider =
                    HttpProvider::new(base_url).with_max_text_length(self.max_text_length);
                if let Ok(key) = std::env::var(&self.api_key_env) {
                    provider = provider.with_api_key(key);
                }
                Ok(Arc::new(provider))
            }
        }
    }
}

/// Type of embedding provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderType {
    /// Deterministic in-process generator.
    Local,
    /// OpenAI-compatible embeddings API.
    Http,
}

/// Search defaults and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// `top_k` used when the request omits it.
    pub default_top_k: usize,

    /// Largest accepted `top_k`.
    pub max_top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
            max_top_k: MAX_TOP_K,
        }
    }
}

/// Listing defaults and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Page size used when the request omits `limit`.
    pub default_list_limit: usize,

    /// Largest accepted `limit`.
    pub max_list_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_list_limit: 100,
            max_list_limit: 1000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8000");
        assert_eq!(config.search.default_top_k, 10);
        assert_eq!(config.search.max_top_k, 100);
        assert_eq!(config.embedding.provider, EmbeddingProviderType::Local);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            [server]
            listen_addr = "0.0.0.0:9000"

            [search]
            max_top_k = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.search.max_top_k, 50);
        assert_eq!(config.search.default_top_k, 10);
        assert_eq!(config.store.max_list_limit, 1000);
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let err = ServerConfig::from_toml(
            r#"
            [search]
            default_top_k = 20
            max_top_k = 5
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_http_provider_requires_base_url() {
        let err = ServerConfig::from_toml(
            r#"
            [embedding]
            provider = "http"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nfilter = \"debug\"").unwrap();
        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn test_missing_file() {
        let err = ServerConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_build_local_provider() {
        let provider = EmbeddingConfig::default().build_provider().unwrap();
        assert_eq!(provider.name(), "local");
    }
}
