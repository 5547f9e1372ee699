// Copyright 2025 DiseaseKG Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// DiseaseKG Server Configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpServerConfig {
    /// HTTP API listen address (e.g., "127.0.0.1:8000")
    #[serde(default = "default_http_addr")]
    pub listen_addr: String,

    /// Enable CORS
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,

    /// Allowed CORS origins (empty = allow all, use specific origins in production)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// SPARQL SELECT endpoint of the triple store repository
    #[serde(default = "default_store_endpoint")]
    pub endpoint: String,

    /// Query timeout in seconds
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Hugging Face inference API token; LLM drafting is disabled without one
    pub hf_api_token: Option<String>,

    /// Chat completion model identifier
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_query_timeout")]
    pub request_timeout_secs: u64,

    /// Completion length cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

// Default values
fn default_http_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_enable_cors() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_store_endpoint() -> String {
    "http://localhost:7200/repositories/disease-kg".to_string()
}

fn default_query_timeout() -> u64 {
    120
}

fn default_llm_model() -> String {
    "meta-llama/Llama-3.1-8B-Instruct".to_string()
}

fn default_max_tokens() -> u32 {
    300
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_http_addr(),
            enable_cors: default_enable_cors(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_store_endpoint(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            hf_api_token: None,
            model: default_llm_model(),
            request_timeout_secs: default_query_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: HttpServerConfig::default(),
            store: StoreConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - DISEASEKG_HTTP_ADDR: HTTP listen address (default: 127.0.0.1:8000)
    /// - DISEASEKG_ENABLE_CORS: Enable CORS (default: true)
    /// - DISEASEKG_CORS_ORIGINS: Comma-separated allowed origins
    /// - DISEASEKG_STORE_ENDPOINT: SPARQL endpoint of the repository
    /// - DISEASEKG_QUERY_TIMEOUT: Store query timeout in seconds (default: 120)
    /// - HF_API_TOKEN: Hugging Face inference token (enables LLM drafting)
    /// - DISEASEKG_LLM_MODEL: Chat completion model identifier
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("DISEASEKG_HTTP_ADDR") {
            config.server.listen_addr = addr;
        }

        if let Ok(cors) = std::env::var("DISEASEKG_ENABLE_CORS") {
            config.server.enable_cors = cors.parse().unwrap_or(true);
        }

        if let Ok(origins) = std::env::var("DISEASEKG_CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        if let Ok(endpoint) = std::env::var("DISEASEKG_STORE_ENDPOINT") {
            config.store.endpoint = endpoint;
        }

        if let Ok(timeout) = std::env::var("DISEASEKG_QUERY_TIMEOUT") {
            if let Ok(val) = timeout.parse() {
                config.store.query_timeout_secs = val;
            }
        }

        if let Ok(token) = std::env::var("HF_API_TOKEN") {
            config.llm.hf_api_token = Some(token);
        }

        if let Ok(model) = std::env::var("DISEASEKG_LLM_MODEL") {
            config.llm.model = model;
        }

        config
    }

    /// Load configuration with priority: file > env > defaults
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(path) = config_file {
            if path.exists() {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(&path)?
            } else {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
        } else {
            Self::default()
        };

        config = Self::merge_with_env(config);

        Ok(config)
    }

    /// Merge config with environment variables (env takes priority)
    fn merge_with_env(mut config: Self) -> Self {
        let env_config = Self::from_env();

        // Only override if env var was explicitly set
        if std::env::var("DISEASEKG_HTTP_ADDR").is_ok() {
            config.server.listen_addr = env_config.server.listen_addr;
        }
        if std::env::var("DISEASEKG_ENABLE_CORS").is_ok() {
            config.server.enable_cors = env_config.server.enable_cors;
        }
        if std::env::var("DISEASEKG_CORS_ORIGINS").is_ok() {
            config.server.cors_origins = env_config.server.cors_origins;
        }
        if std::env::var("DISEASEKG_STORE_ENDPOINT").is_ok() {
            config.store.endpoint = env_config.store.endpoint;
        }
        if std::env::var("DISEASEKG_QUERY_TIMEOUT").is_ok() {
            config.store.query_timeout_secs = env_config.store.query_timeout_secs;
        }
        if std::env::var("HF_API_TOKEN").is_ok() {
            config.llm.hf_api_token = env_config.llm.hf_api_token;
        }
        if std::env::var("DISEASEKG_LLM_MODEL").is_ok() {
            config.llm.model = env_config.llm.model;
        }

        config
    }

    /// Parse listen address as SocketAddr
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(self.server.listen_addr.parse()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        if self.store.endpoint.is_empty() {
            anyhow::bail!("Store endpoint must not be empty");
        }
        if !self.store.endpoint.starts_with("http://") && !self.store.endpoint.starts_with("https://")
        {
            anyhow::bail!("Store endpoint must be an http(s) URL: {}", self.store.endpoint);
        }
        if self.store.query_timeout_secs == 0 {
            anyhow::bail!("Query timeout must be positive");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8000");
        assert_eq!(
            config.store.endpoint,
            "http://localhost:7200/repositories/disease-kg"
        );
        assert!(config.llm.hf_api_token.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_from_file_partial_document() {
        let config: ServerConfig = toml::from_str(
            r#"
            [store]
            endpoint = "http://graphdb:7200/repositories/kg"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.endpoint, "http://graphdb:7200/repositories/kg");
        // Untouched sections keep their defaults
        assert_eq!(config.server.listen_addr, "127.0.0.1:8000");
        assert_eq!(config.store.query_timeout_secs, 120);
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("DISEASEKG_HTTP_ADDR", "0.0.0.0:8080");
        std::env::set_var("DISEASEKG_STORE_ENDPOINT", "http://store:7200/repositories/x");

        let config = ServerConfig::from_env();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.store.endpoint, "http://store:7200/repositories/x");

        std::env::remove_var("DISEASEKG_HTTP_ADDR");
        std::env::remove_var("DISEASEKG_STORE_ENDPOINT");
    }

    #[test]
    fn test_load_applies_cors_toggle_from_env() {
        std::env::set_var("DISEASEKG_ENABLE_CORS", "false");

        let config = ServerConfig::load(None).unwrap();
        assert!(!config.server.enable_cors);

        std::env::remove_var("DISEASEKG_ENABLE_CORS");
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = ServerConfig::default();
        config.store.endpoint = "graphdb:7200".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_listen_addr() {
        let mut config = ServerConfig::default();
        config.server.listen_addr = "not an address".to_string();
        assert!(config.validate().is_err());
    }
}
