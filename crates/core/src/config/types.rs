use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub agent: AgentConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("bookdex.db")
}

/// External agent configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    /// Base URL of an OpenAI-compatible API (e.g. "https://api.openai.com/v1")
    pub base_url: String,
    /// API key
    pub api_key: String,
    /// Model name/identifier
    pub model: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Cache lookup tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LookupConfig {
    /// Minimum text-search hits required to trust the cache without
    /// consulting the agent (default: 3)
    #[serde(default = "default_text_match_threshold")]
    pub text_match_threshold: usize,
    /// Maximum text-search results to fetch (default: 10)
    #[serde(default = "default_text_search_limit")]
    pub text_search_limit: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            text_match_threshold: default_text_match_threshold(),
            text_search_limit: default_text_search_limit(),
        }
    }
}

fn default_text_match_threshold() -> usize {
    3
}

fn default_text_search_limit() -> u32 {
    10
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub agent: SanitizedAgentConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub lookup: LookupConfig,
}

/// Sanitized agent config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAgentConfig {
    pub base_url: String,
    pub model: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            agent: SanitizedAgentConfig {
                base_url: config.agent.base_url.clone(),
                model: config.agent.model.clone(),
                api_key_configured: !config.agent.api_key.is_empty(),
                timeout_secs: config.agent.timeout_secs,
            },
            server: config.server.clone(),
            database: config.database.clone(),
            lookup: config.lookup.clone(),
        }
    }
}
