use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Agent section is complete (non-empty base URL, API key and model)
/// - Server port is not 0
/// - Lookup thresholds are usable
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.agent.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "agent.base_url cannot be empty".to_string(),
        ));
    }
    if !config.agent.base_url.starts_with("http://") && !config.agent.base_url.starts_with("https://")
    {
        return Err(ConfigError::ValidationError(format!(
            "agent.base_url must be an http(s) URL, got {:?}",
            config.agent.base_url
        )));
    }
    if config.agent.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "agent.api_key cannot be empty".to_string(),
        ));
    }
    if config.agent.model.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "agent.model cannot be empty".to_string(),
        ));
    }
    if config.agent.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "agent.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.lookup.text_match_threshold == 0 {
        return Err(ConfigError::ValidationError(
            "lookup.text_match_threshold cannot be 0".to_string(),
        ));
    }
    if config.lookup.text_search_limit == 0 {
        return Err(ConfigError::ValidationError(
            "lookup.text_search_limit cannot be 0".to_string(),
        ));
    }
    if (config.lookup.text_search_limit as usize) < config.lookup.text_match_threshold {
        return Err(ConfigError::ValidationError(format!(
            "lookup.text_search_limit ({}) is below text_match_threshold ({}), the text tier could never trigger",
            config.lookup.text_search_limit, config.lookup.text_match_threshold
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgentConfig, Config, DatabaseConfig, LookupConfig, ServerConfig};
    use std::net::IpAddr;

    fn valid_config() -> Config {
        Config {
            agent: AgentConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: "sk-test".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 30,
            },
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            lookup: LookupConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server = ServerConfig {
            host: "0.0.0.0".parse::<IpAddr>().unwrap(),
            port: 0,
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_empty_api_key_fails() {
        let mut config = valid_config();
        config.agent.api_key = "".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_non_http_base_url_fails() {
        let mut config = valid_config();
        config.agent.base_url = "ftp://example.com".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_limit_below_threshold_fails() {
        let mut config = valid_config();
        config.lookup.text_match_threshold = 5;
        config.lookup.text_search_limit = 3;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_threshold_fails() {
        let mut config = valid_config();
        config.lookup.text_match_threshold = 0;
        assert!(validate_config(&config).is_err());
    }
}
