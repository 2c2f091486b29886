use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0 and the base URL is http(s)
/// - Bearer token, upstream API keys and owner number are present
/// - Artifact TTL is at least one second and the reaper runs more often than it
/// - Outbound concurrency is at least 1
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }
    let base_url = &config.server.base_url;
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(invalid("server.base_url must start with http:// or https://"));
    }

    if config.auth.token.trim().is_empty() {
        return Err(invalid("auth.token (AUTH_TOKEN) must be set"));
    }

    // Artifact lifecycle
    let artifacts = &config.artifacts;
    if artifacts.ttl_secs == 0 {
        return Err(invalid("artifacts.ttl_secs must be at least 1"));
    }
    if let Some(interval) = artifacts.reap_interval_secs {
        if interval == 0 || interval >= artifacts.ttl_secs {
            return Err(invalid(
                "artifacts.reap_interval_secs must be between 1 and ttl_secs - 1",
            ));
        }
    }

    if config.pipeline.max_concurrency == 0 {
        return Err(invalid("pipeline.max_concurrency must be at least 1"));
    }
    if config.pipeline.max_queries == 0 {
        return Err(invalid("pipeline.max_queries must be at least 1"));
    }

    // Upstream credentials
    if config.search.api_key.is_empty() {
        return Err(invalid("search.api_key (SERPER_API_KEY) must be set"));
    }
    if config.llm.api_key.is_empty() {
        return Err(invalid("llm.api_key (GEMINI_API_KEY) must be set"));
    }
    if config.identity.owner_number.is_empty() {
        return Err(invalid("identity.owner_number (MY_NUMBER) must be set"));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
