use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Flat environment variables of the deployment mapped to their config keys.
pub const ENV_ALIASES: &[(&str, &str)] = &[
    ("AUTH_TOKEN", "auth.token"),
    ("HOST", "server.host"),
    ("PORT", "server.port"),
    ("BASE_URL", "server.base_url"),
    ("CSV_TTL_SECONDS", "artifacts.ttl_secs"),
    ("CSV_STORAGE_DIR", "artifacts.storage_dir"),
    ("REAPER_INTERVAL_SECONDS", "artifacts.reap_interval_secs"),
    ("MAX_CONCURRENCY", "pipeline.max_concurrency"),
    ("SERPER_API_KEY", "search.api_key"),
    ("GEMINI_API_KEY", "llm.api_key"),
    ("MY_NUMBER", "identity.owner_number"),
];

/// Load configuration from an optional TOML file, then the environment.
///
/// Precedence (lowest first): serde defaults, the file, the flat variables in
/// [`ENV_ALIASES`], then `LEADGEN_`-prefixed nested variables such as
/// `LEADGEN_PIPELINE__MAX_RETRIES`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::new();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    let config: Config = figment
        .merge(alias_env())
        .merge(Env::prefixed("LEADGEN_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn alias_env() -> Env {
    let names: Vec<&str> = ENV_ALIASES.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        ENV_ALIASES
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, path)| (*path).into())
            .unwrap_or_else(|| key.into())
    })
}
