use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL used to build absolute download links.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
        }
    }
}

impl ServerConfig {
    /// Absolute download link for an artifact id.
    pub fn download_url(&self, artifact_id: &str) -> String {
        format!(
            "{}/download/{}",
            self.base_url.trim_end_matches('/'),
            artifact_id
        )
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8086
}

fn default_base_url() -> String {
    "http://localhost:8086".to_string()
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Shared bearer secret presented by every caller.
    pub token: String,
}

/// Temporary artifact storage
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactConfig {
    /// Lifetime of a generated CSV, counted from creation.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Directory holding artifact payload files.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    /// Reaper period. Derived from the TTL when unset.
    #[serde(default)]
    pub reap_interval_secs: Option<u64>,
    /// How long a reaped id keeps answering "expired" instead of "not found".
    #[serde(default = "default_tombstone_retention_secs")]
    pub tombstone_retention_secs: u64,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            storage_dir: default_storage_dir(),
            reap_interval_secs: None,
            tombstone_retention_secs: default_tombstone_retention_secs(),
        }
    }
}

impl ArtifactConfig {
    /// Effective reaper interval: the explicit value, or ttl/10 clamped to
    /// [100ms, 300s]. Always shorter than a TTL of at least one second.
    pub fn reap_interval(&self) -> Duration {
        match self.reap_interval_secs {
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_millis(self.ttl_secs.saturating_mul(100).clamp(100, 300_000)),
        }
    }

    pub fn tombstone_retention(&self) -> Duration {
        Duration::from_secs(self.tombstone_retention_secs)
    }
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_storage_dir() -> PathBuf {
    std::env::temp_dir().join("leadgen-artifacts")
}

fn default_tombstone_retention_secs() -> u64 {
    86_400
}

/// Lead generation pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Maximum simultaneous outbound search calls.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
    /// Upper bound on generated search queries per job.
    #[serde(default = "default_max_queries")]
    pub max_queries: usize,
    /// Results requested from each organic search.
    #[serde(default = "default_results_per_query")]
    pub results_per_query: u32,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            default_max_results: default_max_results(),
            max_queries: default_max_queries(),
            results_per_query: default_results_per_query(),
            retry: RetryConfig::default(),
        }
    }
}

fn default_max_concurrency() -> usize {
    4
}

fn default_max_results() -> usize {
    50
}

fn default_max_queries() -> usize {
    5
}

fn default_results_per_query() -> u32 {
    20
}

/// Retry policy for transient upstream failures
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Extra attempts after the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.max(1.0).powi(attempt as i32);
        let ms = (self.initial_delay_ms as f64 * factor).min(self.max_delay_ms as f64);
        Duration::from_millis(ms as u64)
    }
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    5_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

/// Web search API (Serper) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_search_api_base")]
    pub api_base: String,
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
    /// Country hint sent with localized queries.
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_search_api_base(),
            timeout_secs: default_search_timeout(),
            country: default_country(),
            language: default_language(),
        }
    }
}

fn default_search_api_base() -> String {
    "https://google.serper.dev".to_string()
}

fn default_search_timeout() -> u64 {
    30
}

fn default_country() -> String {
    "us".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

/// Language model (Gemini) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_api_base")]
    pub api_base: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_llm_model(),
            api_base: default_llm_api_base(),
            timeout_secs: default_llm_timeout(),
            max_tokens: default_llm_max_tokens(),
        }
    }
}

fn default_llm_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_llm_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_llm_max_tokens() -> u32 {
    1024
}

/// Identity reported by the `validate` tool
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IdentityConfig {
    /// Operator phone number returned to the calling agent.
    #[serde(default)]
    pub owner_number: String,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub artifacts: ArtifactConfig,
    pub pipeline: PipelineConfig,
    pub search: SanitizedSearchConfig,
    pub llm: SanitizedLlmConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub token_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSearchConfig {
    pub api_base: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedLlmConfig {
    pub model: String,
    pub api_base: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: "bearer".to_string(),
                token_configured: !config.auth.token.is_empty(),
            },
            server: config.server.clone(),
            artifacts: config.artifacts.clone(),
            pipeline: config.pipeline.clone(),
            search: SanitizedSearchConfig {
                api_base: config.search.api_base.clone(),
                api_key_configured: !config.search.api_key.is_empty(),
                timeout_secs: config.search.timeout_secs,
            },
            llm: SanitizedLlmConfig {
                model: config.llm.model.clone(),
                api_base: config.llm.api_base.clone(),
                api_key_configured: !config.llm.api_key.is_empty(),
                timeout_secs: config.llm.timeout_secs,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[auth]
token = "secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.auth.token, "secret");
        assert_eq!(config.server.port, 8086);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.server.base_url, "http://localhost:8086");
        assert_eq!(config.artifacts.ttl_secs, 3600);
        assert_eq!(config.pipeline.max_concurrency, 4);
        assert_eq!(config.llm.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_deserialize_missing_auth_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_reap_interval_derived_from_ttl() {
        let mut artifacts = ArtifactConfig::default();
        assert_eq!(artifacts.reap_interval(), Duration::from_secs(300));

        artifacts.ttl_secs = 60;
        assert_eq!(artifacts.reap_interval(), Duration::from_secs(6));

        artifacts.ttl_secs = 5;
        assert_eq!(artifacts.reap_interval(), Duration::from_millis(500));

        artifacts.ttl_secs = 1;
        assert_eq!(artifacts.reap_interval(), Duration::from_millis(100));
        assert!(artifacts.reap_interval() < Duration::from_secs(artifacts.ttl_secs));

        artifacts.ttl_secs = 5;
        artifacts.reap_interval_secs = Some(2);
        assert_eq!(artifacts.reap_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_retry_delay_grows_and_caps() {
        let retry = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 350,
            backoff_multiplier: 2.0,
        };
        assert_eq!(retry.delay_for(0), Duration::from_millis(100));
        assert_eq!(retry.delay_for(1), Duration::from_millis(200));
        assert_eq!(retry.delay_for(2), Duration::from_millis(350));
    }

    #[test]
    fn test_download_url_ignores_trailing_slash() {
        let server = ServerConfig {
            base_url: "https://leads.example.com/".to_string(),
            ..ServerConfig::default()
        };
        assert_eq!(
            server.download_url("abc"),
            "https://leads.example.com/download/abc"
        );
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let toml = r#"
[auth]
token = "super-secret"

[search]
api_key = "serper-key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.auth.token_configured);
        assert!(sanitized.search.api_key_configured);
        assert!(!sanitized.llm.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!json.contains("serper-key"));
    }
}
