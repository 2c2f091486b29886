//! Testing utilities and mock implementations.
//!
//! Mocks for the language model, the search API and the artifact store, so the
//! pipeline and the HTTP layer can be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use leadgen_core::testing::{fixtures, MockLlmClient, MockSearchClient};
//!
//! let llm = MockLlmClient::new();
//! llm.respond_when("search queries", "dentists Toronto phone").await;
//!
//! let search = MockSearchClient::new();
//! search.set_places(vec![fixtures::place("Bright Smiles", "(416) 555-0100")]).await;
//! ```

mod mock_artifact_store;
mod mock_llm;
mod mock_search;

pub use mock_artifact_store::MockArtifactStore;
pub use mock_llm::MockLlmClient;
pub use mock_search::{MockSearchClient, RecordedSearch, SearchKind};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::{Config, RetryConfig};
    use crate::leads::LeadRequirement;
    use crate::search::{OrganicResult, PlaceResult};

    /// A configuration that passes validation.
    pub fn config(token: &str) -> Config {
        let mut config: Config = toml::from_str(&format!(
            r#"
[auth]
token = "{token}"

[search]
api_key = "test-serper-key"

[llm]
api_key = "test-gemini-key"

[identity]
owner_number = "15550001111"
"#
        ))
        .unwrap_or_else(|e| panic!("fixture config must parse: {e}"));
        config.pipeline.retry = fast_retry();
        config
    }

    /// Retry policy with millisecond delays.
    pub fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 2,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
        }
    }

    pub fn requirements(industry: &str, location: &str) -> LeadRequirement {
        LeadRequirement::new(industry, location)
    }

    /// Organic result whose snippet carries `phone`.
    pub fn organic(title: &str, phone: &str) -> OrganicResult {
        OrganicResult {
            title: title.to_string(),
            link: format!(
                "https://{}.example.com",
                title.to_lowercase().replace(' ', "-")
            ),
            snippet: format!("{} - call us at {} for an appointment", title, phone),
        }
    }

    pub fn place(title: &str, phone: &str) -> PlaceResult {
        PlaceResult {
            title: title.to_string(),
            address: Some("100 Main St".to_string()),
            phone_number: Some(phone.to_string()),
            website: None,
            rating: Some(4.6),
        }
    }

    /// Model reply for the requirements prompt.
    pub fn requirements_reply(industry: &str, location: &str) -> String {
        format!(
            r#"```json
{{"industry": "{industry}", "location": "{location}", "required_fields": ["name", "phone"], "additional_criteria": null, "max_results": 25, "clarifying_questions": []}}
```"#
        )
    }
}
