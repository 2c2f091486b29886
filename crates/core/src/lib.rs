pub mod artifact;
pub mod auth;
pub mod config;
pub mod jobs;
pub mod leads;
pub mod llm;
pub mod metrics;
pub mod retry;
pub mod search;
pub mod testing;

pub use artifact::{
    Artifact, ArtifactError, ArtifactId, ArtifactInfo, ArtifactStore, ExpiryReaper,
    FsArtifactStore, ReapReport, ReaperStatus,
};
pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, BearerTokenAuthenticator,
    Identity,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use jobs::{
    BuildStatus, CreateOutcome, DiscussOutcome, GeneratorConfig, GeneratorError, JobStatus,
    JobStore, JobSummary, LeadGenerator,
};
pub use leads::{Lead, LeadRequirement, LeadSource};
pub use llm::{GeminiClient, LlmClient, LlmError};
pub use search::{SearchClient, SearchError, SerperClient};
