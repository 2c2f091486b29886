use std::sync::Arc;

use leadgen_core::{
    ArtifactStore, Authenticator, Config, ExpiryReaper, LeadGenerator, ReaperStatus,
    SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    artifacts: Arc<dyn ArtifactStore>,
    generator: Arc<LeadGenerator>,
    reaper: Option<Arc<ExpiryReaper>>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        artifacts: Arc<dyn ArtifactStore>,
        generator: Arc<LeadGenerator>,
    ) -> Self {
        Self {
            config,
            authenticator,
            artifacts,
            generator,
            reaper: None,
        }
    }

    pub fn with_reaper(mut self, reaper: Arc<ExpiryReaper>) -> Self {
        self.reaper = Some(reaper);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn artifacts(&self) -> &dyn ArtifactStore {
        self.artifacts.as_ref()
    }

    pub fn generator(&self) -> &Arc<LeadGenerator> {
        &self.generator
    }

    pub fn reaper_status(&self) -> Option<ReaperStatus> {
        self.reaper.as_ref().map(|reaper| reaper.status())
    }
}
