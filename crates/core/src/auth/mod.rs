mod bearer;
mod traits;
mod types;

pub use bearer::*;
pub use traits::*;
pub use types::*;

use crate::config::AuthConfig;

/// Build the request authenticator from config.
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    if config.token.trim().is_empty() {
        return Err(AuthError::ConfigurationError(
            "auth.token must be set".to_string(),
        ));
    }
    Ok(Box::new(BearerTokenAuthenticator::new(config.token.clone())))
}
