//! Shared-secret bearer authentication.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Validates requests against the configured bearer secret.
///
/// Accepts the token in either:
/// - `Authorization: Bearer <token>` (scheme is case-insensitive)
/// - `X-API-Key: <token>`
pub struct BearerTokenAuthenticator {
    expected_digest: [u8; 32],
    user_id: String,
}

impl BearerTokenAuthenticator {
    pub fn new(token: String) -> Self {
        let expected_digest = digest(&token);
        let fingerprint: String = expected_digest[..4]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        Self {
            expected_digest,
            user_id: format!("client-{}", fingerprint),
        }
    }

    fn extract_token<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        if let Some(header) = request.header("authorization") {
            let (scheme, token) = header.split_once(' ')?;
            if scheme.eq_ignore_ascii_case("bearer") {
                return Some(token.trim());
            }
            return None;
        }

        request.header("x-api-key").map(str::trim)
    }
}

#[async_trait]
impl Authenticator for BearerTokenAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let provided = self
            .extract_token(request)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NotAuthenticated)?;

        // Digests have equal length so the comparison time is independent of the input.
        if constant_time_eq(&digest(provided), &self.expected_digest) {
            Ok(Identity {
                user_id: self.user_id.clone(),
                method: "bearer".to_string(),
                claims: HashMap::from([(
                    "source_ip".to_string(),
                    serde_json::Value::String(request.source_ip.to_string()),
                )]),
            })
        } else {
            Err(AuthError::InvalidCredentials("invalid credential".to_string()))
        }
    }

    fn method_name(&self) -> &'static str {
        "bearer"
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(value.as_bytes()));
    out
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
