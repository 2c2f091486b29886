use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Opaque artifact identifier (hyphenated UUID v4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse an id received from a caller. Anything that is not a UUID is
    /// rejected, so ids can be used as file names safely.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw)
            .ok()
            .map(|uuid| Self(uuid.hyphenated().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn filename(&self) -> String {
        format!("leads_{}.csv", self.0)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata of a stored artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub id: ArtifactId,
    pub created_at: DateTime<Utc>,
    pub ttl_secs: u64,
    pub expires_at: DateTime<Utc>,
    pub size_bytes: u64,
    /// Hex SHA-256 of the payload.
    pub sha256: String,
    pub filename: String,
}

impl ArtifactInfo {
    pub fn new(id: ArtifactId, payload: &[u8], ttl_secs: u64, created_at: DateTime<Utc>) -> Self {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        let expires_at = created_at
            .checked_add_signed(Duration::try_seconds(ttl).unwrap_or(Duration::MAX))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let sha256 = Sha256::digest(payload)
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();

        Self {
            filename: id.filename(),
            id,
            created_at,
            ttl_secs,
            expires_at,
            size_bytes: payload.len() as u64,
            sha256,
        }
    }

    /// Expired once `now` reaches `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// An artifact with its payload.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub info: ArtifactInfo,
    pub payload: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {0}")]
    NotFound(ArtifactId),

    #[error("artifact {id} expired at {expired_at}")]
    Expired {
        id: ArtifactId,
        expired_at: DateTime<Utc>,
    },

    #[error("artifact storage failure: {0}")]
    Storage(String),
}

impl From<std::io::Error> for ArtifactError {
    fn from(e: std::io::Error) -> Self {
        ArtifactError::Storage(e.to_string())
    }
}
