use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::types::{Artifact, ArtifactError, ArtifactId, ArtifactInfo};

/// Registry of temporary artifacts.
///
/// Operations on distinct ids are independent. For a single id, a `get`
/// racing a `delete` observes either the complete payload or a clean
/// `NotFound`/`Expired`.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store a payload under a fresh id. Fails only on storage errors.
    async fn put(&self, payload: Vec<u8>, ttl_secs: u64) -> Result<ArtifactInfo, ArtifactError>;

    /// Return the payload while `now < expires_at`. Never extends the TTL.
    async fn get(&self, id: &ArtifactId) -> Result<Artifact, ArtifactError>;

    /// Remove an artifact. Returns whether an entry was removed.
    async fn delete(&self, id: &ArtifactId) -> Result<bool, ArtifactError>;

    /// Snapshot of ids whose `expires_at <= now`.
    async fn list_expired(&self, now: DateTime<Utc>) -> HashSet<ArtifactId>;

    /// Drop expiry tombstones older than the retention window.
    async fn prune_tombstones(&self, now: DateTime<Utc>) -> usize;

    /// Number of live entries.
    async fn len(&self) -> usize;
}
