//! In-memory artifact store for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::artifact::{Artifact, ArtifactError, ArtifactId, ArtifactInfo, ArtifactStore};

/// Artifact store keeping payloads in memory and counting calls.
///
/// Tombstones never expire here; `prune_tombstones` always returns 0.
#[derive(Default)]
pub struct MockArtifactStore {
    entries: RwLock<HashMap<ArtifactId, (ArtifactInfo, Vec<u8>)>>,
    tombstones: RwLock<HashMap<ArtifactId, DateTime<Utc>>>,
    failing_deletes: RwLock<HashSet<ArtifactId>>,
    put_calls: AtomicUsize,
    get_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl MockArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `delete` of `id` fail with a storage error.
    pub async fn fail_deletes_for(&self, id: &ArtifactId) {
        self.failing_deletes.write().await.insert(id.clone());
    }

    pub async fn contains(&self, id: &ArtifactId) -> bool {
        self.entries.read().await.contains_key(id)
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn missing(
        tombstones: &HashMap<ArtifactId, DateTime<Utc>>,
        id: &ArtifactId,
    ) -> ArtifactError {
        match tombstones.get(id) {
            Some(expired_at) => ArtifactError::Expired {
                id: id.clone(),
                expired_at: *expired_at,
            },
            None => ArtifactError::NotFound(id.clone()),
        }
    }
}

#[async_trait]
impl ArtifactStore for MockArtifactStore {
    async fn put(&self, payload: Vec<u8>, ttl_secs: u64) -> Result<ArtifactInfo, ArtifactError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let info = ArtifactInfo::new(ArtifactId::generate(), &payload, ttl_secs, Utc::now());
        self.entries
            .write()
            .await
            .insert(info.id.clone(), (info.clone(), payload));
        Ok(info)
    }

    async fn get(&self, id: &ArtifactId) -> Result<Artifact, ArtifactError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let entries = self.entries.read().await;
        match entries.get(id) {
            Some((info, _)) if info.is_expired_at(Utc::now()) => Err(ArtifactError::Expired {
                id: id.clone(),
                expired_at: info.expires_at,
            }),
            Some((info, payload)) => Ok(Artifact {
                info: info.clone(),
                payload: payload.clone(),
            }),
            None => Err(Self::missing(&*self.tombstones.read().await, id)),
        }
    }

    async fn delete(&self, id: &ArtifactId) -> Result<bool, ArtifactError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_deletes.read().await.contains(id) {
            return Err(ArtifactError::Storage(format!("simulated failure for {}", id)));
        }
        let removed = self.entries.write().await.remove(id);
        match removed {
            Some((info, _)) => {
                if info.is_expired_at(Utc::now()) {
                    self.tombstones
                        .write()
                        .await
                        .insert(id.clone(), info.expires_at);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> HashSet<ArtifactId> {
        self.entries
            .read()
            .await
            .values()
            .filter(|(info, _)| info.is_expired_at(now))
            .map(|(info, _)| info.id.clone())
            .collect()
    }

    async fn prune_tombstones(&self, _now: DateTime<Utc>) -> usize {
        0
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
