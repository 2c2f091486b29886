//! File-backed artifact store.
//!
//! Metadata lives in memory behind a single lock; payloads live in one file per
//! artifact. File I/O never happens while the lock is held.

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::store::ArtifactStore;
use super::types::{Artifact, ArtifactError, ArtifactId, ArtifactInfo};
use crate::metrics;

#[derive(Debug, Clone)]
struct Entry {
    info: ArtifactInfo,
    path: PathBuf,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<ArtifactId, Entry>,
    /// Reaped ids mapped to their former `expires_at`.
    tombstones: HashMap<ArtifactId, DateTime<Utc>>,
}

impl StoreState {
    /// Error for an id with no usable entry.
    fn missing(&self, id: &ArtifactId) -> ArtifactError {
        match self.tombstones.get(id) {
            Some(expired_at) => ArtifactError::Expired {
                id: id.clone(),
                expired_at: *expired_at,
            },
            None => ArtifactError::NotFound(id.clone()),
        }
    }
}

/// Artifact store writing payloads under a single directory.
pub struct FsArtifactStore {
    dir: PathBuf,
    tombstone_retention: chrono::Duration,
    state: RwLock<StoreState>,
}

impl FsArtifactStore {
    /// Open the store, creating `dir` if needed.
    ///
    /// Metadata is not persisted, so payload files left behind by a previous
    /// process can never be served again and are removed here.
    pub async fn open(
        dir: impl Into<PathBuf>,
        tombstone_retention: std::time::Duration,
    ) -> Result<Self, ArtifactError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let removed = sweep_stale_files(&dir).await?;
        if removed > 0 {
            info!(dir = %dir.display(), removed, "Removed stale artifact files");
        }

        Ok(Self {
            dir,
            tombstone_retention: chrono::Duration::from_std(tombstone_retention)
                .unwrap_or(chrono::Duration::MAX),
            state: RwLock::new(StoreState::default()),
        })
    }

    async fn write_payload(&self, id: &ArtifactId, payload: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.dir.join(id.filename());
        let tmp = self.dir.join(format!("{}.tmp", id));

        if let Err(e) = tokio::fs::write(&tmp, payload).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(path)
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, payload: Vec<u8>, ttl_secs: u64) -> Result<ArtifactInfo, ArtifactError> {
        let id = ArtifactId::generate();

        // The file is complete before the entry becomes visible.
        let path = self.write_payload(&id, &payload).await.map_err(|e| {
            warn!(artifact_id = %id, error = %e, "Failed to write artifact payload");
            ArtifactError::from(e)
        })?;

        let info = ArtifactInfo::new(id.clone(), &payload, ttl_secs, Utc::now());
        let live = {
            let mut state = self.state.write().await;
            state.entries.insert(
                id.clone(),
                Entry {
                    info: info.clone(),
                    path,
                },
            );
            state.entries.len()
        };

        metrics::ARTIFACTS_CREATED.inc();
        metrics::ARTIFACT_SIZE
            .with_label_values(&[])
            .observe(info.size_bytes as f64);
        metrics::ARTIFACTS_LIVE.set(live as i64);

        debug!(
            artifact_id = %id,
            size_bytes = info.size_bytes,
            expires_at = %info.expires_at,
            "Stored artifact"
        );
        Ok(info)
    }

    async fn get(&self, id: &ArtifactId) -> Result<Artifact, ArtifactError> {
        let entry = {
            let state = self.state.read().await;
            match state.entries.get(id) {
                Some(entry) => entry.clone(),
                None => return Err(state.missing(id)),
            }
        };

        if entry.info.is_expired_at(Utc::now()) {
            return Err(ArtifactError::Expired {
                id: id.clone(),
                expired_at: entry.info.expires_at,
            });
        }

        match tokio::fs::read(&entry.path).await {
            Ok(payload) => Ok(Artifact {
                info: entry.info,
                payload,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // Deleted between the lookup and the read.
                let state = self.state.read().await;
                if state.entries.contains_key(id) {
                    Err(ArtifactError::Storage(format!(
                        "payload file missing for {}",
                        id
                    )))
                } else {
                    Err(state.missing(id))
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &ArtifactId) -> Result<bool, ArtifactError> {
        let now = Utc::now();
        let entry = {
            let mut state = self.state.write().await;
            let Some(entry) = state.entries.remove(id) else {
                return Ok(false);
            };
            if entry.info.is_expired_at(now) {
                state.tombstones.insert(id.clone(), entry.info.expires_at);
            }
            entry
        };

        match tokio::fs::remove_file(&entry.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(artifact_id = %id, "Artifact file already gone");
            }
            Err(e) => {
                // Restore the entry so a later reaper tick retries the removal.
                let mut state = self.state.write().await;
                state.tombstones.remove(id);
                state.entries.insert(id.clone(), entry);
                return Err(e.into());
            }
        }

        let live = self.state.read().await.entries.len();
        metrics::ARTIFACTS_LIVE.set(live as i64);
        debug!(artifact_id = %id, "Deleted artifact");
        Ok(true)
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> HashSet<ArtifactId> {
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .filter(|(_, entry)| entry.info.is_expired_at(now))
            .map(|(id, _)| id.clone())
            .collect()
    }

    async fn prune_tombstones(&self, now: DateTime<Utc>) -> usize {
        let retention = self.tombstone_retention;
        let mut state = self.state.write().await;
        let before = state.tombstones.len();
        state.tombstones.retain(|_, expired_at| {
            expired_at
                .checked_add_signed(retention)
                .is_none_or(|until| until > now)
        });
        before - state.tombstones.len()
    }

    async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }
}

async fn sweep_stale_files(dir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let stale =
            (name.starts_with("leads_") && name.ends_with(".csv")) || name.ends_with(".tmp");
        if !stale || !entry.file_type().await?.is_file() {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => warn!(file = %name, error = %e, "Failed to remove stale artifact file"),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> FsArtifactStore {
        FsArtifactStore::open(dir.path(), Duration::from_secs(3600))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get_returns_exact_bytes() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let payload = b"name,phone\r\n\"Acme, Inc\",555\r\n".to_vec();
        let info = store.put(payload.clone(), 3600).await.unwrap();
        let artifact = store.get(&info.id).await.unwrap();

        assert_eq!(artifact.payload, payload);
        assert_eq!(artifact.info, info);
        assert!(dir.path().join(info.id.filename()).exists());
    }

    #[tokio::test]
    async fn test_no_temp_files_left_after_put() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.put(b"a".to_vec(), 60).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(!names[0].ends_with(".tmp"));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let result = store.get(&ArtifactId::generate()).await;
        assert!(matches!(result, Err(ArtifactError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_expired_entry_reports_expired_before_reaping() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let info = store.put(b"x".to_vec(), 0).await.unwrap();
        assert!(matches!(
            store.get(&info.id).await,
            Err(ArtifactError::Expired { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let info = store.put(b"x".to_vec(), 3600).await.unwrap();

        assert!(store.delete(&info.id).await.unwrap());
        assert!(!store.delete(&info.id).await.unwrap());
        assert!(!dir.path().join(info.id.filename()).exists());
    }

    #[tokio::test]
    async fn test_delete_of_live_artifact_leaves_no_tombstone() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let info = store.put(b"x".to_vec(), 3600).await.unwrap();

        store.delete(&info.id).await.unwrap();
        assert!(matches!(
            store.get(&info.id).await,
            Err(ArtifactError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_deleted_expired_artifact_stays_expired() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let info = store.put(b"x".to_vec(), 0).await.unwrap();

        assert!(store.delete(&info.id).await.unwrap());
        assert!(matches!(
            store.get(&info.id).await,
            Err(ArtifactError::Expired { .. })
        ));
    }

    #[tokio::test]
    async fn test_tombstones_pruned_after_retention() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::open(dir.path(), Duration::from_secs(10))
            .await
            .unwrap();
        let info = store.put(b"x".to_vec(), 0).await.unwrap();
        store.delete(&info.id).await.unwrap();

        assert_eq!(store.prune_tombstones(Utc::now()).await, 0);
        let later = Utc::now() + chrono::Duration::seconds(11);
        assert_eq!(store.prune_tombstones(later).await, 1);
        assert!(matches!(
            store.get(&info.id).await,
            Err(ArtifactError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_on_delete_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let info = store.put(b"x".to_vec(), 3600).await.unwrap();
        std::fs::remove_file(dir.path().join(info.id.filename())).unwrap();

        assert!(store.delete(&info.id).await.unwrap());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_failed_file_removal_keeps_entry() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let info = store.put(b"x".to_vec(), 3600).await.unwrap();

        // A directory in place of the payload makes remove_file fail.
        let path = dir.path().join(info.id.filename());
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let result = store.delete(&info.id).await;
        assert!(matches!(result, Err(ArtifactError::Storage(_))));
        assert_eq!(store.len().await, 1);

        std::fs::remove_dir(&path).unwrap();
        assert!(store.delete(&info.id).await.unwrap());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_list_expired_only_returns_lapsed_entries() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let short = store.put(b"a".to_vec(), 0).await.unwrap();
        let long = store.put(b"b".to_vec(), 3600).await.unwrap();

        let expired = store.list_expired(Utc::now()).await;
        assert!(expired.contains(&short.id));
        assert!(!expired.contains(&long.id));
    }

    #[tokio::test]
    async fn test_open_sweeps_stale_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("leads_old.csv"), b"old").unwrap();
        std::fs::write(dir.path().join("abc.tmp"), b"partial").unwrap();
        std::fs::write(dir.path().join("keep.txt"), b"other").unwrap();

        let store = open_store(&dir).await;

        assert!(!dir.path().join("leads_old.csv").exists());
        assert!(!dir.path().join("abc.tmp").exists());
        assert!(dir.path().join("keep.txt").exists());
        assert_eq!(store.len().await, 0);
    }
}
