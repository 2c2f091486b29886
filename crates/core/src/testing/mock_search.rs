//! Mock search client for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::search::{OrganicResult, PlaceResult, SearchClient, SearchError, SearchRequest};

/// Which endpoint a recorded call hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Organic,
    Places,
}

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub kind: SearchKind,
    pub request: SearchRequest,
}

/// Mock implementation of the SearchClient trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable organic and places results
/// - Track requests and peak concurrency for assertions
/// - Simulate transient or permanent failures and slow responses
#[derive(Default)]
pub struct MockSearchClient {
    organic: Arc<RwLock<Vec<OrganicResult>>>,
    places: Arc<RwLock<Vec<PlaceResult>>>,
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    transient_failures: AtomicUsize,
    permanent_failure: AtomicBool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockSearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_organic(&self, results: Vec<OrganicResult>) {
        *self.organic.write().await = results;
    }

    pub async fn set_places(&self, results: Vec<PlaceResult>) {
        *self.places.write().await = results;
    }

    /// Sleep this long inside every call.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Fail the next `count` calls with a timeout.
    pub fn fail_transiently(&self, count: usize) {
        self.transient_failures.store(count, Ordering::SeqCst);
    }

    /// Fail every call with a non-retryable API error.
    pub fn fail_permanently(&self, fail: bool) {
        self.permanent_failure.store(fail, Ordering::SeqCst);
    }

    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    /// Highest number of calls observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, kind: SearchKind, request: &SearchRequest) -> Result<(), SearchError> {
        self.searches.write().await.push(RecordedSearch {
            kind,
            request: request.clone(),
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.permanent_failure.load(Ordering::SeqCst) {
            return Err(SearchError::ApiError {
                status: Some(403),
                message: "HTTP 403 Forbidden: invalid API key".to_string(),
            });
        }
        let consumed = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if consumed.is_ok() {
            return Err(SearchError::Timeout);
        }
        Ok(())
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<OrganicResult>, SearchError> {
        self.enter(SearchKind::Organic, request).await?;
        Ok(self.organic.read().await.clone())
    }

    async fn places(&self, request: &SearchRequest) -> Result<Vec<PlaceResult>, SearchError> {
        self.enter(SearchKind::Places, request).await?;
        Ok(self.places.read().await.clone())
    }
}
