//! Lazy photo loading for the visible page
//!
//! Given the identities on screen, the loader fetches photos only for those
//! without a cache entry and without a fetch already in flight. Each
//! identity is claimed before its request goes out and released when the
//! request settles, so a second request for a pending identity is dropped
//! rather than queued.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use facemash_common::PersonId;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::PersonsApi;
use crate::events::{EventBus, ScreenEvent};
use crate::imaging::PhotoSize;
use crate::photo_cache::PhotoCache;

/// Tally of one [`PhotoLoader::load_visible`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhotoLoadReport {
    /// Fetches that wrote a cache entry
    pub loaded: usize,
    /// Fetches that failed; the entry stays absent
    pub failed: usize,
    /// Identities that already had an entry
    pub cached: usize,
    /// Identities with a fetch already in flight
    pub in_flight: usize,
    /// Responses discarded because the loader was disposed
    pub dropped: usize,
}

enum FetchOutcome {
    Loaded,
    Failed,
    Dropped,
}

/// Claim on one identity; released on drop
struct InFlightClaim<'a> {
    set: &'a Mutex<HashSet<PersonId>>,
    id: PersonId,
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

pub struct PhotoLoader {
    api: Arc<dyn PersonsApi>,
    cache: Arc<PhotoCache>,
    events: Arc<EventBus>,
    size: PhotoSize,
    in_flight: Mutex<HashSet<PersonId>>,
    cancel: CancellationToken,
}

impl PhotoLoader {
    pub fn new(
        api: Arc<dyn PersonsApi>,
        cache: Arc<PhotoCache>,
        events: Arc<EventBus>,
        size: PhotoSize,
    ) -> Self {
        Self {
            api,
            cache,
            events,
            size,
            in_flight: Mutex::new(HashSet::new()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn size(&self) -> PhotoSize {
        self.size
    }

    /// Identities with a fetch currently pending
    pub fn in_flight(&self) -> Vec<PersonId> {
        let mut ids: Vec<_> = self.lock_in_flight().iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Fetch missing photos for `ids`, concurrently
    ///
    /// Completes when every fetch claimed by this call has settled. Failures
    /// are logged and counted, never returned.
    pub async fn load_visible(&self, ids: &[PersonId]) -> PhotoLoadReport {
        let mut report = PhotoLoadReport::default();
        if self.is_disposed() {
            return report;
        }

        let claims = self.claim(ids, &mut report);
        if claims.is_empty() {
            return report;
        }

        debug!(count = claims.len(), "Fetching photos for visible page");
        let outcomes = join_all(claims.into_iter().map(|claim| self.fetch_one(claim))).await;
        for outcome in outcomes {
            match outcome {
                FetchOutcome::Loaded => report.loaded += 1,
                FetchOutcome::Failed => report.failed += 1,
                FetchOutcome::Dropped => report.dropped += 1,
            }
        }

        if report.loaded > 0 || report.failed > 0 {
            info!(
                loaded = report.loaded,
                failed = report.failed,
                "Photo pass finished"
            );
        }
        report
    }

    /// Run [`load_visible`](Self::load_visible) in the background
    pub fn spawn_visible(self: &Arc<Self>, ids: Vec<PersonId>) -> JoinHandle<PhotoLoadReport> {
        let loader = Arc::clone(self);
        tokio::spawn(async move { loader.load_visible(&ids).await })
    }

    /// Stop writing to the cache; pending responses are discarded
    pub fn dispose(&self) {
        if !self.cancel.is_cancelled() {
            debug!("Photo loader disposed");
            self.cancel.cancel();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn claim(&self, ids: &[PersonId], report: &mut PhotoLoadReport) -> Vec<InFlightClaim<'_>> {
        let mut in_flight = self.lock_in_flight();
        let mut claims = Vec::new();
        for &id in ids {
            if self.cache.has(id) {
                report.cached += 1;
            } else if !in_flight.insert(id) {
                report.in_flight += 1;
            } else {
                claims.push(InFlightClaim {
                    set: &self.in_flight,
                    id,
                });
            }
        }
        claims
    }

    async fn fetch_one(&self, claim: InFlightClaim<'_>) -> FetchOutcome {
        let id = claim.id;
        let result = tokio::select! {
            _ = self.cancel.cancelled() => None,
            result = self.api.fetch_person(id, self.size) => Some(result),
        };

        let outcome = match result {
            _ if self.cancel.is_cancelled() => {
                debug!(person_id = id, "Dropping photo response after dispose");
                FetchOutcome::Dropped
            }
            None => FetchOutcome::Dropped,
            Some(Ok(person)) => {
                let payload = if person.photo.is_real() {
                    person.photo
                } else {
                    Default::default()
                };
                if self.cache.set(id, payload) {
                    self.events.emit_lossy(ScreenEvent::PhotoLoaded {
                        person_id: id,
                        timestamp: Utc::now(),
                    });
                }
                FetchOutcome::Loaded
            }
            Some(Err(e)) => {
                warn!(person_id = id, error = %e, "Failed to load photo");
                FetchOutcome::Failed
            }
        };

        drop(claim);
        outcome
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashSet<PersonId>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for PhotoLoader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
