//! Bulk roster store
//!
//! Holds the roster (without photos) fetched once per screen mount. Readers
//! get a cheap `Arc` snapshot; a refresh swaps the whole list.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use facemash_common::{Person, PersonId};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::api::PersonsApi;
use crate::error::GatewayError;
use crate::events::{EventBus, ScreenEvent};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RosterStatus {
    #[default]
    NotLoaded,
    Loaded,
    /// Last fetch failed; any previously loaded roster is kept
    Failed(GatewayError),
}

pub struct RosterStore {
    api: Arc<dyn PersonsApi>,
    events: Arc<EventBus>,
    persons: RwLock<Arc<Vec<Person>>>,
    status: RwLock<RosterStatus>,
    /// Serializes fetches so concurrent loads share one request
    fetch_lock: Mutex<()>,
}

impl RosterStore {
    pub fn new(api: Arc<dyn PersonsApi>, events: Arc<EventBus>) -> Self {
        Self {
            api,
            events,
            persons: RwLock::new(Arc::new(Vec::new())),
            status: RwLock::new(RosterStatus::NotLoaded),
            fetch_lock: Mutex::new(()),
        }
    }

    /// Fetch the roster unless it is already loaded
    ///
    /// Returns the number of people in the roster.
    pub async fn load(&self) -> Result<usize, GatewayError> {
        let _guard = self.fetch_lock.lock().await;
        if self.status() == RosterStatus::Loaded {
            return Ok(self.len());
        }
        self.fetch().await
    }

    /// Fetch the roster again, replacing the current one on success
    pub async fn refresh(&self) -> Result<usize, GatewayError> {
        let _guard = self.fetch_lock.lock().await;
        self.fetch().await
    }

    async fn fetch(&self) -> Result<usize, GatewayError> {
        match self.api.fetch_roster().await {
            Ok(persons) => {
                let count = persons.len();
                *self.persons.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(persons);
                *self.status.write().unwrap_or_else(|e| e.into_inner()) = RosterStatus::Loaded;

                info!(count, "Roster loaded");
                self.events.emit_lossy(ScreenEvent::RosterLoaded {
                    count,
                    timestamp: Utc::now(),
                });
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "Roster fetch failed");
                *self.status.write().unwrap_or_else(|e| e.into_inner()) =
                    RosterStatus::Failed(e.clone());
                self.events.emit_lossy(ScreenEvent::RosterFailed {
                    kind: e.kind,
                    message: e.message.clone(),
                    timestamp: Utc::now(),
                });
                Err(e)
            }
        }
    }

    /// Current roster; empty until the first successful load
    pub fn snapshot(&self) -> Arc<Vec<Person>> {
        Arc::clone(&self.persons.read().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn status(&self) -> RosterStatus {
        self.status.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn get(&self, id: PersonId) -> Option<Person> {
        self.snapshot().iter().find(|p| p.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
