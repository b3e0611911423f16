//! Per-identity photo cache
//!
//! Entries are written once and never evicted for the lifetime of a screen.
//! An absent entry means "not fetched yet"; a fetched person without a usable
//! photo is stored as [`PhotoPayload::None`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use facemash_common::{PersonId, PhotoPayload};

/// Read access to cached photos, as seen by the filter pipeline
pub trait PhotoLookup {
    fn cached_photo(&self, id: PersonId) -> Option<Arc<PhotoPayload>>;
}

/// Lookup that never has anything cached
pub struct NoPhotos;

impl PhotoLookup for NoPhotos {
    fn cached_photo(&self, _id: PersonId) -> Option<Arc<PhotoPayload>> {
        None
    }
}

impl PhotoLookup for HashMap<PersonId, Arc<PhotoPayload>> {
    fn cached_photo(&self, id: PersonId) -> Option<Arc<PhotoPayload>> {
        self.get(&id).cloned()
    }
}

#[derive(Default)]
pub struct PhotoCache {
    entries: RwLock<HashMap<PersonId, Arc<PhotoPayload>>>,
}

impl PhotoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: PersonId) -> Option<Arc<PhotoPayload>> {
        self.read().get(&id).cloned()
    }

    pub fn has(&self, id: PersonId) -> bool {
        self.read().contains_key(&id)
    }

    /// Store `payload` unless `id` already has an entry
    ///
    /// Returns `true` if the entry was written.
    pub fn set(&self, id: PersonId, payload: PhotoPayload) -> bool {
        let mut entries = self.write();
        if entries.contains_key(&id) {
            return false;
        }
        entries.insert(id, Arc::new(payload));
        true
    }

    /// Store `payload`, replacing any existing entry
    pub fn force_set(&self, id: PersonId, payload: PhotoPayload) {
        self.write().insert(id, Arc::new(payload));
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<PersonId, Arc<PhotoPayload>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<PersonId, Arc<PhotoPayload>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl PhotoLookup for PhotoCache {
    fn cached_photo(&self, id: PersonId) -> Option<Arc<PhotoPayload>> {
        self.get(id)
    }
}
