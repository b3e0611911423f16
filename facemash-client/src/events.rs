//! Screen events
//!
//! Renderers subscribe to an [`EventBus`] instead of polling screen state.
//! Every roster load, photo write and duo transition is published here.

use chrono::{DateTime, Utc};
use facemash_common::PersonId;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::error::ErrorKind;

/// Default channel capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ScreenEvent {
    /// Roster fetched and stored
    RosterLoaded {
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Roster fetch failed
    RosterFailed {
        kind: ErrorKind,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A photo was written to the cache; only rows showing `person_id` need redraw
    PhotoLoaded {
        person_id: PersonId,
        timestamp: DateTime<Utc>,
    },

    /// A new pair is ready for voting
    DuoReady {
        left_id: PersonId,
        right_id: PersonId,
        timestamp: DateTime<Utc>,
    },

    /// Duo could not be fetched; session is idle
    DuoFailed {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A pick locked the pair and the vote is in flight
    VoteSubmitting {
        winner_id: PersonId,
        loser_id: PersonId,
        timestamp: DateTime<Utc>,
    },

    /// Vote confirmed; feedback delay running
    VoteAccepted {
        winner_id: PersonId,
        loser_id: PersonId,
        timestamp: DateTime<Utc>,
    },

    /// Vote failed; pair unlocked with no rating change
    VoteRejected {
        winner_id: PersonId,
        loser_id: PersonId,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Duo scope changed following a preference update
    ScopeChanged {
        have_avatar: bool,
        old_school: Option<bool>,
        timestamp: DateTime<Utc>,
    },
}

impl ScreenEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ScreenEvent::RosterLoaded { timestamp, .. }
            | ScreenEvent::RosterFailed { timestamp, .. }
            | ScreenEvent::PhotoLoaded { timestamp, .. }
            | ScreenEvent::DuoReady { timestamp, .. }
            | ScreenEvent::DuoFailed { timestamp, .. }
            | ScreenEvent::VoteSubmitting { timestamp, .. }
            | ScreenEvent::VoteAccepted { timestamp, .. }
            | ScreenEvent::VoteRejected { timestamp, .. }
            | ScreenEvent::ScopeChanged { timestamp, .. } => *timestamp,
        }
    }
}

/// Broadcast bus for [`ScreenEvent`]s
///
/// Slow subscribers lose the oldest events (`RecvError::Lagged`) rather than
/// blocking the screens.
pub struct EventBus {
    tx: broadcast::Sender<ScreenEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Receiver for all events emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<ScreenEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring the case where nobody is listening
    pub fn emit_lossy(&self, event: ScreenEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Screen event dropped, no subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
