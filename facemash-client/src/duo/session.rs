//! Duo voting session
//!
//! ```text
//! Idle ──fetch ok──▶ Ready ──pick──▶ Submitting ──vote ok──▶ Cooldown
//!   ▲                  ▲                  │                      │
//!   │                  └───vote failed────┘                      │
//!   │                  ▲                                         │
//!   │                  └──────────next pair (after 800 ms)───────┘
//!   └────────────────────────refill failed───────────────────────┘
//! ```
//!
//! The state sits behind one mutex that is never held across an await.
//! Submitting and Cooldown are the only guard against double votes: a pick
//! in any state other than Ready is ignored. The next pair always differs
//! from the one just voted on; a refill that keeps returning it fails.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use facemash_common::api::VoteRequest;
use facemash_common::preferences::Preferences;
use facemash_common::PersonId;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{DuoPair, DuoScope, DuoState};
use crate::api::PersonsApi;
use crate::error::DuoError;
use crate::events::{EventBus, ScreenEvent};

/// Feedback delay between an accepted vote and the next pair
pub const VOTE_FEEDBACK_DELAY: Duration = Duration::from_millis(800);

/// Refill attempts after an accepted vote
pub const REFILL_ATTEMPTS: u32 = 3;

/// Pause between refill attempts
pub const REFILL_BACKOFF: Duration = Duration::from_millis(500);

/// Result of [`DuoVotingSession::pick`]
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    /// Not Ready, or the id is not in the pair; nothing happened
    Ignored,
    /// Vote accepted; `refill` tells whether the next pair arrived
    Accepted {
        vote: VoteRequest,
        refill: Result<(), DuoError>,
    },
    /// Vote failed; the same pair is Ready again
    Rejected { vote: VoteRequest, error: DuoError },
}

/// Result of a successful [`DuoVotingSession::reload`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A new pair is Ready
    Loaded,
    /// Busy voting or already fetching; nothing changed
    Ignored,
}

struct SessionInner {
    state: DuoState,
    scope: DuoScope,
    last_error: Option<DuoError>,
    /// Bumped on every scope change; a fetch started under an older
    /// generation is not applied
    generation: u64,
    fetching: bool,
}

/// Holds the `fetching` flag; cleared on drop, including when the reload
/// future is dropped mid-fetch
struct FetchClaim<'a> {
    inner: &'a Mutex<SessionInner>,
}

impl<'a> FetchClaim<'a> {
    fn acquire(inner: &'a Mutex<SessionInner>, locked: &mut SessionInner) -> Self {
        locked.fetching = true;
        Self { inner }
    }
}

impl Drop for FetchClaim<'_> {
    fn drop(&mut self) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fetching = false;
    }
}

pub struct DuoVotingSession {
    api: Arc<dyn PersonsApi>,
    events: Arc<EventBus>,
    vote_timeout: Duration,
    inner: Mutex<SessionInner>,
}

impl DuoVotingSession {
    pub fn new(
        api: Arc<dyn PersonsApi>,
        events: Arc<EventBus>,
        scope: DuoScope,
        vote_timeout: Duration,
    ) -> Self {
        Self {
            api,
            events,
            vote_timeout,
            inner: Mutex::new(SessionInner {
                state: DuoState::Idle,
                scope,
                last_error: None,
                generation: 0,
                fetching: false,
            }),
        }
    }

    pub fn state(&self) -> DuoState {
        self.lock().state.clone()
    }

    pub fn scope(&self) -> DuoScope {
        self.lock().scope
    }

    /// Error of the last failed duo fetch, cleared when a pair arrives
    pub fn last_error(&self) -> Option<DuoError> {
        self.lock().last_error.clone()
    }

    /// Fetch a pair from Idle or Ready
    ///
    /// Returns [`ReloadOutcome::Ignored`] while a vote is submitting or
    /// cooling down, and while another reload is already fetching. A reload
    /// whose pair arrives after a pick locked the state is ignored as well.
    pub async fn reload(&self) -> Result<ReloadOutcome, DuoError> {
        let _claim = {
            let mut inner = self.lock();
            if inner.state.is_locked() {
                debug!(state = inner.state.name(), "Reload ignored while voting");
                return Ok(ReloadOutcome::Ignored);
            }
            if inner.fetching {
                debug!("Reload ignored, fetch already running");
                return Ok(ReloadOutcome::Ignored);
            }
            FetchClaim::acquire(&self.inner, &mut inner)
        };

        loop {
            let (scope, generation) = {
                let inner = self.lock();
                (inner.scope, inner.generation)
            };

            let fetched = self.fetch_pair(&scope).await;

            let mut inner = self.lock();
            if inner.state.is_locked() {
                // A pick landed on the old pair while we were fetching
                debug!("Discarding reloaded pair, vote in progress");
                return Ok(ReloadOutcome::Ignored);
            }
            if inner.generation != generation {
                debug!("Scope changed during fetch, fetching again");
                continue;
            }
            return match fetched {
                Ok(pair) => {
                    self.enter_ready(&mut inner, pair);
                    Ok(ReloadOutcome::Loaded)
                }
                Err(e) => {
                    warn!(error = %e, "Duo fetch failed");
                    self.enter_idle(&mut inner, e.clone());
                    Err(e)
                }
            };
        }
    }

    /// Vote for `id`
    ///
    /// Only acts when Ready and `id` is one of the pair. The other member is
    /// the loser. On success the session cools down for
    /// [`VOTE_FEEDBACK_DELAY`] and then fetches the next pair; on failure the
    /// same pair becomes Ready again.
    pub async fn pick(&self, id: PersonId) -> PickOutcome {
        let (pair, vote) = {
            let mut inner = self.lock();
            let pair = match &inner.state {
                DuoState::Ready(pair) if pair.contains(id) => pair.clone(),
                state => {
                    debug!(person_id = id, state = state.name(), "Pick ignored");
                    return PickOutcome::Ignored;
                }
            };
            let Some(loser_id) = pair.other(id) else {
                return PickOutcome::Ignored;
            };
            let vote = VoteRequest {
                winner_id: id,
                loser_id,
            };
            inner.state = DuoState::Submitting {
                pair: pair.clone(),
                picked: id,
            };
            (pair, vote)
        };

        self.events.emit_lossy(ScreenEvent::VoteSubmitting {
            winner_id: vote.winner_id,
            loser_id: vote.loser_id,
            timestamp: Utc::now(),
        });

        let submitted = match tokio::time::timeout(self.vote_timeout, self.api.submit_vote(vote)).await
        {
            Err(_) => Err(DuoError::Timeout(self.vote_timeout)),
            Ok(Err(e)) => Err(DuoError::from_vote_failure(e)),
            Ok(Ok(())) => Ok(()),
        };

        if let Err(error) = submitted {
            warn!(
                winner_id = vote.winner_id,
                loser_id = vote.loser_id,
                error = %error,
                "Vote failed, pair unlocked"
            );
            self.lock().state = DuoState::Ready(pair);
            self.events.emit_lossy(ScreenEvent::VoteRejected {
                winner_id: vote.winner_id,
                loser_id: vote.loser_id,
                message: error.to_string(),
                timestamp: Utc::now(),
            });
            return PickOutcome::Rejected { vote, error };
        }

        info!(winner_id = vote.winner_id, loser_id = vote.loser_id, "Vote accepted");
        self.lock().state = DuoState::Cooldown {
            pair: pair.clone(),
            picked: id,
        };
        self.events.emit_lossy(ScreenEvent::VoteAccepted {
            winner_id: vote.winner_id,
            loser_id: vote.loser_id,
            timestamp: Utc::now(),
        });

        tokio::time::sleep(VOTE_FEEDBACK_DELAY).await;
        let refill = self.refill(&pair).await;
        PickOutcome::Accepted { vote, refill }
    }

    /// Apply new preference flags to the scope
    ///
    /// Reloads right away when Ready or Idle; while voting, the new scope is
    /// used by the next refill.
    pub async fn update_scope(&self, preferences: Preferences) -> Result<(), DuoError> {
        let reload_now = {
            let mut inner = self.lock();
            let scope = inner.scope.with_preferences(&preferences);
            if scope == inner.scope {
                return Ok(());
            }
            inner.scope = scope;
            inner.generation += 1;
            info!(
                have_avatar = scope.have_avatar,
                old_school = ?scope.old_school,
                "Duo scope changed"
            );
            self.events.emit_lossy(ScreenEvent::ScopeChanged {
                have_avatar: scope.have_avatar,
                old_school: scope.old_school,
                timestamp: Utc::now(),
            });
            !inner.state.is_locked() && !inner.fetching
        };

        if reload_now {
            self.reload().await.map(|_| ())
        } else {
            Ok(())
        }
    }

    /// Follow preference changes until `cancel` fires or the store goes away
    pub async fn follow_preferences(
        self: Arc<Self>,
        mut preferences: watch::Receiver<Preferences>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = preferences.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = *preferences.borrow_and_update();
                    if let Err(e) = self.update_scope(current).await {
                        warn!(error = %e, "Reload after preference change failed");
                    }
                }
            }
        }
        debug!("Stopped following preferences");
    }

    async fn refill(&self, previous: &DuoPair) -> Result<(), DuoError> {
        let mut attempt = 1;
        loop {
            let (scope, generation) = {
                let inner = self.lock();
                (inner.scope, inner.generation)
            };

            let fetched = match self.fetch_pair(&scope).await {
                Ok(pair) if pair.same_members(previous) => {
                    debug!(attempt, "Refill returned the same pair");
                    let (left_id, right_id) = previous.ids();
                    Err(DuoError::RepeatedPair(left_id, right_id))
                }
                Ok(pair) => Ok(pair),
                Err(e) => {
                    warn!(attempt, error = %e, "Refill failed");
                    Err(e)
                }
            };

            {
                let mut inner = self.lock();
                if inner.generation != generation {
                    debug!("Scope changed during refill, fetching again");
                    continue;
                }
                match fetched {
                    Ok(pair) => {
                        self.enter_ready(&mut inner, pair);
                        return Ok(());
                    }
                    Err(e) if attempt >= REFILL_ATTEMPTS => {
                        warn!(attempts = attempt, error = %e, "Giving up on refill");
                        self.enter_idle(&mut inner, e.clone());
                        return Err(e);
                    }
                    Err(_) => {}
                }
            }

            attempt += 1;
            tokio::time::sleep(REFILL_BACKOFF).await;
        }
    }

    async fn fetch_pair(&self, scope: &DuoScope) -> Result<DuoPair, DuoError> {
        let candidates = self.api.fetch_duo(scope).await?;
        DuoPair::from_candidates(candidates, scope.gender)
    }

    fn enter_ready(&self, inner: &mut SessionInner, pair: DuoPair) {
        let (left_id, right_id) = pair.ids();
        debug!(left_id, right_id, "Duo ready");
        inner.state = DuoState::Ready(pair);
        inner.last_error = None;
        self.events.emit_lossy(ScreenEvent::DuoReady {
            left_id,
            right_id,
            timestamp: Utc::now(),
        });
    }

    fn enter_idle(&self, inner: &mut SessionInner, error: DuoError) {
        inner.state = DuoState::Idle;
        self.events.emit_lossy(ScreenEvent::DuoFailed {
            message: error.to_string(),
            timestamp: Utc::now(),
        });
        inner.last_error = Some(error);
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
