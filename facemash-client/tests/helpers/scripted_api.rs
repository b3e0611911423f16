//! Scripted `PersonsApi`
//!
//! Responses are queued per endpoint. Votes, duo fetches and photo fetches
//! can be held at a [`Gate`] so a test can observe the in-between state.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use facemash_client::api::PersonsApi;
use facemash_client::duo::DuoScope;
use facemash_client::imaging::PhotoSize;
use facemash_client::GatewayError;
use facemash_common::api::VoteRequest;
use facemash_common::{Person, PersonId};
use tokio::sync::{Notify, Semaphore};

/// Hold point for in-flight calls
///
/// While closed, every call signals `started` and waits until `open`.
pub struct Gate {
    closed: AtomicBool,
    started: Notify,
    permits: Semaphore,
}

impl Gate {
    fn new() -> Self {
        Self {
            closed: AtomicBool::new(false),
            started: Notify::new(),
            permits: Semaphore::new(0),
        }
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Let every held and future call through
    pub fn open(&self) {
        self.closed.store(false, Ordering::SeqCst);
        self.permits.add_permits(1024);
    }

    /// Resolves once a call has reached the gate
    pub async fn started(&self) {
        self.started.notified().await;
    }

    async fn pass(&self) {
        if self.closed.load(Ordering::SeqCst) {
            self.started.notify_one();
            let _permit = self.permits.acquire().await;
        }
    }
}

pub struct ScriptedApi {
    roster: Mutex<Result<Vec<Person>, GatewayError>>,
    persons: Mutex<HashMap<PersonId, Person>>,
    failing_persons: Mutex<Vec<PersonId>>,
    duos: Mutex<VecDeque<Result<Vec<Person>, GatewayError>>>,
    vote_results: Mutex<VecDeque<Result<(), GatewayError>>>,

    roster_calls: AtomicUsize,
    person_calls: Mutex<Vec<(PersonId, PhotoSize)>>,
    duo_scopes: Mutex<Vec<DuoScope>>,
    votes: Mutex<Vec<VoteRequest>>,

    pub vote_gate: Gate,
    pub duo_gate: Gate,
    pub photo_gate: Gate,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            roster: Mutex::new(Ok(Vec::new())),
            persons: Mutex::new(HashMap::new()),
            failing_persons: Mutex::new(Vec::new()),
            duos: Mutex::new(VecDeque::new()),
            vote_results: Mutex::new(VecDeque::new()),
            roster_calls: AtomicUsize::new(0),
            person_calls: Mutex::new(Vec::new()),
            duo_scopes: Mutex::new(Vec::new()),
            votes: Mutex::new(Vec::new()),
            vote_gate: Gate::new(),
            duo_gate: Gate::new(),
            photo_gate: Gate::new(),
        }
    }

    /// Roster plus the same people (with photos) for single fetches
    pub fn with_roster(roster: Vec<Person>) -> Self {
        let api = Self::new();
        for p in &roster {
            api.persons.lock().unwrap().insert(p.id, p.clone());
        }
        *api.roster.lock().unwrap() = Ok(roster
            .into_iter()
            .map(|mut p| {
                p.photo = Default::default();
                p
            })
            .collect());
        api
    }

    pub fn fail_roster(&self, error: GatewayError) {
        *self.roster.lock().unwrap() = Err(error);
    }

    pub fn fail_person(&self, id: PersonId) {
        self.failing_persons.lock().unwrap().push(id);
    }

    pub fn push_duo(&self, pair: Vec<Person>) {
        self.duos.lock().unwrap().push_back(Ok(pair));
    }

    pub fn push_duo_error(&self, error: GatewayError) {
        self.duos.lock().unwrap().push_back(Err(error));
    }

    pub fn push_vote_result(&self, result: Result<(), GatewayError>) {
        self.vote_results.lock().unwrap().push_back(result);
    }

    pub fn roster_calls(&self) -> usize {
        self.roster_calls.load(Ordering::SeqCst)
    }

    pub fn person_calls(&self) -> Vec<(PersonId, PhotoSize)> {
        self.person_calls.lock().unwrap().clone()
    }

    pub fn person_call_count(&self, id: PersonId) -> usize {
        self.person_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| *called == id)
            .count()
    }

    pub fn duo_scopes(&self) -> Vec<DuoScope> {
        self.duo_scopes.lock().unwrap().clone()
    }

    pub fn duo_calls(&self) -> usize {
        self.duo_scopes.lock().unwrap().len()
    }

    pub fn votes(&self) -> Vec<VoteRequest> {
        self.votes.lock().unwrap().clone()
    }
}

#[async_trait]
impl PersonsApi for ScriptedApi {
    async fn fetch_roster(&self) -> Result<Vec<Person>, GatewayError> {
        self.roster_calls.fetch_add(1, Ordering::SeqCst);
        self.roster.lock().unwrap().clone()
    }

    async fn fetch_person(&self, id: PersonId, size: PhotoSize) -> Result<Person, GatewayError> {
        self.person_calls.lock().unwrap().push((id, size));
        self.photo_gate.pass().await;

        if self.failing_persons.lock().unwrap().contains(&id) {
            return Err(GatewayError::network("connection reset"));
        }
        self.persons
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| GatewayError::unknown(format!("HTTP 404: person {}", id)))
    }

    async fn fetch_duo(&self, scope: &DuoScope) -> Result<Vec<Person>, GatewayError> {
        self.duo_scopes.lock().unwrap().push(*scope);
        self.duo_gate.pass().await;
        self.duos
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::unknown("no duo scripted")))
    }

    async fn submit_vote(&self, vote: VoteRequest) -> Result<(), GatewayError> {
        self.votes.lock().unwrap().push(vote);
        self.vote_gate.pass().await;
        self.vote_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }
}
