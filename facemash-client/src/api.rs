//! Persons repository
//!
//! Screens receive a [`PersonsApi`] instead of reaching for a shared
//! dataset. [`HttpPersonsApi`] talks to the backend through the
//! [`RequestGateway`]; [`StaticPersonsApi`] serves a fixed roster for
//! offline runs.

use std::sync::Mutex;

use async_trait::async_trait;
use facemash_common::api::VoteRequest;
use facemash_common::{Person, PersonId};
use rand::seq::SliceRandom;
use serde::de::IgnoredAny;
use tracing::{debug, info};

use crate::duo::DuoScope;
use crate::error::GatewayError;
use crate::gateway::{CallOptions, RequestGateway};
use crate::imaging::PhotoSize;

/// Class numbers that count as senior (`oldSchool=true`)
pub const SENIOR_CLASSES: std::ops::RangeInclusive<u32> = 9..=11;

/// Class numbers that count as junior (`oldSchool=false`)
pub const JUNIOR_CLASSES: std::ops::RangeInclusive<u32> = 5..=8;

#[async_trait]
pub trait PersonsApi: Send + Sync {
    /// Whole roster, without photo payloads
    async fn fetch_roster(&self) -> Result<Vec<Person>, GatewayError>;

    /// One person with a photo sized for `size`
    async fn fetch_person(&self, id: PersonId, size: PhotoSize) -> Result<Person, GatewayError>;

    /// Raw duo candidates for `scope`; validation happens in the session
    async fn fetch_duo(&self, scope: &DuoScope) -> Result<Vec<Person>, GatewayError>;

    async fn submit_vote(&self, vote: VoteRequest) -> Result<(), GatewayError>;
}

pub struct HttpPersonsApi {
    gateway: RequestGateway,
}

impl HttpPersonsApi {
    pub fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }
}

#[async_trait]
impl PersonsApi for HttpPersonsApi {
    async fn fetch_roster(&self) -> Result<Vec<Person>, GatewayError> {
        let persons: Vec<Person> = self
            .gateway
            .get("persons", CallOptions::new().query("includePhotos", false))
            .await?;
        info!(count = persons.len(), "Fetched roster");
        Ok(persons)
    }

    async fn fetch_person(&self, id: PersonId, size: PhotoSize) -> Result<Person, GatewayError> {
        let options = CallOptions::new()
            .query("photoWidth", size.width)
            .query("photoHeight", size.height);
        let person: Person = self.gateway.get(&format!("persons/{}", id), options).await?;
        if person.id != id {
            return Err(GatewayError::validation(format!(
                "Asked for person {}, got {}",
                id, person.id
            )));
        }
        Ok(person)
    }

    async fn fetch_duo(&self, scope: &DuoScope) -> Result<Vec<Person>, GatewayError> {
        let mut options = CallOptions::new().query("haveAvatar", scope.have_avatar);
        if let Some(old_school) = scope.old_school {
            options = options.query("oldSchool", old_school);
        }
        options = options
            .query("photoWidth", scope.photo_size.width)
            .query("photoHeight", scope.photo_size.height);

        self.gateway
            .get(&format!("persons/duo/filter/{}", scope.gender), options)
            .await
    }

    async fn submit_vote(&self, vote: VoteRequest) -> Result<(), GatewayError> {
        let _: IgnoredAny = self
            .gateway
            .post("persons/duo/vote", &vote, CallOptions::new())
            .await?;
        debug!(winner_id = vote.winner_id, loser_id = vote.loser_id, "Vote acknowledged");
        Ok(())
    }
}

/// Fixed in-memory roster
///
/// Duos are drawn at random the way the backend draws them. Votes are
/// recorded but ratings never change.
pub struct StaticPersonsApi {
    persons: Vec<Person>,
    votes: Mutex<Vec<VoteRequest>>,
}

impl StaticPersonsApi {
    pub fn new(persons: Vec<Person>) -> Self {
        Self {
            persons,
            votes: Mutex::new(Vec::new()),
        }
    }

    /// Votes received so far, oldest first
    pub fn votes(&self) -> Vec<VoteRequest> {
        self.votes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn in_scope(person: &Person, scope: &DuoScope) -> bool {
        if person.gender != scope.gender {
            return false;
        }
        if scope.have_avatar && !person.photo.is_real() {
            return false;
        }
        match scope.old_school {
            None => true,
            Some(senior) => {
                let range = if senior { SENIOR_CLASSES } else { JUNIOR_CLASSES };
                class_number(&person.school_class)
                    .map(|n| range.contains(&n))
                    .unwrap_or(false)
            }
        }
    }
}

/// Grade number of a class label such as `"10-2"`
///
/// Labels without a `-` have no grade.
pub fn class_number(school_class: &str) -> Option<u32> {
    let (grade, _) = school_class.split_once('-')?;
    grade.trim().parse().ok()
}

#[async_trait]
impl PersonsApi for StaticPersonsApi {
    async fn fetch_roster(&self) -> Result<Vec<Person>, GatewayError> {
        Ok(self
            .persons
            .iter()
            .cloned()
            .map(|mut p| {
                p.photo = Default::default();
                p
            })
            .collect())
    }

    async fn fetch_person(&self, id: PersonId, _size: PhotoSize) -> Result<Person, GatewayError> {
        self.persons
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::unknown(format!("HTTP 404: person {} not found", id)))
    }

    async fn fetch_duo(&self, scope: &DuoScope) -> Result<Vec<Person>, GatewayError> {
        let candidates: Vec<&Person> = self
            .persons
            .iter()
            .filter(|p| Self::in_scope(p, scope))
            .collect();
        if candidates.len() < 2 {
            return Err(GatewayError::unknown(format!(
                "Not enough persons found for {}. Found: {}",
                scope.gender,
                candidates.len()
            )));
        }

        let mut rng = rand::thread_rng();
        Ok(candidates
            .choose_multiple(&mut rng, 2)
            .map(|p| (*p).clone())
            .collect())
    }

    async fn submit_vote(&self, vote: VoteRequest) -> Result<(), GatewayError> {
        if !self.persons.iter().any(|p| p.id == vote.winner_id)
            || !self.persons.iter().any(|p| p.id == vote.loser_id)
        {
            return Err(GatewayError::unknown("HTTP 404: unknown person in vote"));
        }
        self.votes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(vote);
        Ok(())
    }
}
