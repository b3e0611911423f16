//! Pairwise voting
//!
//! A duo is two distinct people of one gender, optionally narrowed to
//! people with a real photo and to a class range. The [`DuoVotingSession`]
//! drives fetching, voting and refilling; this module holds its value types.

mod session;

use facemash_common::preferences::Preferences;
use facemash_common::{Gender, Person, PersonId};
use tracing::debug;

use crate::error::DuoError;
use crate::imaging::PhotoSize;
pub use session::{
    DuoVotingSession, PickOutcome, ReloadOutcome, REFILL_ATTEMPTS, REFILL_BACKOFF,
    VOTE_FEEDBACK_DELAY,
};

/// What a duo is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuoScope {
    pub gender: Gender,
    /// Only people with a real photo (`haveAvatar`)
    pub have_avatar: bool,
    /// `oldSchool` query flag; `None` = all classes
    pub old_school: Option<bool>,
    pub photo_size: PhotoSize,
}

impl DuoScope {
    pub fn new(gender: Gender, photo_size: PhotoSize) -> Self {
        Self {
            gender,
            have_avatar: false,
            old_school: None,
            photo_size,
        }
    }

    /// Same gender and size, flags taken from `preferences`
    pub fn with_preferences(mut self, preferences: &Preferences) -> Self {
        self.have_avatar = preferences.only_with_photo;
        self.old_school = preferences.class_range.old_school();
        self
    }
}

/// Two distinct people of the requested gender
#[derive(Debug, Clone, PartialEq)]
pub struct DuoPair {
    left: Person,
    right: Person,
}

impl DuoPair {
    /// Validate a duo response
    ///
    /// # Errors
    ///
    /// - `InsufficientCandidates` if fewer than two people came back
    /// - `SelfPaired` if both entries share an identity
    /// - `ScopeMismatch` if someone is not of `gender`
    pub fn from_candidates(candidates: Vec<Person>, gender: Gender) -> Result<Self, DuoError> {
        let count = candidates.len();
        let mut iter = candidates.into_iter();
        let (left, right) = match (iter.next(), iter.next()) {
            (Some(left), Some(right)) => (left, right),
            _ => return Err(DuoError::InsufficientCandidates(count)),
        };
        if count > 2 {
            debug!(count, "Duo response had extra candidates, using the first two");
        }

        if left.id == right.id {
            return Err(DuoError::SelfPaired(left.id));
        }
        for person in [&left, &right] {
            if person.gender != gender {
                return Err(DuoError::ScopeMismatch(person.id));
            }
        }

        Ok(Self { left, right })
    }

    pub fn left(&self) -> &Person {
        &self.left
    }

    pub fn right(&self) -> &Person {
        &self.right
    }

    pub fn ids(&self) -> (PersonId, PersonId) {
        (self.left.id, self.right.id)
    }

    pub fn contains(&self, id: PersonId) -> bool {
        self.left.id == id || self.right.id == id
    }

    /// The member that is not `id`, if `id` is in the pair
    pub fn other(&self, id: PersonId) -> Option<PersonId> {
        if self.left.id == id {
            Some(self.right.id)
        } else if self.right.id == id {
            Some(self.left.id)
        } else {
            None
        }
    }

    pub fn get(&self, id: PersonId) -> Option<&Person> {
        [&self.left, &self.right].into_iter().find(|p| p.id == id)
    }

    /// True if both pairs hold the same two identities, in any order
    pub fn same_members(&self, other: &DuoPair) -> bool {
        other.contains(self.left.id) && other.contains(self.right.id)
    }
}

/// Voting session state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DuoState {
    /// No pair; initial, or after a failed fetch
    #[default]
    Idle,
    /// Pair shown, accepting one pick
    Ready(DuoPair),
    /// Vote in flight; picks are ignored
    Submitting { pair: DuoPair, picked: PersonId },
    /// Vote accepted; feedback delay before the next pair
    Cooldown { pair: DuoPair, picked: PersonId },
}

impl DuoState {
    pub fn pair(&self) -> Option<&DuoPair> {
        match self {
            DuoState::Idle => None,
            DuoState::Ready(pair)
            | DuoState::Submitting { pair, .. }
            | DuoState::Cooldown { pair, .. } => Some(pair),
        }
    }

    pub fn picked(&self) -> Option<PersonId> {
        match self {
            DuoState::Submitting { picked, .. } | DuoState::Cooldown { picked, .. } => {
                Some(*picked)
            }
            _ => None,
        }
    }

    /// True while a vote is being submitted or its feedback is showing
    pub fn is_locked(&self) -> bool {
        matches!(self, DuoState::Submitting { .. } | DuoState::Cooldown { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            DuoState::Idle => "idle",
            DuoState::Ready(_) => "ready",
            DuoState::Submitting { .. } => "submitting",
            DuoState::Cooldown { .. } => "cooldown",
        }
    }
}
