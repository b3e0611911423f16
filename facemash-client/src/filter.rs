//! Leaderboard filter pipeline
//!
//! Pure functions from (roster, filter state, photo lookup) to an ordered
//! list of references into the roster. Steps:
//!
//! 1. Gender tab
//! 2. "Only with photo" (cached photo wins over the inline one)
//! 3. Free-text search
//! 4. Rating, descending, stable
//!
//! [`rank`] additionally numbers each entry by its position in the
//! unsearched ordering, so a person keeps their place while searching.

use facemash_common::{Gender, Person};

use crate::photo_cache::PhotoLookup;

/// Gender tab of the leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Tab {
    #[default]
    All,
    Male,
    Female,
}

impl Tab {
    pub fn matches(&self, gender: Gender) -> bool {
        match self {
            Tab::All => true,
            Tab::Male => gender == Gender::Male,
            Tab::Female => gender == Gender::Female,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::All => "all",
            Tab::Male => "male",
            Tab::Female => "female",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub tab: Tab,
    pub search: String,
    pub only_with_photo: bool,
}

impl FilterState {
    pub fn search_active(&self) -> bool {
        !self.search.trim().is_empty()
    }
}

/// Lower-cased whitespace tokens of a search string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    tokens: Vec<String>,
}

impl SearchQuery {
    /// `None` for a blank query
    pub fn parse(query: &str) -> Option<Self> {
        let tokens: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if tokens.is_empty() {
            None
        } else {
            Some(Self { tokens })
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Token-match rule
    ///
    /// A single token matches first name, surname, "first surname" or class.
    /// Several tokens match if the joined query is a substring of
    /// "first surname" or "surname first", or else if every token matches
    /// first name, surname or class on its own.
    pub fn matches(&self, person: &Person) -> bool {
        let name = person.name.to_lowercase();
        let surname = person.surname.to_lowercase();
        let class = person.school_class.to_lowercase();
        let field_match = |token: &str| {
            name.contains(token) || surname.contains(token) || class.contains(token)
        };

        if let [token] = self.tokens.as_slice() {
            let full = format!("{} {}", name, surname);
            return field_match(token.as_str()) || full.trim().contains(token.as_str());
        }

        let joined = self.tokens.join(" ");
        let forward = format!("{} {}", name, surname);
        let reversed = format!("{} {}", surname, name);
        if forward.contains(&joined) || reversed.contains(&joined) {
            return true;
        }
        self.tokens.iter().all(|token| field_match(token.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// Medal for a 1-based rank
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Medal::Gold => "gold",
            Medal::Silver => "silver",
            Medal::Bronze => "bronze",
        }
    }
}

/// One leaderboard entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedEntry<'a> {
    pub person: &'a Person,
    /// 1-based position in the unsearched ordering
    pub rank: usize,
    /// Only set for the top places when no search is active
    pub medal: Option<Medal>,
}

/// Photo test for the "only with photo" filter
pub fn has_real_photo(person: &Person, photos: &dyn PhotoLookup) -> bool {
    match photos.cached_photo(person.id) {
        Some(cached) => cached.is_real(),
        None => person.photo.is_real(),
    }
}

/// Filtered and sorted roster
pub fn filter_and_sort<'a>(
    roster: &'a [Person],
    filter: &FilterState,
    photos: &dyn PhotoLookup,
) -> Vec<&'a Person> {
    let mut list = base_filter(roster, filter, photos);
    if let Some(query) = SearchQuery::parse(&filter.search) {
        list.retain(|p| query.matches(p));
    }
    sort_by_rating(&mut list);
    list
}

/// Filtered and sorted roster with rank and medal per entry
pub fn rank<'a>(
    roster: &'a [Person],
    filter: &FilterState,
    photos: &dyn PhotoLookup,
) -> Vec<RankedEntry<'a>> {
    let mut list = base_filter(roster, filter, photos);
    sort_by_rating(&mut list);

    let query = SearchQuery::parse(&filter.search);
    let award_medals = query.is_none();
    list.into_iter()
        .enumerate()
        .map(|(index, person)| RankedEntry {
            person,
            rank: index + 1,
            medal: if award_medals {
                Medal::for_rank(index + 1)
            } else {
                None
            },
        })
        .filter(|entry| query.as_ref().map_or(true, |q| q.matches(entry.person)))
        .collect()
}

fn base_filter<'a>(
    roster: &'a [Person],
    filter: &FilterState,
    photos: &dyn PhotoLookup,
) -> Vec<&'a Person> {
    roster
        .iter()
        .filter(|p| filter.tab.matches(p.gender))
        .filter(|p| !filter.only_with_photo || has_real_photo(p, photos))
        .collect()
}

fn sort_by_rating(list: &mut [&Person]) {
    list.sort_by(|a, b| b.rating.total_cmp(&a.rating));
}
