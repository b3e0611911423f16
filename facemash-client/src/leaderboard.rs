//! Leaderboard screen controller
//!
//! Owns the filter and pagination state, recomputes the visible page from
//! the roster on every change and feeds the photo loader with the ids on
//! that page. Any filter change sends the user back to page 1.

use std::sync::Arc;

use facemash_common::{PersonId, PhotoPayload};

use crate::api::PersonsApi;
use crate::error::GatewayError;
use crate::events::EventBus;
use crate::filter::{rank, FilterState, Medal, Tab};
use crate::imaging::PhotoSize;
use crate::pagination::{paginate, PaginationState};
use crate::photo_cache::{PhotoCache, PhotoLookup};
use crate::photo_loader::{PhotoLoadReport, PhotoLoader};
use crate::roster::{RosterStatus, RosterStore};

/// One rendered row
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub person_id: PersonId,
    pub rank: usize,
    pub medal: Option<Medal>,
    /// "surname name"
    pub display_name: String,
    pub school_class: String,
    pub rating: f64,
    /// Cached photo if fetched, else the roster's inline one
    pub photo: Arc<PhotoPayload>,
}

/// Everything a renderer needs for the current page
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardView {
    pub rows: Vec<LeaderboardRow>,
    pub page: usize,
    pub total_pages: usize,
    /// Rows across all pages after filtering
    pub total_results: usize,
    pub search_active: bool,
    pub status: RosterStatus,
}

pub struct LeaderboardScreen {
    roster: RosterStore,
    cache: Arc<PhotoCache>,
    loader: Arc<PhotoLoader>,
    filter: FilterState,
    pagination: PaginationState,
}

impl LeaderboardScreen {
    pub fn new(api: Arc<dyn PersonsApi>, events: Arc<EventBus>, avatar_size: PhotoSize) -> Self {
        let cache = Arc::new(PhotoCache::new());
        let loader = Arc::new(PhotoLoader::new(
            Arc::clone(&api),
            Arc::clone(&cache),
            Arc::clone(&events),
            avatar_size,
        ));
        Self {
            roster: RosterStore::new(api, events),
            cache,
            loader,
            filter: FilterState::default(),
            pagination: PaginationState::new(),
        }
    }

    /// Load the roster (once) and return its size
    pub async fn mount(&mut self) -> Result<usize, GatewayError> {
        self.roster.load().await
    }

    /// Re-fetch the roster; cached photos are kept
    pub async fn refresh(&mut self) -> Result<usize, GatewayError> {
        let count = self.roster.refresh().await?;
        self.clamp_page();
        Ok(count)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.pagination.page()
    }

    pub fn cache(&self) -> &Arc<PhotoCache> {
        &self.cache
    }

    pub fn roster(&self) -> &RosterStore {
        &self.roster
    }

    pub fn set_tab(&mut self, tab: Tab) {
        if self.filter.tab != tab {
            self.filter.tab = tab;
            self.pagination.reset();
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if self.filter.search != search {
            self.filter.search = search;
            self.pagination.reset();
        }
    }

    pub fn set_only_with_photo(&mut self, only_with_photo: bool) {
        if self.filter.only_with_photo != only_with_photo {
            self.filter.only_with_photo = only_with_photo;
            self.pagination.reset();
        }
    }

    /// Go to `page`, clamped to the filtered list; returns the page shown
    pub fn set_page(&mut self, page: usize) -> usize {
        let total = self.total_results();
        self.pagination.set_page(page, total)
    }

    /// Filtered rows across all pages
    pub fn total_results(&self) -> usize {
        let roster = self.roster.snapshot();
        rank(&roster, &self.filter, self.cache.as_ref()).len()
    }

    pub fn view(&self) -> LeaderboardView {
        let roster = self.roster.snapshot();
        let ranked = rank(&roster, &self.filter, self.cache.as_ref());
        let page = paginate(&ranked, self.pagination.page());

        let rows = page
            .items
            .iter()
            .map(|entry| LeaderboardRow {
                person_id: entry.person.id,
                rank: entry.rank,
                medal: entry.medal,
                display_name: entry.person.display_name(),
                school_class: entry.person.school_class.clone(),
                rating: entry.person.rating,
                photo: self
                    .cache
                    .cached_photo(entry.person.id)
                    .unwrap_or_else(|| Arc::new(entry.person.photo.clone())),
            })
            .collect();

        LeaderboardView {
            rows,
            page: page.page,
            total_pages: page.total_pages,
            total_results: ranked.len(),
            search_active: self.filter.search_active(),
            status: self.roster.status(),
        }
    }

    /// Ids on the current page, in display order
    pub fn visible_ids(&self) -> Vec<PersonId> {
        let roster = self.roster.snapshot();
        let ranked = rank(&roster, &self.filter, self.cache.as_ref());
        paginate(&ranked, self.pagination.page())
            .items
            .iter()
            .map(|entry| entry.person.id)
            .collect()
    }

    /// Fetch missing photos for the current page
    pub async fn load_visible_photos(&self) -> PhotoLoadReport {
        let ids = self.visible_ids();
        self.loader.load_visible(&ids).await
    }

    /// Background variant of [`load_visible_photos`](Self::load_visible_photos)
    pub fn spawn_visible_photos(&self) -> tokio::task::JoinHandle<PhotoLoadReport> {
        self.loader.spawn_visible(self.visible_ids())
    }

    /// Leave the screen: photo responses still in flight are discarded
    pub fn dispose(&self) {
        self.loader.dispose();
    }

    fn clamp_page(&mut self) {
        let current = self.pagination.page();
        self.set_page(current);
    }
}
