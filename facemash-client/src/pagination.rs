//! Pagination utilities
//!
//! Fixed-size pages over an already filtered list (20 rows/page).

/// Page size constant for all pagination
pub const PAGE_SIZE: usize = 20;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Total number of pages, never less than 1
    pub total_pages: usize,
    /// Index of the first row on the page
    pub offset: usize,
    /// One past the last row on the page
    pub end: usize,
}

/// Calculate pagination metadata from total results and requested page
///
/// Ensures page is within valid bounds [1, total_pages]. An empty list still
/// has one (empty) page.
///
/// # Examples
/// ```
/// use facemash_client::pagination::calculate_pagination;
///
/// // 45 results = 3 pages (20 + 20 + 5)
/// let p = calculate_pagination(45, 3, 20);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!((p.offset, p.end), (40, 45));
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(45, 99, 20);
/// assert_eq!(p.page, 3);
/// ```
pub fn calculate_pagination(total_results: usize, requested_page: usize, page_size: usize) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = total_results.div_ceil(page_size).max(1);
    let page = requested_page.clamp(1, total_pages);
    let offset = (page - 1) * page_size;
    let end = (offset + page_size).min(total_results);

    Pagination {
        page,
        total_pages,
        offset,
        end,
    }
}

/// One page of a list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub total_pages: usize,
}

/// Slice `list` to the (clamped) `page` of [`PAGE_SIZE`] rows
pub fn paginate<T>(list: &[T], page: usize) -> Page<'_, T> {
    paginate_with_size(list, page, PAGE_SIZE)
}

pub fn paginate_with_size<T>(list: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let p = calculate_pagination(list.len(), page, page_size);
    Page {
        items: &list[p.offset..p.end],
        page: p.page,
        total_pages: p.total_pages,
    }
}

/// Current page of a screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    page: usize,
}

impl PaginationState {
    pub fn new() -> Self {
        Self { page: 1 }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Move to `requested`, clamped against a list of `total_results` rows
    pub fn set_page(&mut self, requested: usize, total_results: usize) -> usize {
        self.page = calculate_pagination(total_results, requested, PAGE_SIZE).page;
        self.page
    }

    /// Back to page 1
    pub fn reset(&mut self) {
        self.page = 1;
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normal() {
        let p = calculate_pagination(50, 2, PAGE_SIZE);
        assert_eq!(p.page, 2);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 20);
        assert_eq!(p.end, 40);
    }

    #[test]
    fn test_pagination_last_page() {
        let items: Vec<usize> = (0..45).collect();
        let page = paginate(&items, 3);
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items, &[40, 41, 42, 43, 44]);
    }

    #[test]
    fn test_pagination_out_of_bounds_high() {
        let p = calculate_pagination(30, 99, PAGE_SIZE);
        assert_eq!(p.page, 2); // Clamped to last page
        assert_eq!(p.offset, 20);
    }

    #[test]
    fn test_pagination_out_of_bounds_low() {
        let p = calculate_pagination(30, 0, PAGE_SIZE);
        assert_eq!(p.page, 1); // Clamped to first page
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_empty() {
        let items: Vec<u8> = Vec::new();
        let page = paginate(&items, 4);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_pagination_exact_page_boundary() {
        let p = calculate_pagination(40, 2, PAGE_SIZE);
        assert_eq!(p.total_pages, 2);
        assert_eq!((p.offset, p.end), (20, 40));
    }

    #[test]
    fn test_pages_reconstruct_list() {
        for len in [0usize, 1, 19, 20, 21, 61] {
            let items: Vec<usize> = (0..len).collect();
            let total_pages = paginate(&items, 1).total_pages;

            let rebuilt: Vec<usize> = (1..=total_pages)
                .flat_map(|page| paginate(&items, page).items.to_vec())
                .collect();
            assert_eq!(rebuilt, items);

            let last = paginate(&items, total_pages).items.len();
            assert_eq!(last, len - PAGE_SIZE * (total_pages - 1));
        }
    }

    #[test]
    fn test_state_clamps_and_resets() {
        let mut state = PaginationState::new();
        assert_eq!(state.set_page(5, 45), 3);
        state.reset();
        assert_eq!(state.page(), 1);
    }
}
