//! Offset/limit page walking.
//!
//! A page shorter than the requested limit is the last one. Walks are capped
//! at a fixed number of pages so a remote that keeps returning full pages
//! cannot loop forever.

use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_MAX_PAGES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCursor {
    pub offset: usize,
    pub limit: usize,
}

impl PaginationCursor {
    pub fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }

    pub fn next(self) -> Self {
        Self {
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Error)]
pub enum PaginationError<E> {
    #[error("page fetch failed: {0}")]
    Fetch(#[source] E),
    /// The page cap was reached while pages were still full.
    #[error("stopped after {pages} full pages")]
    PageLimit { pages: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    max_pages: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Fetches every page and concatenates the items in order.
    pub async fn collect<T, E, F, Fut>(
        &self,
        mut fetch_page: F,
    ) -> Result<Vec<T>, PaginationError<E>>
    where
        F: FnMut(PaginationCursor) -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let mut items = Vec::new();
        let mut cursor = PaginationCursor::first(self.page_size);

        for _ in 0..self.max_pages {
            let page = fetch_page(cursor).await.map_err(PaginationError::Fetch)?;
            let last_page = page.len() < cursor.limit;
            items.extend(page);
            if last_page {
                return Ok(items);
            }
            cursor = cursor.next();
        }

        Err(PaginationError::PageLimit {
            pages: self.max_pages,
        })
    }

    /// Collects only the items whose key is in `keys`, stopping as soon as
    /// every key has been seen or the last page is reached. An empty key set
    /// returns nothing without fetching.
    pub async fn collect_matching<T, K, E, F, Fut>(
        &self,
        keys: impl IntoIterator<Item = K>,
        key_of: impl Fn(&T) -> K,
        mut fetch_page: F,
    ) -> Result<Vec<T>, PaginationError<E>>
    where
        K: Eq + Hash,
        F: FnMut(PaginationCursor) -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let wanted: HashSet<K> = keys.into_iter().collect();
        let mut found = HashSet::with_capacity(wanted.len());
        let mut items = Vec::new();
        if wanted.is_empty() {
            return Ok(items);
        }

        let mut cursor = PaginationCursor::first(self.page_size);
        for page_number in 1..=self.max_pages {
            let page = fetch_page(cursor).await.map_err(PaginationError::Fetch)?;
            let last_page = page.len() < cursor.limit;

            for item in page {
                let key = key_of(&item);
                if wanted.contains(&key) {
                    found.insert(key);
                    items.push(item);
                }
            }

            if found.len() == wanted.len() {
                debug!(pages = page_number, "all requested items found");
                return Ok(items);
            }
            if last_page {
                return Ok(items);
            }
            cursor = cursor.next();
        }

        Err(PaginationError::PageLimit {
            pages: self.max_pages,
        })
    }
}
