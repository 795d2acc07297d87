//! Lazy walk over a contiguous range of listing pages

use crate::crawler::extractor::ProductExtractor;
use crate::crawler::fetcher::PageFetcher;
use crate::product::PageResult;
use crate::Result;

/// Yields one [`PageResult`] per page from `offset` to `limit` inclusive
///
/// Pages are fetched one at a time, in increasing order, and only when
/// [`PageIterator::next`] is awaited. The first error is returned once and
/// ends the iteration.
pub struct PageIterator<'a> {
    fetcher: &'a PageFetcher,
    extractor: &'a ProductExtractor,
    next_page: u32,
    last_page: u32,
    done: bool,
}

impl<'a> PageIterator<'a> {
    pub fn new(
        fetcher: &'a PageFetcher,
        extractor: &'a ProductExtractor,
        offset: u32,
        limit: u32,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            next_page: offset,
            last_page: limit,
            done: offset > limit,
        }
    }

    /// Number of pages not yet yielded
    pub fn remaining(&self) -> u32 {
        if self.done {
            0
        } else {
            (self.last_page - self.next_page).saturating_add(1)
        }
    }

    /// Fetches and extracts the next page
    pub async fn next(&mut self) -> Option<Result<PageResult>> {
        if self.done {
            return None;
        }

        let page = self.next_page;
        if page == self.last_page {
            self.done = true;
        } else {
            self.next_page += 1;
        }

        let result = self.load(page).await;
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }

    async fn load(&self, page: u32) -> Result<PageResult> {
        let (url, body) = self.fetcher.fetch(page).await?;
        let result = self.extractor.extract(page, &body, &url)?;
        tracing::debug!("Extracted {} products from page {}", result.len(), page);
        Ok(result)
    }
}
