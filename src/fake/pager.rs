//! Paginated listing simulator.
//!
//! Entries are either pages of items or transient error markers. The cursor
//! only moves forward; consuming an error entry advances it like any other
//! entry, so a caller that retries `next_page` moves on to the following
//! page.

use tracing::debug;

use super::errors::{FakeError, ResponseError};
use super::poller::STATUS_OK;
use super::queue::ResponseQueue;

/// One canned page response.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEntry<T> {
    Page { status: u16, items: Vec<T> },
    Error(ResponseError),
}

/// A successfully served page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub status: u16,
    pub items: Vec<T>,
}

/// Simulated paginated list operation.
#[derive(Debug, Clone)]
pub struct PagerSimulator<T> {
    queue: ResponseQueue<PageEntry<T>>,
    pages_served: usize,
    errors_served: usize,
    items_served: usize,
}

impl<T> PagerSimulator<T> {
    pub fn new() -> Self {
        Self {
            queue: ResponseQueue::new(),
            pages_served: 0,
            errors_served: 0,
            items_served: 0,
        }
    }

    /// Append a page of items.
    pub fn add_page(&mut self, items: Vec<T>) {
        self.add_page_with_status(STATUS_OK, items);
    }

    pub fn add_page_with_status(&mut self, status: u16, items: Vec<T>) {
        self.queue.push(PageEntry::Page { status, items });
    }

    /// Append a transient error entry. It is not counted as a page.
    pub fn add_transient_error(&mut self, err: ResponseError) {
        self.queue.push(PageEntry::Error(err));
    }

    /// True until the cursor has passed the last entry.
    pub fn has_more(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Consume the next entry, returning the full page on success.
    pub fn next_response(&mut self) -> Result<Page<T>, FakeError> {
        let entry = self.queue.pop().map_err(|_| FakeError::PagesExhausted)?;
        match entry {
            PageEntry::Page { status, items } => {
                self.pages_served += 1;
                self.items_served += items.len();
                debug!(cursor = self.cursor(), items = items.len(), "pager served page");
                Ok(Page { status, items })
            }
            PageEntry::Error(err) => {
                self.errors_served += 1;
                debug!(cursor = self.cursor(), error = %err, "pager served transient error");
                Err(FakeError::TransientPageError(err))
            }
        }
    }

    /// Consume the next entry, returning only its items.
    pub fn next_page(&mut self) -> Result<Vec<T>, FakeError> {
        self.next_response().map(|page| page.items)
    }

    /// Number of entries consumed so far, pages and errors alike.
    pub fn cursor(&self) -> usize {
        self.queue.popped()
    }

    /// Entries not yet consumed.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn pages_served(&self) -> usize {
        self.pages_served
    }

    pub fn errors_served(&self) -> usize {
        self.errors_served
    }

    pub fn items_served(&self) -> usize {
        self.items_served
    }
}

impl<T> Default for PagerSimulator<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Yields one result per entry until the pager is exhausted.
impl<T> Iterator for PagerSimulator<T> {
    type Item = Result<Vec<T>, ResponseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_page() {
            Ok(items) => Some(Ok(items)),
            Err(FakeError::TransientPageError(err)) => Some(Err(err)),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vms(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn network_error() -> ResponseError {
        ResponseError::new(503, "network")
    }

    #[test]
    fn test_pages_with_transient_error() {
        let mut pager = PagerSimulator::new();
        pager.add_page(vms(&["vm1", "vm2", "vm3"]));
        pager.add_transient_error(network_error());
        pager.add_page(vms(&["vm4", "vm5"]));

        let (mut items, mut pages, mut errors) = (0, 0, 0);
        while pager.has_more() {
            match pager.next_page() {
                Ok(page) => {
                    pages += 1;
                    items += page.len();
                }
                Err(FakeError::TransientPageError(err)) => {
                    assert_eq!(err, network_error());
                    errors += 1;
                }
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(items, 5);
        assert_eq!(pages, 2);
        assert_eq!(errors, 1);
        assert_eq!(pager.items_served(), 5);
        assert_eq!(pager.pages_served(), 2);
        assert_eq!(pager.errors_served(), 1);
    }

    #[test]
    fn test_error_keeps_has_more_when_entries_remain() {
        let mut pager = PagerSimulator::new();
        pager.add_transient_error(network_error());
        pager.add_page(vms(&["vm1"]));

        assert!(pager.next_page().is_err());
        assert!(pager.has_more());
        assert_eq!(pager.cursor(), 1);
    }

    #[test]
    fn test_trailing_error_consumed_before_has_more_false() {
        let mut pager = PagerSimulator::new();
        pager.add_page(vms(&["vm1"]));
        pager.add_transient_error(network_error());

        pager.next_page().unwrap();
        assert!(pager.has_more());
        assert!(matches!(pager.next_page(), Err(FakeError::TransientPageError(_))));
        assert!(!pager.has_more());
        assert_eq!(pager.next_page(), Err(FakeError::PagesExhausted));
    }

    #[test]
    fn test_has_more_idempotent() {
        let mut pager: PagerSimulator<String> = PagerSimulator::new();
        assert!(!pager.has_more());
        assert!(!pager.has_more());

        pager.add_page(vec![]);
        for _ in 0..5 {
            assert!(pager.has_more());
        }
        assert_eq!(pager.cursor(), 0);
    }

    #[test]
    fn test_empty_page_counts_as_page() {
        let mut pager: PagerSimulator<String> = PagerSimulator::new();
        pager.add_page(vec![]);
        assert_eq!(pager.next_page().unwrap(), Vec::<String>::new());
        assert_eq!(pager.pages_served(), 1);
    }

    #[test]
    fn test_iterator_yields_each_entry() {
        let mut pager = PagerSimulator::new();
        pager.add_page_with_status(200, vec![1, 2, 3]);
        pager.add_transient_error(network_error());
        pager.add_page(vec![4, 5]);

        let results: Vec<_> = pager.by_ref().collect();
        assert_eq!(
            results,
            vec![Ok(vec![1, 2, 3]), Err(network_error()), Ok(vec![4, 5])]
        );
        assert!(!pager.has_more());
        assert!(pager.next().is_none());
    }
}
