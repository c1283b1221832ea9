use tracing::debug;

use crate::api::Page;

/// Handle for one in-flight list fetch.
///
/// Tickets are numbered monotonically per view; only the response to the
/// most recently issued ticket is allowed to replace the view's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket<Q> {
    generation: u64,
    pub query: Q,
}

impl<Q> FetchTicket<Q> {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The last fetched page of a list, plus pagination and request ordering.
#[derive(Debug, Clone)]
pub struct ListView<T> {
    page: u32,
    issued: u64,
    items: Vec<T>,
    count: Option<u64>,
    has_next: bool,
    has_previous: bool,
    loaded: bool,
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        ListView {
            page: 1,
            issued: 0,
            items: Vec::new(),
            count: None,
            has_next: false,
            has_previous: false,
            loaded: false,
        }
    }
}

impl<T> ListView<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn reset_page(&mut self) {
        self.page = 1;
    }

    /// Page numbers start at 1; 0 is clamped.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn next_page(&mut self) -> bool {
        if self.has_next {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn previous_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn begin<Q>(&mut self, query: Q) -> FetchTicket<Q> {
        self.issued += 1;
        FetchTicket {
            generation: self.issued,
            query,
        }
    }

    /// Whether `ticket` is still the most recently issued one
    pub fn is_current<Q>(&self, ticket: &FetchTicket<Q>) -> bool {
        ticket.generation == self.issued
    }

    /// Install a fetched page. Returns false (and changes nothing) when a
    /// newer fetch has been started since `ticket` was issued.
    pub fn complete<Q>(&mut self, ticket: &FetchTicket<Q>, page: Page<T>) -> bool {
        if !self.is_current(ticket) {
            debug!(
                ticket = ticket.generation,
                latest = self.issued,
                "dropping stale list response"
            );
            return false;
        }
        self.items = page.items;
        self.count = page.count;
        self.has_next = page.has_next;
        self.has_previous = page.has_previous;
        self.loaded = true;
        true
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn count(&self) -> Option<u64> {
        self.count
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn has_previous(&self) -> bool {
        self.has_previous
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}
