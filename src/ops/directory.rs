//! Pieces shared by the project and task directories.

use std::time::{Duration, Instant};

use crate::api::ApiError;

use super::debounce::Debouncer;
use super::forms::FieldErrors;

/// Default quiet period before typed search text is committed
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Error type for directory operations
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Client-side validation failed; nothing was sent
    #[error("{0}")]
    Invalid(#[from] FieldErrors),
    #[error("cannot delete: has attached tasks")]
    HasTasks,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result of a confirmed-or-not delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// Free-text search box with debounced commits.
///
/// `text` is what the user typed; `committed` is what the list is filtered
/// by. The two converge once input has been quiet for the debounce delay.
#[derive(Debug, Clone)]
pub struct SearchInput {
    text: String,
    committed: String,
    debouncer: Debouncer<String>,
}

impl SearchInput {
    pub fn new(delay: Duration) -> Self {
        SearchInput {
            text: String::new(),
            committed: String::new(),
            debouncer: Debouncer::new(delay),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn committed(&self) -> &str {
        &self.committed
    }

    /// Record a keystroke; the commit is deferred
    pub fn type_text(&mut self, text: &str, now: Instant) {
        self.text = text.to_string();
        self.debouncer.push(text.trim().to_string(), now);
    }

    /// Commit pending text if it is due. True when the committed value changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(value) => self.apply(value),
            None => false,
        }
    }

    /// Commit immediately, dropping any pending keystrokes
    pub fn commit(&mut self, text: &str) -> bool {
        self.debouncer.cancel();
        self.text = text.to_string();
        self.apply(text.trim().to_string())
    }

    fn apply(&mut self, value: String) -> bool {
        if value == self.committed {
            return false;
        }
        self.committed = value;
        true
    }
}

impl Default for SearchInput {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}
