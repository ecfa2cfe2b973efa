//! Pages of remote results.

use serde::{Deserialize, Serialize};

/// One page of a cursor-paginated list.
///
/// The continuation token is opaque. An absent or empty token marks the
/// last page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in service order
    pub items: Vec<T>,
    /// Token for the next page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    /// A page followed by more pages.
    pub fn new(items: Vec<T>, next_page_token: impl Into<String>) -> Self {
        Self {
            items,
            next_page_token: Some(next_page_token.into()),
        }
    }

    /// The final page of a list.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }

    /// The cursor for the following page, if there is one.
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|token| !token.is_empty())
    }

    /// Whether another page follows this one.
    pub fn has_next(&self) -> bool {
        self.next_cursor().is_some()
    }
}
