//! # Core Domain Entities
//!
//! Books are owned by users; every storage operation except the all-books
//! listing is scoped by the owning user's identifier.

use serde::{Deserialize, Serialize};

/// Identifier of a registered user.
pub type UserId = u64;

/// Identifier of a stored book.
pub type BookId = u64;

/// A book record as stored and as returned over the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Book {
    /// Primary key. Ignored on creation; storage assigns it.
    #[serde(default)]
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub price: u64,
    /// Owner of the record.
    #[serde(default)]
    pub user_id: UserId,
}

/// Client-supplied book fields, used both for creation and full updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BookRequest {
    pub title: String,
    pub author: String,
    pub price: u64,
}

impl BookRequest {
    /// Build the stored representation for `user_id`.
    #[must_use]
    pub fn into_book(self, user_id: UserId, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            price: self.price,
            user_id,
        }
    }
}

impl From<&Book> for BookRequest {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            price: book.price,
        }
    }
}

/// Optional substring filters applied when listing a user's books.
///
/// Matching is case-insensitive. `None` and empty strings both mean
/// "no filter".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookFilter {
    pub author: Option<String>,
    pub title: Option<String>,
}

impl BookFilter {
    /// Build a filter from raw query values, treating empty strings as absent.
    #[must_use]
    pub fn new(author: &str, title: &str) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            author: non_empty(author),
            title: non_empty(title),
        }
    }

    /// Returns true if `book` passes every configured filter.
    #[must_use]
    pub fn matches(&self, book: &Book) -> bool {
        fn contains_ci(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }

        self.author
            .as_deref()
            .map_or(true, |author| contains_ci(&book.author, author))
            && self
                .title
                .as_deref()
                .map_or(true, |title| contains_ci(&book.title, title))
    }
}
