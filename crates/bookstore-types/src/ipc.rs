//! # Bus Payloads
//!
//! Method names and payload shapes exchanged inside request and response
//! envelopes. The envelope carries the correlation token; payloads never
//! repeat it.

use crate::entities::{Book, BookId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Method names served by the storage tier.
pub mod methods {
    /// List every stored book, grouped by owner.
    pub const GET_ALL_BOOKS: &str = "GetAllBooksMethod";
    /// List a user's books with optional filters.
    pub const GET_USER_BOOKS: &str = "GetUserBooks";
    /// Fetch one book owned by a user.
    pub const GET_USER_BOOK: &str = "GetUserBook";
    /// Create a book.
    pub const POST_BOOK: &str = "PostBookMethod";
    /// Replace title, author and price of an owned book.
    pub const UPDATE_BOOK: &str = "UpdateBookMethod";
    /// Delete an owned book.
    pub const DELETE_BOOK: &str = "DeleteBookMethod";
    /// Liveness round trip; no storage access.
    pub const PING: &str = "Ping";
}

/// Payload of `GetUserBooks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GetUserBooksRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub title: String,
    /// Maximum rows to return; 0 means unlimited.
    #[serde(default)]
    pub limit: usize,
}

/// Result of `GetUserBooks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GetUserBooksResponse {
    pub books: Vec<Book>,
}

/// Payload of `GetUserBook` and `DeleteBookMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookKey {
    pub id: BookId,
    pub user_id: UserId,
}

/// A book as listed under its owner; the owner is implied by the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub price: u64,
}

impl From<Book> for BookSummary {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            price: book.price,
        }
    }
}

/// One owner's entry in the `GetAllBooksMethod` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBooks {
    pub user_id: UserId,
    pub total_books: usize,
    pub books: Vec<BookSummary>,
}

impl UserBooks {
    /// Group `books` by owner, owners in ascending id order and books in
    /// input order within each owner.
    #[must_use]
    pub fn group_by_owner(books: impl IntoIterator<Item = Book>) -> Vec<UserBooks> {
        let mut owners: BTreeMap<UserId, Vec<BookSummary>> = BTreeMap::new();
        for book in books {
            owners.entry(book.user_id).or_default().push(book.into());
        }

        owners
            .into_iter()
            .map(|(user_id, books)| UserBooks {
                user_id,
                total_books: books.len(),
                books,
            })
            .collect()
    }
}
