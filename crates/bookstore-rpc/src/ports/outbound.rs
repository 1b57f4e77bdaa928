//! Outbound ports for the request handlers.

use async_trait::async_trait;
use bookstore_types::{Book, BookFilter, BookId, BookRequest, StorageError, UserId};

/// Persistence behind the book methods.
///
/// Every operation except [`list_all_books`](Self::list_all_books) is scoped
/// by owner; a row owned by someone else is reported as
/// [`StorageError::NotFound`].
#[async_trait]
pub trait BookStorage: Send + Sync {
    /// Fetch one book.
    async fn get_user_book(&self, user_id: UserId, id: BookId) -> Result<Book, StorageError>;

    /// Every stored book in id order. An empty store is `NotFound`.
    async fn list_all_books(&self) -> Result<Vec<Book>, StorageError>;

    /// List a user's books in id order. `limit` 0 means no limit.
    ///
    /// An empty result is `NotFound`.
    async fn list_user_books(
        &self,
        user_id: UserId,
        filter: &BookFilter,
        limit: usize,
    ) -> Result<Vec<Book>, StorageError>;

    /// Store a new book and return its assigned id.
    async fn create_book(&self, book: Book) -> Result<BookId, StorageError>;

    /// Replace title, author and price.
    async fn update_book(
        &self,
        user_id: UserId,
        id: BookId,
        update: BookRequest,
    ) -> Result<(), StorageError>;

    async fn delete_book(&self, user_id: UserId, id: BookId) -> Result<(), StorageError>;
}
