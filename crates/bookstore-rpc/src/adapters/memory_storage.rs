//! In-memory [`BookStorage`], used by the node binary and tests.

use crate::ports::BookStorage;
use async_trait::async_trait;
use bookstore_types::{Book, BookFilter, BookId, BookRequest, StorageError, UserId};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Books kept in an ordered map keyed by id.
#[derive(Debug)]
pub struct InMemoryBookStorage {
    books: RwLock<BTreeMap<BookId, Book>>,
    next_id: AtomicU64,
}

impl Default for InMemoryBookStorage {
    fn default() -> Self {
        Self {
            books: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl InMemoryBookStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored books across all users
    pub fn len(&self) -> usize {
        self.books.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.read().is_empty()
    }

    fn not_found(user_id: UserId, id: BookId) -> StorageError {
        StorageError::NotFound(format!("book {id} of user {user_id}"))
    }
}

#[async_trait]
impl BookStorage for InMemoryBookStorage {
    async fn get_user_book(&self, user_id: UserId, id: BookId) -> Result<Book, StorageError> {
        self.books
            .read()
            .get(&id)
            .filter(|book| book.user_id == user_id)
            .cloned()
            .ok_or_else(|| Self::not_found(user_id, id))
    }

    async fn list_all_books(&self) -> Result<Vec<Book>, StorageError> {
        let books: Vec<Book> = self.books.read().values().cloned().collect();
        if books.is_empty() {
            return Err(StorageError::NotFound("books".into()));
        }
        Ok(books)
    }

    async fn list_user_books(
        &self,
        user_id: UserId,
        filter: &BookFilter,
        limit: usize,
    ) -> Result<Vec<Book>, StorageError> {
        let limit = if limit == 0 { usize::MAX } else { limit };
        let books: Vec<Book> = self
            .books
            .read()
            .values()
            .filter(|book| book.user_id == user_id && filter.matches(book))
            .take(limit)
            .cloned()
            .collect();

        if books.is_empty() {
            return Err(StorageError::NotFound(format!("books of user {user_id}")));
        }
        Ok(books)
    }

    async fn create_book(&self, mut book: Book) -> Result<BookId, StorageError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        book.id = id;
        debug!(id, user_id = book.user_id, "Stored book");
        self.books.write().insert(id, book);
        Ok(id)
    }

    async fn update_book(
        &self,
        user_id: UserId,
        id: BookId,
        update: BookRequest,
    ) -> Result<(), StorageError> {
        let mut books = self.books.write();
        match books.get_mut(&id) {
            Some(book) if book.user_id == user_id => {
                *book = update.into_book(user_id, id);
                Ok(())
            }
            _ => Err(Self::not_found(user_id, id)),
        }
    }

    async fn delete_book(&self, user_id: UserId, id: BookId) -> Result<(), StorageError> {
        let mut books = self.books.write();
        match books.get(&id) {
            Some(book) if book.user_id == user_id => {
                books.remove(&id);
                Ok(())
            }
            _ => Err(Self::not_found(user_id, id)),
        }
    }
}
