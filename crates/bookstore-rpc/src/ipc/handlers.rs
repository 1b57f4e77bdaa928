//! Book method handlers.
//!
//! Each handler decodes its payload, makes one storage call and maps the
//! storage error vocabulary onto call outcomes.

use crate::domain::envelope::CallOutcome;
use crate::ipc::methods::{decode_payload, HandlerReply, MethodHandler, MethodTable};
use crate::ports::BookStorage;
use async_trait::async_trait;
use bookstore_types::{
    methods, Book, BookFilter, BookKey, BookRequest, GetUserBooksRequest, GetUserBooksResponse,
    StorageError, UserBooks,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

impl From<StorageError> for CallOutcome {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => CallOutcome::NotFound,
            StorageError::DatabaseError(message) => CallOutcome::DbError(message),
        }
    }
}

fn storage_failure(method: &str, e: StorageError) -> HandlerReply {
    debug!(method, error = %e, "Storage call failed");
    HandlerReply::failed(e.into())
}

/// Table of every book method plus `Ping`, backed by `storage`.
pub fn book_methods(storage: Arc<dyn BookStorage>) -> MethodTable {
    MethodTable::builder()
        .register(methods::GET_ALL_BOOKS, Arc::new(GetAllBooks(storage.clone())))
        .register(
            methods::GET_USER_BOOKS,
            Arc::new(GetUserBooks(storage.clone())),
        )
        .register(methods::GET_USER_BOOK, Arc::new(GetUserBook(storage.clone())))
        .register(methods::POST_BOOK, Arc::new(PostBook(storage.clone())))
        .register(methods::UPDATE_BOOK, Arc::new(UpdateBook(storage.clone())))
        .register(methods::DELETE_BOOK, Arc::new(DeleteBook(storage)))
        .register(methods::PING, Arc::new(Ping))
        .build()
}

struct GetAllBooks(Arc<dyn BookStorage>);

#[async_trait]
impl MethodHandler for GetAllBooks {
    async fn handle(&self, _payload: Value) -> HandlerReply {
        match self.0.list_all_books().await {
            Ok(books) => HandlerReply::ok_json(&UserBooks::group_by_owner(books)),
            Err(e) => storage_failure(methods::GET_ALL_BOOKS, e),
        }
    }
}

struct GetUserBooks(Arc<dyn BookStorage>);

#[async_trait]
impl MethodHandler for GetUserBooks {
    async fn handle(&self, payload: Value) -> HandlerReply {
        let request: GetUserBooksRequest = match decode_payload(payload) {
            Ok(request) => request,
            Err(reply) => return reply,
        };
        let filter = BookFilter::new(&request.author, &request.title);

        match self
            .0
            .list_user_books(request.user_id, &filter, request.limit)
            .await
        {
            Ok(books) => HandlerReply::ok_json(&GetUserBooksResponse { books }),
            Err(e) => storage_failure(methods::GET_USER_BOOKS, e),
        }
    }
}

struct GetUserBook(Arc<dyn BookStorage>);

#[async_trait]
impl MethodHandler for GetUserBook {
    async fn handle(&self, payload: Value) -> HandlerReply {
        let key: BookKey = match decode_payload(payload) {
            Ok(key) => key,
            Err(reply) => return reply,
        };

        match self.0.get_user_book(key.user_id, key.id).await {
            Ok(book) => HandlerReply::ok_json(&book),
            Err(e) => storage_failure(methods::GET_USER_BOOK, e),
        }
    }
}

struct PostBook(Arc<dyn BookStorage>);

#[async_trait]
impl MethodHandler for PostBook {
    async fn handle(&self, payload: Value) -> HandlerReply {
        let book: Book = match decode_payload(payload) {
            Ok(book) => book,
            Err(reply) => return reply,
        };

        match self.0.create_book(book).await {
            Ok(_) => HandlerReply::ok(Value::Null),
            Err(e) => storage_failure(methods::POST_BOOK, e),
        }
    }
}

struct UpdateBook(Arc<dyn BookStorage>);

#[async_trait]
impl MethodHandler for UpdateBook {
    async fn handle(&self, payload: Value) -> HandlerReply {
        let book: Book = match decode_payload(payload) {
            Ok(book) => book,
            Err(reply) => return reply,
        };

        match self
            .0
            .update_book(book.user_id, book.id, BookRequest::from(&book))
            .await
        {
            Ok(()) => HandlerReply::ok(Value::Null),
            Err(e) => storage_failure(methods::UPDATE_BOOK, e),
        }
    }
}

struct DeleteBook(Arc<dyn BookStorage>);

#[async_trait]
impl MethodHandler for DeleteBook {
    async fn handle(&self, payload: Value) -> HandlerReply {
        let key: BookKey = match decode_payload(payload) {
            Ok(key) => key,
            Err(reply) => return reply,
        };

        match self.0.delete_book(key.user_id, key.id).await {
            Ok(()) => HandlerReply::ok(Value::Null),
            Err(e) => storage_failure(methods::DELETE_BOOK, e),
        }
    }
}

struct Ping;

#[async_trait]
impl MethodHandler for Ping {
    async fn handle(&self, _payload: Value) -> HandlerReply {
        HandlerReply::ok(Value::String("pong".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryBookStorage;
    use crate::domain::correlation::CallId;
    use crate::domain::envelope::RequestEnvelope;
    use serde_json::json;

    async fn call(table: &MethodTable, method: &str, payload: Value) -> HandlerReply {
        let request = RequestEnvelope::new(method, CallId::new(), payload);
        let response = table.dispatch(&request).await.unwrap();
        HandlerReply {
            result: response.result,
            outcome: response.outcome,
        }
    }

    struct BrokenStorage;

    #[async_trait]
    impl BookStorage for BrokenStorage {
        async fn list_all_books(&self) -> Result<Vec<Book>, StorageError> {
            Err(StorageError::DatabaseError("connection reset".into()))
        }
        async fn get_user_book(&self, _: u64, _: u64) -> Result<Book, StorageError> {
            Err(StorageError::DatabaseError("connection reset".into()))
        }
        async fn list_user_books(
            &self,
            _: u64,
            _: &BookFilter,
            _: usize,
        ) -> Result<Vec<Book>, StorageError> {
            Err(StorageError::DatabaseError("connection reset".into()))
        }
        async fn create_book(&self, _: Book) -> Result<u64, StorageError> {
            Err(StorageError::DatabaseError("connection reset".into()))
        }
        async fn update_book(&self, _: u64, _: u64, _: BookRequest) -> Result<(), StorageError> {
            Err(StorageError::DatabaseError("connection reset".into()))
        }
        async fn delete_book(&self, _: u64, _: u64) -> Result<(), StorageError> {
            Err(StorageError::DatabaseError("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn test_post_then_get() {
        let table = book_methods(Arc::new(InMemoryBookStorage::new()));

        let posted = call(
            &table,
            methods::POST_BOOK,
            json!({"title": "Emma", "author": "Jane Austen", "price": 700, "user_id": 3}),
        )
        .await;
        assert!(posted.outcome.is_ok());

        let listed = call(&table, methods::GET_USER_BOOKS, json!({"user_id": 3})).await;
        let books: GetUserBooksResponse = serde_json::from_value(listed.result).unwrap();
        assert_eq!(books.books.len(), 1);

        let id = books.books[0].id;
        let fetched = call(&table, methods::GET_USER_BOOK, json!({"id": id, "user_id": 3})).await;
        assert_eq!(fetched.result["title"], "Emma");
    }

    #[tokio::test]
    async fn test_all_books_grouped_by_owner() {
        let table = book_methods(Arc::new(InMemoryBookStorage::new()));
        for (title, user_id) in [("Emma", 3), ("Ulysses", 1), ("Persuasion", 3)] {
            let posted = call(
                &table,
                methods::POST_BOOK,
                json!({"title": title, "author": "Anon", "price": 100, "user_id": user_id}),
            )
            .await;
            assert!(posted.outcome.is_ok());
        }

        let reply = call(&table, methods::GET_ALL_BOOKS, Value::Null).await;
        assert!(reply.outcome.is_ok());

        let grouped: Vec<UserBooks> = serde_json::from_value(reply.result).unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!((grouped[0].user_id, grouped[0].total_books), (1, 1));
        assert_eq!((grouped[1].user_id, grouped[1].total_books), (3, 2));
        assert_eq!(grouped[1].books[1].title, "Persuasion");
    }

    #[tokio::test]
    async fn test_all_books_on_empty_store_is_not_found() {
        let table = book_methods(Arc::new(InMemoryBookStorage::new()));
        let reply = call(&table, methods::GET_ALL_BOOKS, Value::Null).await;

        assert_eq!(reply.outcome, CallOutcome::NotFound);
        assert_eq!(reply.result, Value::Null);
    }

    #[tokio::test]
    async fn test_missing_book_is_not_found() {
        let table = book_methods(Arc::new(InMemoryBookStorage::new()));
        let reply = call(&table, methods::GET_USER_BOOK, json!({"id": 5, "user_id": 1})).await;

        assert_eq!(reply.outcome, CallOutcome::NotFound);
        assert_eq!(reply.result, Value::Null);
    }

    #[tokio::test]
    async fn test_bad_payload_is_invalid_input() {
        let table = book_methods(Arc::new(InMemoryBookStorage::new()));
        let reply = call(&table, methods::DELETE_BOOK, json!({"id": "seven"})).await;

        assert!(matches!(reply.outcome, CallOutcome::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_storage_failure_is_db_error() {
        let table = book_methods(Arc::new(BrokenStorage));
        let reply = call(&table, methods::GET_USER_BOOKS, json!({"user_id": 1})).await;

        assert_eq!(reply.outcome, CallOutcome::DbError("connection reset".into()));
    }

    #[tokio::test]
    async fn test_ping() {
        let table = book_methods(Arc::new(BrokenStorage));
        let reply = call(&table, methods::PING, json!(null)).await;

        assert_eq!(reply.result, json!("pong"));
        assert_eq!(table.len(), 7);
    }
}
