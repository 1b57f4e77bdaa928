//! Typed bookstore client.
//!
//! Validates raw request values on the calling side and maps each book
//! method onto one correlated call. Validation failures are returned before
//! anything is published.

use crate::domain::error::CallError;
use crate::ipc::client::RpcClient;
use bookstore_types::{
    methods, Book, BookId, BookKey, BookRequest, GetUserBooksRequest, GetUserBooksResponse,
    UserBooks, UserId,
};
use serde_json::Value;

/// Book operations over the bus.
#[derive(Clone)]
pub struct BookService {
    client: RpcClient,
}

impl BookService {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }

    /// Every stored book, grouped by owner.
    pub async fn get_all_books(&self) -> Result<Vec<UserBooks>, CallError> {
        self.client.call(methods::GET_ALL_BOOKS, &Value::Null).await
    }

    /// List a user's books. `limit` is empty for no limit, else a positive integer.
    pub async fn get_user_books(
        &self,
        user_id: UserId,
        author: &str,
        title: &str,
        limit: &str,
    ) -> Result<Vec<Book>, CallError> {
        let request = GetUserBooksRequest {
            user_id,
            author: author.to_string(),
            title: title.to_string(),
            limit: parse_limit(limit)?,
        };
        let response: GetUserBooksResponse =
            self.client.call(methods::GET_USER_BOOKS, &request).await?;
        Ok(response.books)
    }

    pub async fn get_user_book(&self, user_id: UserId, id: &str) -> Result<Book, CallError> {
        let key = BookKey {
            id: parse_id(id)?,
            user_id,
        };
        self.client.call(methods::GET_USER_BOOK, &key).await
    }

    pub async fn post_book(&self, user_id: UserId, book: BookRequest) -> Result<(), CallError> {
        let book = book.into_book(user_id, 0);
        let _: Value = self.client.call(methods::POST_BOOK, &book).await?;
        Ok(())
    }

    pub async fn update_book(
        &self,
        user_id: UserId,
        id: &str,
        book: BookRequest,
    ) -> Result<(), CallError> {
        let book = book.into_book(user_id, parse_id(id)?);
        let _: Value = self.client.call(methods::UPDATE_BOOK, &book).await?;
        Ok(())
    }

    pub async fn delete_book(&self, user_id: UserId, id: &str) -> Result<(), CallError> {
        let key = BookKey {
            id: parse_id(id)?,
            user_id,
        };
        let _: Value = self.client.call(methods::DELETE_BOOK, &key).await?;
        Ok(())
    }

    /// Round trip with no storage access.
    pub async fn ping(&self) -> Result<(), CallError> {
        let _: Value = self.client.call(methods::PING, &Value::Null).await?;
        Ok(())
    }
}

fn parse_limit(raw: &str) -> Result<usize, CallError> {
    if raw.is_empty() {
        return Ok(0);
    }
    match raw.parse::<usize>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(CallError::InvalidInput(format!(
            "limit must be a positive integer, got {raw:?}"
        ))),
    }
}

fn parse_id(raw: &str) -> Result<BookId, CallError> {
    match raw.parse::<BookId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(CallError::InvalidInput(format!(
            "book id must be a positive integer, got {raw:?}"
        ))),
    }
}
