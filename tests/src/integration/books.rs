//! # Book Flows
//!
//! The typed client against a storage tier backed by in-memory storage.

#[cfg(test)]
mod tests {
    use crate::integration::support::TwoTier;
    use bookstore_rpc::{BookService, CallError};
    use bookstore_types::BookRequest;

    fn request(title: &str, author: &str, price: u64) -> BookRequest {
        BookRequest {
            title: title.into(),
            author: author.into(),
            price,
        }
    }

    #[tokio::test]
    async fn test_book_lifecycle() {
        let (tiers, storage) = TwoTier::with_books().await;
        let books = BookService::new(tiers.api.client().clone());

        books.post_book(1, request("Emma", "Jane Austen", 700)).await.unwrap();
        books
            .post_book(1, request("Ulysses", "James Joyce", 1500))
            .await
            .unwrap();
        books
            .post_book(2, request("Dubliners", "James Joyce", 900))
            .await
            .unwrap();
        assert_eq!(storage.len(), 3);

        let joyce = books.get_user_books(1, "joyce", "", "").await.unwrap();
        assert_eq!(joyce.len(), 1);
        assert_eq!(joyce[0].title, "Ulysses");

        let id = joyce[0].id.to_string();
        books
            .update_book(1, &id, request("Ulysses (annotated)", "James Joyce", 1800))
            .await
            .unwrap();
        let updated = books.get_user_book(1, &id).await.unwrap();
        assert_eq!(updated.title, "Ulysses (annotated)");
        assert_eq!(updated.price, 1800);

        // Owned by user 1, invisible to user 2.
        assert_eq!(
            books.delete_book(2, &id).await.unwrap_err(),
            CallError::NotFound
        );

        books.delete_book(1, &id).await.unwrap();
        assert_eq!(
            books.get_user_book(1, &id).await.unwrap_err(),
            CallError::NotFound
        );

        assert_eq!(tiers.api.registry().pending_count(), 0);
        tiers.shutdown().await;
    }

    #[tokio::test]
    async fn test_all_books_grouped_by_owner() {
        let (tiers, _storage) = TwoTier::with_books().await;
        let books = BookService::new(tiers.api.client().clone());

        assert_eq!(books.get_all_books().await.unwrap_err(), CallError::NotFound);

        books.post_book(4, request("Emma", "Jane Austen", 700)).await.unwrap();
        books.post_book(2, request("Ulysses", "James Joyce", 1500)).await.unwrap();
        books
            .post_book(4, request("Persuasion", "Jane Austen", 600))
            .await
            .unwrap();

        let grouped = books.get_all_books().await.unwrap();
        let owners: Vec<(u64, usize)> = grouped
            .iter()
            .map(|owner| (owner.user_id, owner.total_books))
            .collect();
        assert_eq!(owners, [(2, 1), (4, 2)]);
        assert_eq!(grouped[1].books[0].title, "Emma");
        assert_eq!(grouped[1].books[1].price, 600);

        tiers.shutdown().await;
    }

    #[tokio::test]
    async fn test_listing_limit_and_empty_result() {
        let (tiers, _storage) = TwoTier::with_books().await;
        let books = BookService::new(tiers.api.client().clone());

        for title in ["Emma", "Persuasion", "Sanditon"] {
            books
                .post_book(7, request(title, "Jane Austen", 500))
                .await
                .unwrap();
        }

        assert_eq!(books.get_user_books(7, "", "", "2").await.unwrap().len(), 2);
        assert_eq!(books.get_user_books(7, "", "", "").await.unwrap().len(), 3);
        assert_eq!(
            books.get_user_books(8, "", "", "").await.unwrap_err(),
            CallError::NotFound
        );

        tiers.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_arguments_rejected_before_publish() {
        let (tiers, _storage) = TwoTier::with_books().await;
        let books = BookService::new(tiers.api.client().clone());
        let published = tiers.broker.messages_published();

        for err in [
            books.get_user_books(1, "", "", "-1").await.unwrap_err(),
            books.get_user_book(1, "zero").await.unwrap_err(),
            books
                .update_book(1, "0", request("x", "y", 1))
                .await
                .unwrap_err(),
            books.delete_book(1, "").await.unwrap_err(),
        ] {
            assert!(matches!(err, CallError::InvalidInput(_)), "got {err:?}");
        }

        assert_eq!(tiers.broker.messages_published(), published);
        tiers.shutdown().await;
    }

    #[tokio::test]
    async fn test_ping() {
        let (tiers, _storage) = TwoTier::with_books().await;
        BookService::new(tiers.api.client().clone())
            .ping()
            .await
            .unwrap();
        tiers.shutdown().await;
    }
}
