//! In-memory book repository

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BookRepository, RepositoryError, RepositoryResult};
use crate::models::book::{Book, BookCreate, BookFilter, BookUpdate};

#[derive(Default)]
struct Store {
    books: BTreeMap<i32, Book>,
    last_id: i32,
}

impl Store {
    fn isbn_taken(&self, isbn: &str, except: Option<i32>) -> bool {
        self.books
            .values()
            .any(|b| b.isbn == isbn && Some(b.id) != except)
    }
}

/// Process-local repository keyed by id. Ids are assigned sequentially from 1
/// and never reused.
#[derive(Default)]
pub struct InMemoryBookRepository {
    store: RwLock<Store>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn add(&self, book: &BookCreate) -> RepositoryResult<Book> {
        let mut store = self.store.write().await;
        if store.isbn_taken(&book.isbn, None) {
            return Err(RepositoryError::DuplicateKey {
                isbn: book.isbn.clone(),
            });
        }
        store.last_id += 1;
        let created = book.clone().into_book(store.last_id);
        store.books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i32) -> RepositoryResult<Option<Book>> {
        Ok(self.store.read().await.books.get(&id).cloned())
    }

    async fn get_by_author_or_year(&self, filter: &BookFilter) -> RepositoryResult<Vec<Book>> {
        let store = self.store.read().await;
        Ok(store
            .books
            .values()
            .filter(|b| filter.accepts(b))
            .cloned()
            .collect())
    }

    async fn search(&self, query: &str) -> RepositoryResult<Vec<Book>> {
        let needle = query.to_lowercase();
        let store = self.store.read().await;
        Ok(store
            .books
            .values()
            .filter(|b| b.matches(&needle))
            .cloned()
            .collect())
    }

    async fn update(&self, book: &Book, updates: &BookUpdate) -> RepositoryResult<Option<Book>> {
        let mut store = self.store.write().await;
        if let Some(ref isbn) = updates.isbn {
            if store.isbn_taken(isbn, Some(book.id)) {
                return Err(RepositoryError::DuplicateKey { isbn: isbn.clone() });
            }
        }
        Ok(store.books.get_mut(&book.id).map(|stored| {
            updates.apply_to(stored);
            stored.clone()
        }))
    }

    async fn delete(&self, book: &Book) -> RepositoryResult<()> {
        match self.store.write().await.books.remove(&book.id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::DeleteFailure {
                id: book.id,
                source: "no row matched".into(),
            }),
        }
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Book>> {
        Ok(self.store.read().await.books.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str, isbn: &str) -> BookCreate {
        BookCreate {
            title: title.to_string(),
            author: "F. Scott Fitzgerald".to_string(),
            year: 1925,
            isbn: isbn.to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_assigns_sequential_ids() {
        let repo = InMemoryBookRepository::new();
        let first = repo.add(&candidate("A", "1")).await.unwrap();
        let second = repo.add(&candidate("B", "2")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_add_duplicate_isbn_leaves_store_untouched() {
        let repo = InMemoryBookRepository::new();
        repo.add(&candidate("A", "1")).await.unwrap();
        let err = repo.add(&candidate("B", "1")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateKey { ref isbn } if isbn == "1"));
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_none() {
        let repo = InMemoryBookRepository::new();
        assert!(repo.get_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_row_returns_none() {
        let repo = InMemoryBookRepository::new();
        let ghost = candidate("Ghost", "0").into_book(99);
        let updates = BookUpdate {
            year: Some(2000),
            ..Default::default()
        };
        assert!(repo.update(&ghost, &updates).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_to_taken_isbn_conflicts() {
        let repo = InMemoryBookRepository::new();
        repo.add(&candidate("A", "1")).await.unwrap();
        let b = repo.add(&candidate("B", "2")).await.unwrap();
        let updates = BookUpdate {
            isbn: Some("1".to_string()),
            ..Default::default()
        };
        let err = repo.update(&b, &updates).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn test_update_keeping_own_isbn_is_allowed() {
        let repo = InMemoryBookRepository::new();
        let a = repo.add(&candidate("A", "1")).await.unwrap();
        let updates = BookUpdate {
            title: Some("A2".to_string()),
            isbn: Some("1".to_string()),
            ..Default::default()
        };
        let updated = repo.update(&a, &updates).await.unwrap().unwrap();
        assert_eq!(updated.title, "A2");
    }

    #[tokio::test]
    async fn test_delete_twice_fails() {
        let repo = InMemoryBookRepository::new();
        let a = repo.add(&candidate("A", "1")).await.unwrap();
        repo.delete(&a).await.unwrap();
        let err = repo.delete(&a).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DeleteFailure { id: 1, .. }));
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let repo = InMemoryBookRepository::new();
        let a = repo.add(&candidate("A", "1")).await.unwrap();
        repo.delete(&a).await.unwrap();
        let b = repo.add(&candidate("B", "2")).await.unwrap();
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn test_filter_and_search() {
        let repo = InMemoryBookRepository::new();
        repo.add(&candidate("The Great Gatsby", "9780743273565")).await.unwrap();
        repo.add(&BookCreate {
            title: "The Old Man and the Sea".to_string(),
            author: "Ernest Hemingway".to_string(),
            year: 1952,
            isbn: "9780684801223".to_string(),
        })
        .await
        .unwrap();

        let by_year = repo
            .get_by_author_or_year(&BookFilter::new(None, Some(1952)))
            .await
            .unwrap();
        assert_eq!(by_year.len(), 1);
        assert_eq!(by_year[0].author, "Ernest Hemingway");

        let all = repo.get_by_author_or_year(&BookFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        assert_eq!(repo.search("THE").await.unwrap().len(), 2);
        assert_eq!(repo.search("gatsby").await.unwrap().len(), 1);
        assert!(repo.search("tolstoy").await.unwrap().is_empty());
    }
}
