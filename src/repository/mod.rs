//! Repository layer: the persistence contract for books and its adapters

pub mod books;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::book::{Book, BookCreate, BookFilter, BookUpdate};

pub use books::PgBookRepository;
pub use memory::InMemoryBookRepository;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures signalled by a book repository
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Duplicate ISBN {isbn}")]
    DuplicateKey { isbn: String },

    #[error("Failed to delete book {id}: {source}")]
    DeleteFailure {
        id: i32,
        #[source]
        source: BoxError,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Persistence contract for the book catalog.
///
/// Query operations report absence as `None` or an empty vector, never as an
/// error. Sequences come back in the store's natural order (ascending id).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Persist a new book and return the stored row.
    /// Fails with `DuplicateKey` when the ISBN is already taken.
    async fn add(&self, book: &BookCreate) -> RepositoryResult<Book>;

    async fn get_by_id(&self, id: i32) -> RepositoryResult<Option<Book>>;

    /// Books matching every supplied criterion, or all books for an empty filter
    async fn get_by_author_or_year(&self, filter: &BookFilter) -> RepositoryResult<Vec<Book>>;

    /// Case-insensitive substring match over title, author, ISBN and year
    async fn search(&self, query: &str) -> RepositoryResult<Vec<Book>>;

    /// Apply the present fields of `updates` to `book`.
    /// Returns `None` when the row no longer exists.
    async fn update(&self, book: &Book, updates: &BookUpdate) -> RepositoryResult<Option<Book>>;

    /// Remove exactly the row for `book`, or fail with `DeleteFailure`
    async fn delete(&self, book: &Book) -> RepositoryResult<()>;

    async fn get_all(&self) -> RepositoryResult<Vec<Book>>;
}
