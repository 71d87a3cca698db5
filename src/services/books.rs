//! Book catalog service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookCreate, BookFilter, BookUpdate},
    repository::{BookRepository, RepositoryError},
};

pub const BOOK_NOT_FOUND: &str = "Book not found";
pub const NO_SEARCH_RESULTS: &str = "No books found matching the query.";

/// A failed delete is reported to callers exactly like a missing book.
fn delete_failure_as_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::DeleteFailure { id, source } => {
            tracing::warn!("Delete of book {} rejected by store: {}", id, source);
            AppError::NotFound(BOOK_NOT_FOUND.to_string())
        }
        other => other.into(),
    }
}

#[derive(Clone)]
pub struct BookService {
    repository: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    /// Add a book; an ISBN already in the catalog is a conflict
    pub async fn add(&self, candidate: BookCreate) -> AppResult<Book> {
        candidate.validate()?;
        let book = self.repository.add(&candidate).await?;
        tracing::info!("Book {} added (isbn={})", book.id, book.isbn);
        Ok(book)
    }

    /// List books by author and/or year. An empty result is not an error.
    pub async fn get_by_author_or_year(
        &self,
        author: Option<String>,
        year: Option<i32>,
    ) -> AppResult<Vec<Book>> {
        let filter = BookFilter::new(author, year);
        Ok(self.repository.get_by_author_or_year(&filter).await?)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        tracing::debug!("Looking up book {}", id);
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(BOOK_NOT_FOUND.to_string()))
    }

    /// Apply a partial update to an existing book
    pub async fn update(&self, id: i32, updates: BookUpdate) -> AppResult<Book> {
        updates.validate()?;
        let book = self.get_by_id(id).await?;
        let updated = self
            .repository
            .update(&book, &updates)
            .await?
            .ok_or_else(|| AppError::NotFound(BOOK_NOT_FOUND.to_string()))?;
        tracing::info!("Book {} updated", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let book = self.get_by_id(id).await?;
        self.repository
            .delete(&book)
            .await
            .map_err(delete_failure_as_not_found)?;
        tracing::info!("Book {} deleted", id);
        Ok(())
    }

    /// Free-text search. Unlike listing, an empty result is reported as an error.
    pub async fn search(&self, query: &str) -> AppResult<Vec<Book>> {
        let books = self.repository.search(query).await?;
        if books.is_empty() {
            return Err(AppError::NoResults(NO_SEARCH_RESULTS.to_string()));
        }
        Ok(books)
    }

    pub async fn get_all(&self) -> AppResult<Vec<Book>> {
        Ok(self.repository.get_all().await?)
    }
}
