//! Book model and related request types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book record as persisted in the `books` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    /// Store-assigned identifier
    pub id: i32,
    pub title: String,
    pub author: String,
    /// Publication year
    pub year: i32,
    /// Unique across the catalog
    pub isbn: String,
}

impl Book {
    /// Whether `needle` (already lowercased) occurs in any searchable field
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.author.to_lowercase().contains(needle)
            || self.isbn.to_lowercase().contains(needle)
            || self.year.to_string().contains(needle)
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookCreate {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: String,
    pub year: i32,
    #[validate(length(min = 1, message = "ISBN must not be empty"))]
    pub isbn: String,
}

impl BookCreate {
    /// Materialize the candidate once the store has assigned an id
    pub fn into_book(self, id: i32) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            year: self.year,
            isbn: self.isbn,
        }
    }
}

/// Partial update request. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct BookUpdate {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: Option<String>,
    pub year: Option<i32>,
    #[validate(length(min = 1, message = "ISBN must not be empty"))]
    pub isbn: Option<String>,
}

impl BookUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.year.is_none() && self.isbn.is_none()
    }

    /// Apply the present fields to `book` in place
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(ref title) = self.title {
            book.title = title.clone();
        }
        if let Some(ref author) = self.author {
            book.author = author.clone();
        }
        if let Some(year) = self.year {
            book.year = year;
        }
        if let Some(ref isbn) = self.isbn {
            book.isbn = isbn.clone();
        }
    }
}

/// List/filter query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Exact author match
    pub author: Option<String>,
    /// Exact publication year match
    pub year: Option<i32>,
}

/// Free-text search query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive substring matched against title, author, ISBN and year
    pub query: String,
}

/// Equality criteria for listing books. Both absent means every book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub author: Option<String>,
    pub year: Option<i32>,
}

impl BookFilter {
    /// An empty author and a zero year count as "not supplied".
    pub fn new(author: Option<String>, year: Option<i32>) -> Self {
        Self {
            author: author.filter(|a| !a.is_empty()),
            year: year.filter(|y| *y != 0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.year.is_none()
    }

    pub fn accepts(&self, book: &Book) -> bool {
        self.author.as_ref().map_or(true, |a| &book.author == a)
            && self.year.map_or(true, |y| book.year == y)
    }
}
