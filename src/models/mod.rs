//! Data models for the library catalog

pub mod book;

// Re-export commonly used types
pub use book::{Book, BookCreate, BookFilter, BookQuery, BookUpdate, SearchQuery};
