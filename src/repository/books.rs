//! PostgreSQL book repository

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use super::{BookRepository, RepositoryError, RepositoryResult};
use crate::{
    config::DatabaseConfig,
    models::book::{Book, BookCreate, BookFilter, BookUpdate},
};

const COLUMNS: &str = "id, title, author, year, isbn";

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Build an ILIKE pattern matching `query` as a literal substring.
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Map a unique violation on `books.isbn` to `DuplicateKey`
fn duplicate_or_database(err: sqlx::Error, isbn: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db) = err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return RepositoryError::DuplicateKey {
                isbn: isbn.to_string(),
            };
        }
    }
    RepositoryError::Database(err)
}

#[derive(Clone)]
pub struct PgBookRepository {
    pool: Pool<Postgres>,
}

impl PgBookRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Open a connection pool from explicit settings
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create the `books` table when it does not exist yet
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id     SERIAL PRIMARY KEY,
                title  VARCHAR NOT NULL,
                author VARCHAR NOT NULL,
                year   INTEGER NOT NULL,
                isbn   VARCHAR NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn add(&self, book: &BookCreate) -> RepositoryResult<Book> {
        // Rolled back on drop if any step below fails
        let mut tx = self.pool.begin().await?;

        let existing: Option<i32> = sqlx::query_scalar("SELECT id FROM books WHERE isbn = $1")
            .bind(&book.isbn)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(RepositoryError::DuplicateKey {
                isbn: book.isbn.clone(),
            });
        }

        let query = format!(
            "INSERT INTO books (title, author, year, isbn) VALUES ($1, $2, $3, $4) RETURNING {}",
            COLUMNS
        );
        let created = sqlx::query_as::<_, Book>(&query)
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.year)
            .bind(&book.isbn)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| duplicate_or_database(e, &book.isbn))?;

        tx.commit().await?;
        Ok(created)
    }

    async fn get_by_id(&self, id: i32) -> RepositoryResult<Option<Book>> {
        let query = format!("SELECT {} FROM books WHERE id = $1", COLUMNS);
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn get_by_author_or_year(&self, filter: &BookFilter) -> RepositoryResult<Vec<Book>> {
        let mut conditions = vec!["TRUE".to_string()];
        let mut idx = 1;

        if filter.author.is_some() {
            conditions.push(format!("author = ${}", idx));
            idx += 1;
        }
        if filter.year.is_some() {
            conditions.push(format!("year = ${}", idx));
        }

        let query = format!(
            "SELECT {} FROM books WHERE {} ORDER BY id",
            COLUMNS,
            conditions.join(" AND ")
        );

        let mut builder = sqlx::query_as::<_, Book>(&query);
        if let Some(ref author) = filter.author {
            builder = builder.bind(author);
        }
        if let Some(year) = filter.year {
            builder = builder.bind(year);
        }

        Ok(builder.fetch_all(&self.pool).await?)
    }

    async fn search(&self, query: &str) -> RepositoryResult<Vec<Book>> {
        let sql = format!(
            r#"
            SELECT {} FROM books
            WHERE title ILIKE $1
               OR author ILIKE $1
               OR isbn ILIKE $1
               OR CAST(year AS TEXT) ILIKE $1
            ORDER BY id
            "#,
            COLUMNS
        );
        let rows = sqlx::query_as::<_, Book>(&sql)
            .bind(like_pattern(query))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update(&self, book: &Book, updates: &BookUpdate) -> RepositoryResult<Option<Book>> {
        if updates.is_empty() {
            return self.get_by_id(book.id).await;
        }

        let mut sets = Vec::new();
        let mut idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(updates.title, "title");
        add_field!(updates.author, "author");
        add_field!(updates.year, "year");
        add_field!(updates.isbn, "isbn");

        let query = format!(
            "UPDATE books SET {} WHERE id = ${} RETURNING {}",
            sets.join(", "),
            idx,
            COLUMNS
        );

        let mut builder = sqlx::query_as::<_, Book>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(updates.title);
        bind_field!(updates.author);
        bind_field!(updates.year);
        bind_field!(updates.isbn);

        let isbn = updates.isbn.as_deref().unwrap_or(&book.isbn);
        builder
            .bind(book.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| duplicate_or_database(e, isbn))
    }

    async fn delete(&self, book: &Book) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book.id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DeleteFailure {
                id: book.id,
                source: Box::new(e),
            })?;

        if result.rows_affected() != 1 {
            return Err(RepositoryError::DeleteFailure {
                id: book.id,
                source: format!("{} rows matched", result.rows_affected()).into(),
            });
        }
        Ok(())
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Book>> {
        let query = format!("SELECT {} FROM books ORDER BY id", COLUMNS);
        let rows = sqlx::query_as::<_, Book>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
