//! Repository layer for database operations

pub mod books;

use std::{str::FromStr, time::Duration};

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Pool, Postgres,
};

use crate::config::DatabaseConfig;

pub use books::{BookStore, BooksRepository};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: BooksRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: BooksRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create the `books` table when it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id             SERIAL PRIMARY KEY,
                title          VARCHAR(200) NOT NULL,
                author         VARCHAR(100) NOT NULL,
                isbn           VARCHAR(20)  NOT NULL UNIQUE,
                published_year INTEGER NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Open a bounded connection pool; every connection carries a statement timeout
pub async fn connect(config: &DatabaseConfig) -> Result<Pool<Postgres>, sqlx::Error> {
    let options = PgConnectOptions::from_str(&config.url)?
        .options([("statement_timeout", config.statement_timeout_ms.to_string())]);

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(options)
        .await
}
