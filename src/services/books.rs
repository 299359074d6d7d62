//! Book catalog service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, CreateBook, UpdateBook},
    repository::BookStore,
};

#[derive(Clone)]
pub struct BooksService {
    store: Arc<dyn BookStore>,
}

impl BooksService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = self.store.list().await?;
        tracing::debug!(count = books.len(), "Listed books");
        Ok(books)
    }

    pub async fn get(&self, id: i32) -> AppResult<Book> {
        self.store.get_by_id(id).await
    }

    /// Validate and insert a new book, rejecting duplicate ISBNs
    pub async fn create(&self, data: CreateBook) -> AppResult<Book> {
        let book = data.validated().inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected book creation");
        })?;

        if self.store.isbn_exists(&book.isbn, None).await? {
            tracing::warn!(isbn = %book.isbn, "ISBN already exists");
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                book.isbn
            )));
        }

        let created = self.store.create(&book).await?;
        tracing::info!(book_id = created.id, title = %created.title, "Created book");
        Ok(created)
    }

    /// Apply a partial update.
    ///
    /// The ISBN uniqueness check only runs when the ISBN actually changes.
    pub async fn update(&self, id: i32, data: UpdateBook) -> AppResult<Book> {
        let changes = data.validated().inspect_err(|e| {
            tracing::warn!(book_id = id, error = %e, "Rejected book update");
        })?;

        let current = self.store.get_by_id(id).await?;

        if let Some(ref isbn) = changes.isbn {
            if *isbn != current.isbn && self.store.isbn_exists(isbn, Some(id)).await? {
                tracing::warn!(book_id = id, isbn = %isbn, "ISBN conflict on update");
                return Err(AppError::Conflict(format!(
                    "Another book with ISBN {} already exists",
                    isbn
                )));
            }
        }

        let updated = self.store.update(id, &changes).await?;
        tracing::info!(book_id = id, "Updated book");
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.store.delete(id).await?;
        tracing::info!(book_id = id, "Deleted book");
        Ok(())
    }
}
