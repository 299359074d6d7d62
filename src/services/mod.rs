//! Business logic services

pub mod books;
pub mod health;

use std::sync::Arc;

use crate::repository::BookStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub health: health::HealthService,
}

impl Services {
    /// Create all services on top of the given book store
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self {
            books: books::BooksService::new(store.clone()),
            health: health::HealthService::new(store),
        }
    }
}
