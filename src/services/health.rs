//! Health reporter

use std::sync::Arc;

use crate::{error::AppResult, repository::BookStore};

#[derive(Clone)]
pub struct HealthService {
    store: Arc<dyn BookStore>,
}

impl HealthService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Probe the database; every call is a fresh round-trip
    pub async fn check_database(&self) -> AppResult<()> {
        self.store.ping().await
    }
}
