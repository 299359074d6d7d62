//! In-memory store and request helpers for router tests

use std::{collections::BTreeMap, sync::Arc, sync::Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    api,
    config::AppConfig,
    error::{AppError, AppResult},
    models::book::{Book, BookChanges, NewBook},
    repository::BookStore,
    services::Services,
    AppState,
};

/// Book store backed by a map; enforces ISBN uniqueness like the table constraint
#[derive(Default)]
pub struct MemoryBookStore {
    rows: Mutex<BTreeMap<i32, Book>>,
    next_id: Mutex<i32>,
}

impl MemoryBookStore {
    fn duplicate(rows: &BTreeMap<i32, Book>, isbn: &str, exclude_id: Option<i32>) -> bool {
        rows.values()
            .any(|b| b.isbn == isbn && Some(b.id) != exclude_id)
    }
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn list(&self) -> AppResult<Vec<Book>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        Ok(Self::duplicate(&self.rows.lock().unwrap(), isbn, exclude_id))
    }

    async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let mut rows = self.rows.lock().unwrap();
        if Self::duplicate(&rows, &book.isbn, None) {
            return Err(AppError::Conflict("duplicate isbn".to_string()));
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let created = Book {
            id: *next_id,
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            published_year: book.published_year,
        };
        rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, changes: &BookChanges) -> AppResult<Book> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(ref isbn) = changes.isbn {
            if Self::duplicate(&rows, isbn, Some(id)) {
                return Err(AppError::Conflict("duplicate isbn".to_string()));
            }
        }

        let book = rows.get_mut(&id).ok_or_else(|| not_found(id))?;
        if let Some(ref title) = changes.title {
            book.title = title.clone();
        }
        if let Some(ref author) = changes.author {
            book.author = author.clone();
        }
        if let Some(ref isbn) = changes.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(year) = changes.published_year {
            book.published_year = year;
        }
        Ok(book.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        self.rows
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Full application router over the given store
pub fn test_app(store: Arc<dyn BookStore>) -> Router {
    api::create_router(AppState {
        config: Arc::new(AppConfig::default()),
        services: Arc::new(Services::new(store)),
    })
}

/// Send a request with an optional JSON body and decode the JSON response
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    match body {
        Some(json) => send_raw(app, method, uri, &json.to_string()).await,
        None => dispatch(app, Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()).await,
    }
}

/// Send a raw (possibly malformed) JSON body
pub async fn send_raw(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    dispatch(app, request).await
}

async fn dispatch(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
