//! Book model and request validation

use std::borrow::Cow;

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, AppResult, FieldError};

/// Earliest accepted publication year (movable type printing)
pub const MIN_PUBLISHED_YEAR: i32 = 1450;

/// ISBN-10 (last char may be X) or ISBN-13, separators already stripped
static ISBN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{9}[\dX]|\d{13})$").expect("valid ISBN pattern"));

/// Book record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    /// Canonical ISBN (no separators)
    pub isbn: String,
    pub published_year: Option<i32>,
}

/// Create book request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[schema(required = true, max_length = 200)]
    #[validate(
        required(message = "title is required"),
        custom(function = "not_blank", message = "title must not be blank"),
        length(max = 200, message = "title must be at most 200 characters")
    )]
    pub title: Option<String>,
    #[schema(required = true, max_length = 100)]
    #[validate(
        required(message = "author is required"),
        custom(function = "not_blank", message = "author must not be blank"),
        length(max = 100, message = "author must be at most 100 characters")
    )]
    pub author: Option<String>,
    /// ISBN-10 or ISBN-13; hyphens and spaces are accepted
    #[schema(required = true)]
    #[validate(
        required(message = "isbn is required"),
        custom(function = "isbn_format", message = "isbn must be a 10 or 13 digit ISBN")
    )]
    pub isbn: Option<String>,
    #[validate(custom(function = "published_year_in_range"))]
    pub published_year: Option<i32>,
}

/// Update book request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    /// Cannot be `null`; omit the key to keep the current title
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(max_length = 200)]
    #[validate(
        custom(function = "not_blank", message = "title must not be blank"),
        length(max = 200, message = "title must be at most 200 characters")
    )]
    pub title: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(max_length = 100)]
    #[validate(
        custom(function = "not_blank", message = "author must not be blank"),
        length(max = 100, message = "author must be at most 100 characters")
    )]
    pub author: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(custom(function = "isbn_format", message = "isbn must be a 10 or 13 digit ISBN"))]
    pub isbn: Option<Option<String>>,
    /// `null` clears the year, an absent key keeps it
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub published_year: Option<Option<i32>>,
}

/// Validated, normalized record ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub published_year: Option<i32>,
}

/// Validated, normalized set of changes for an existing book
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<Option<i32>>,
}

impl CreateBook {
    /// Check every rule and produce a normalized record
    pub fn validated(self) -> AppResult<NewBook> {
        // Limits apply to what gets stored, so trim before checking
        let book = CreateBook {
            title: trimmed(self.title),
            author: trimmed(self.author),
            isbn: trimmed(self.isbn),
            published_year: self.published_year,
        };
        book.validate()
            .map_err(|e| AppError::Validation(field_errors(&e, Vec::new())))?;

        let (Some(title), Some(author), Some(isbn)) = (book.title, book.author, book.isbn) else {
            return Err(AppError::Internal(
                "required book fields missing after validation".to_string(),
            ));
        };

        Ok(NewBook {
            title,
            author,
            isbn: canonical_isbn(&isbn),
            published_year: book.published_year,
        })
    }
}

impl UpdateBook {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.isbn.is_none()
            && self.published_year.is_none()
    }

    /// Check the supplied fields and produce normalized changes
    pub fn validated(self) -> AppResult<BookChanges> {
        if self.is_empty() {
            return Err(AppError::BadRequest(
                "Request body contains no fields to update".to_string(),
            ));
        }

        let update = UpdateBook {
            title: self.title.map(trimmed),
            author: self.author.map(trimmed),
            isbn: self.isbn.map(trimmed),
            published_year: self.published_year,
        };

        let mut extra = Vec::new();
        for (field, value) in [
            ("title", &update.title),
            ("author", &update.author),
            ("isbn", &update.isbn),
        ] {
            if matches!(value, Some(None)) {
                extra.push(FieldError::new(field, format!("{} must not be null", field)));
            }
        }
        if let Some(Some(year)) = update.published_year {
            if let Err(e) = published_year_in_range(year) {
                extra.push(to_field_error("published_year", &e));
            }
        }

        match update.validate() {
            Ok(()) if extra.is_empty() => {}
            Ok(()) => {
                return Err(AppError::Validation(field_errors(
                    &ValidationErrors::new(),
                    extra,
                )))
            }
            Err(e) => return Err(AppError::Validation(field_errors(&e, extra))),
        }

        Ok(BookChanges {
            title: update.title.flatten(),
            author: update.author.flatten(),
            isbn: update.isbn.flatten().as_deref().map(canonical_isbn),
            published_year: update.published_year,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// Strip separators and upper-case the ISBN-10 check character
pub fn canonical_isbn(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn isbn_format(value: &str) -> Result<(), ValidationError> {
    if !ISBN_RE.is_match(&canonical_isbn(value)) {
        return Err(ValidationError::new("isbn"));
    }
    Ok(())
}

fn published_year_in_range(year: i32) -> Result<(), ValidationError> {
    let current = Utc::now().year();
    if !(MIN_PUBLISHED_YEAR..=current).contains(&year) {
        return Err(ValidationError::new("range").with_message(Cow::Owned(format!(
            "published_year must be between {} and {}",
            MIN_PUBLISHED_YEAR, current
        ))));
    }
    Ok(())
}

fn to_field_error(field: &str, error: &ValidationError) -> FieldError {
    let message = error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("{} is invalid", field));
    FieldError::new(field, message)
}

/// Flatten validator output into field errors ordered by field name
fn field_errors(errors: &ValidationErrors, mut extra: Vec<FieldError>) -> Vec<FieldError> {
    for (field, errs) in errors.field_errors() {
        let field = field.to_string();
        extra.extend(errs.iter().map(|e| to_field_error(&field, e)));
    }
    extra.sort_by(|a, b| a.field.cmp(&b.field));
    extra
}
