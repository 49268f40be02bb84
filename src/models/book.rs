//! Book model and related types

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Copies currently on the shelf
    pub copies: i64,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.copies > 0
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Title: {}, Author: {}, Copies: {}",
            self.id, self.title, self.author, self.copies
        )
    }
}

/// Add book request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBook {
    pub id: i64,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(range(min = 0, message = "Copies cannot be negative"))]
    pub copies: i64,
}

/// Partial book update; unset fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author cannot be empty"))]
    pub author: Option<String>,
    #[validate(range(min = 0, message = "Copies cannot be negative"))]
    pub copies: Option<i64>,
}

impl UpdateBook {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.copies.is_none()
    }
}

/// Book search filters; every set filter must match
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Case-insensitive substring of the author
    pub author: Option<String>,
    pub id: Option<i64>,
}
