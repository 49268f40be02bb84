//! Library lending desk
//!
//! Tracks books, members and loans in an embedded SQLite store and applies
//! a reputation-based lending policy: borrowing caps and loan lengths come
//! from the member's reputation tier, late returns accrue penalties and cost
//! reputation, on-time returns earn it back.

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod shell;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
