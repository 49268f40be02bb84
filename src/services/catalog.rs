//! Catalog management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult, Entity},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Add a book under a caller-chosen ID
    pub async fn add_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;

        if self.repository.books.exists(book.id).await? {
            return Err(AppError::Conflict(format!("Book with id {} already exists", book.id)));
        }

        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, copies = created.copies, "book added");
        Ok(created)
    }

    /// Update the fields set in `patch`
    pub async fn update_book(&self, id: i64, patch: UpdateBook) -> AppResult<Book> {
        patch.validate()?;

        if patch.is_empty() {
            return self.repository.books.get_by_id(id).await;
        }

        let updated = self.repository.books.update(id, &patch).await?;
        tracing::info!(book_id = id, "book updated");
        Ok(updated)
    }

    /// Remove a book that nobody currently holds
    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        if !self.repository.books.exists(id).await? {
            return Err(AppError::not_found(Entity::Book, id));
        }

        if self.repository.loans.count_open_for_book(id).await? > 0 {
            return Err(AppError::HasOpenLoans {
                entity: Entity::Book,
                key: id.to_string(),
            });
        }

        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "book deleted");
        Ok(())
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn book_exists(&self, id: i64) -> AppResult<bool> {
        self.repository.books.exists(id).await
    }

    /// Search books; no filters returns the whole catalog in insertion order
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.search(query).await
    }
}
