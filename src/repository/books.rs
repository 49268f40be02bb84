//! Books repository for database operations

use sqlx::{Executor, Pool, QueryBuilder, Sqlite};

use crate::{
    error::{AppError, AppResult, Entity},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

const BOOK_COLUMNS: &str = "id, title, author, copies";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        Self::find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Book, id))
    }

    /// Check if a book exists
    pub async fn exists(&self, id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Insert a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        sqlx::query("INSERT INTO books (id, title, author, copies) VALUES (?, ?, ?, ?)")
            .bind(book.id)
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.copies)
            .execute(&self.pool)
            .await?;

        self.get_by_id(book.id).await
    }

    /// Apply a partial update, leaving unset fields untouched
    pub async fn update(&self, id: i64, patch: &UpdateBook) -> AppResult<Book> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = COALESCE(?, title),
                author = COALESCE(?, author),
                copies = COALESCE(?, copies)
            WHERE id = ?
            "#,
        )
        .bind(&patch.title)
        .bind(&patch.author)
        .bind(patch.copies)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(Entity::Book, id));
        }

        self.get_by_id(id).await
    }

    /// Delete a book
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(Entity::Book, id));
        }
        Ok(())
    }

    /// Search books, oldest first
    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM books WHERE 1 = 1",
            BOOK_COLUMNS
        ));

        if let Some(title) = non_blank(&query.title) {
            builder
                .push(" AND instr(LOWER(title), LOWER(")
                .push_bind(title)
                .push(")) > 0");
        }

        if let Some(author) = non_blank(&query.author) {
            builder
                .push(" AND instr(LOWER(author), LOWER(")
                .push_bind(author)
                .push(")) > 0");
        }

        if let Some(id) = query.id {
            builder.push(" AND id = ").push_bind(id);
        }

        builder.push(" ORDER BY seq");

        let books = builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Find a book on any executor (pool or open transaction)
    pub async fn find<'e, E>(executor: E, id: i64) -> AppResult<Option<Book>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, copies FROM books WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(book)
    }

    /// Shift the shelf count of a book by `delta`
    pub async fn adjust_copies<'e, E>(executor: E, id: i64, delta: i64) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE books SET copies = copies + ? WHERE id = ?")
            .bind(delta)
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(Entity::Book, id));
        }
        Ok(())
    }
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
