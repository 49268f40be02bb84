//! Loans repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Executor, Pool, Sqlite};

use crate::{
    error::{AppError, AppResult, Entity},
    models::loan::{Loan, NewLoan},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Sqlite>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            r#"
            SELECT id, member_id, book_id, borrowed_at, due_at, returned_at
            FROM loans WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found(Entity::Loan, id))
    }

    /// Open loans of a member, oldest first
    pub async fn list_open(&self, member_id: i64) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT id, member_id, book_id, borrowed_at, due_at, returned_at
            FROM loans
            WHERE member_id = ? AND returned_at IS NULL
            ORDER BY id
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Every loan of a member, open or closed, oldest first
    pub async fn list_for_member(&self, member_id: i64) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT id, member_id, book_id, borrowed_at, due_at, returned_at
            FROM loans
            WHERE member_id = ?
            ORDER BY id
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Count open loans referencing a book
    pub async fn count_open_for_book(&self, book_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE book_id = ? AND returned_at IS NULL",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Count open loans of a member
    pub async fn count_open<'e, E>(executor: E, member_id: i64) -> AppResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE member_id = ? AND returned_at IS NULL",
        )
        .bind(member_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    /// Oldest open loan of `book_id` held by `member_id`
    pub async fn find_open<'e, E>(
        executor: E,
        member_id: i64,
        book_id: i64,
    ) -> AppResult<Option<Loan>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            SELECT id, member_id, book_id, borrowed_at, due_at, returned_at
            FROM loans
            WHERE member_id = ? AND book_id = ? AND returned_at IS NULL
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(member_id)
        .bind(book_id)
        .fetch_optional(executor)
        .await?;

        Ok(loan)
    }

    /// Insert an open loan
    pub async fn insert<'e, E>(executor: E, loan: &NewLoan) -> AppResult<Loan>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO loans (member_id, book_id, borrowed_at, due_at, returned_at)
            VALUES (?, ?, ?, ?, NULL)
            "#,
        )
        .bind(loan.member_id)
        .bind(loan.book_id)
        .bind(loan.borrowed_at)
        .bind(loan.due_at)
        .execute(executor)
        .await?;

        Ok(Loan {
            id: result.last_insert_rowid(),
            member_id: loan.member_id,
            book_id: loan.book_id,
            borrowed_at: loan.borrowed_at,
            due_at: loan.due_at,
            returned_at: None,
        })
    }

    /// Close an open loan; borrow and due dates are left as they are
    pub async fn close<'e, E>(executor: E, id: i64, returned_at: DateTime<Utc>) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE loans SET returned_at = ? WHERE id = ? AND returned_at IS NULL",
        )
        .bind(returned_at)
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(Entity::Loan, id));
        }
        Ok(())
    }
}
