//! Members repository for database operations

use sqlx::{Executor, Pool, QueryBuilder, Sqlite};

use super::books::non_blank;
use crate::{
    error::{AppError, AppResult, Entity},
    models::member::{CreateMember, Member, MemberQuery, UpdateMember, DEFAULT_REPUTATION},
};

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Sqlite>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get member by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Member> {
        Self::find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Member, id))
    }

    /// Check if a member exists
    pub async fn exists(&self, id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM members WHERE id = ?)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Insert a new member with a clean record
    pub async fn create(&self, member: &CreateMember) -> AppResult<Member> {
        sqlx::query("INSERT INTO members (id, name, penalty, reputation) VALUES (?, ?, 0, ?)")
            .bind(member.id)
            .bind(&member.name)
            .bind(DEFAULT_REPUTATION)
            .execute(&self.pool)
            .await?;

        self.get_by_id(member.id).await
    }

    /// Apply a partial update, leaving unset fields untouched
    pub async fn update(&self, id: i64, patch: &UpdateMember) -> AppResult<Member> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET name = COALESCE(?, name),
                reputation = COALESCE(?, reputation)
            WHERE id = ?
            "#,
        )
        .bind(&patch.name)
        .bind(patch.reputation)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(Entity::Member, id));
        }

        self.get_by_id(id).await
    }

    /// Delete a member together with their closed loan history
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(Entity::Member, id));
        }
        Ok(())
    }

    /// Search members, oldest registration first
    pub async fn search(&self, query: &MemberQuery) -> AppResult<Vec<Member>> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, name, penalty, reputation FROM members WHERE 1 = 1",
        );

        if let Some(name) = non_blank(&query.name) {
            builder
                .push(" AND instr(LOWER(name), LOWER(")
                .push_bind(name)
                .push(")) > 0");
        }

        if let Some(id) = query.id {
            builder.push(" AND id = ").push_bind(id);
        }

        builder.push(" ORDER BY seq");

        let members = builder
            .build_query_as::<Member>()
            .fetch_all(&self.pool)
            .await?;

        Ok(members)
    }

    /// Find a member on any executor (pool or open transaction)
    pub async fn find<'e, E>(executor: E, id: i64) -> AppResult<Option<Member>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let member = sqlx::query_as::<_, Member>(
            "SELECT id, name, penalty, reputation FROM members WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(member)
    }

    /// Overwrite the penalty and reputation of a member
    pub async fn set_standing<'e, E>(
        executor: E,
        id: i64,
        penalty: i64,
        reputation: i64,
    ) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE members SET penalty = ?, reputation = ? WHERE id = ?")
            .bind(penalty)
            .bind(reputation)
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(Entity::Member, id));
        }
        Ok(())
    }
}
