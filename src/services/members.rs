//! Member management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult, Entity},
    models::member::{CreateMember, Member, MemberQuery, UpdateMember},
    repository::{loans::LoansRepository, Repository},
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
}

impl MembersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a member with no penalty and full reputation
    pub async fn register_member(&self, member: CreateMember) -> AppResult<Member> {
        member.validate()?;

        if self.repository.members.exists(member.id).await? {
            return Err(AppError::Conflict(format!(
                "Member with id {} already exists",
                member.id
            )));
        }

        let created = self.repository.members.create(&member).await?;
        tracing::info!(member_id = created.id, "member registered");
        Ok(created)
    }

    /// Update the fields set in `patch`
    pub async fn update_member(&self, id: i64, patch: UpdateMember) -> AppResult<Member> {
        patch.validate()?;

        if patch.is_empty() {
            return self.repository.members.get_by_id(id).await;
        }

        let updated = self.repository.members.update(id, &patch).await?;
        tracing::info!(member_id = id, reputation = updated.reputation, "member updated");
        Ok(updated)
    }

    /// Remove a member who has returned everything
    pub async fn delete_member(&self, id: i64) -> AppResult<()> {
        if !self.repository.members.exists(id).await? {
            return Err(AppError::not_found(Entity::Member, id));
        }

        if LoansRepository::count_open(&self.repository.pool, id).await? > 0 {
            return Err(AppError::HasOpenLoans {
                entity: Entity::Member,
                key: id.to_string(),
            });
        }

        self.repository.members.delete(id).await?;
        tracing::info!(member_id = id, "member deleted");
        Ok(())
    }

    /// Get member by ID
    pub async fn get_member(&self, id: i64) -> AppResult<Member> {
        self.repository.members.get_by_id(id).await
    }

    pub async fn member_exists(&self, id: i64) -> AppResult<bool> {
        self.repository.members.exists(id).await
    }

    /// Search members by name substring and/or exact ID
    pub async fn search_members(&self, query: &MemberQuery) -> AppResult<Vec<Member>> {
        self.repository.members.search(query).await
    }
}
