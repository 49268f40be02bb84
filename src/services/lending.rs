//! Lending service: borrowing and returning books under the reputation policy

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use super::policy::LendingPolicy;
use crate::{
    clock::Clock,
    config::LendingConfig,
    error::{AppError, AppResult, Entity},
    models::loan::{Loan, NewLoan, ReturnReceipt},
    repository::{books::BooksRepository, loans::LoansRepository, members::MembersRepository, Repository},
};

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    policy: LendingPolicy,
    clock: Arc<dyn Clock>,
}

impl LendingService {
    pub fn new(repository: Repository, config: LendingConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            policy: LendingPolicy::new(config),
            clock,
        }
    }

    /// Current time as seen by the lending engine
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Lend one copy of a book to a member.
    ///
    /// Checks run in order and the first failure wins: member exists, book
    /// exists, a copy is on the shelf, the member is below their tier cap.
    pub async fn borrow_book(&self, member_id: i64, book_id: i64) -> AppResult<Loan> {
        let mut tx = self.repository.begin().await?;

        let member = MembersRepository::find(&mut *tx, member_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Member, member_id))?;

        let book = BooksRepository::find(&mut *tx, book_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Book, book_id))?;

        if !book.is_available() {
            return Err(AppError::Unavailable { book: book_id });
        }

        let tier = member.tier();
        let open = LoansRepository::count_open(&mut *tx, member_id).await?;
        if !self.policy.may_borrow(tier, open) {
            return Err(AppError::LimitExceeded {
                member: member_id,
                open,
                cap: tier.max_loans(),
            });
        }

        let borrowed_at = self.clock.now();
        let new_loan = NewLoan {
            member_id,
            book_id,
            borrowed_at,
            due_at: self.policy.due_date(tier, borrowed_at),
        };

        BooksRepository::adjust_copies(&mut *tx, book_id, -1).await?;
        let loan = LoansRepository::insert(&mut *tx, &new_loan).await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = loan.id,
            member_id,
            book_id,
            tier = %tier,
            due_at = %loan.due_at,
            "book borrowed"
        );

        Ok(loan)
    }

    /// Take a book back from a member and settle penalty and reputation.
    ///
    /// `returned_at` defaults to now. The loan, the book and the member are
    /// updated together or not at all.
    pub async fn return_book(
        &self,
        member_id: i64,
        book_id: i64,
        returned_at: Option<DateTime<Utc>>,
    ) -> AppResult<ReturnReceipt> {
        self.settle_return(member_id, book_id, |_| {
            returned_at.unwrap_or_else(|| self.clock.now())
        })
        .await
    }

    /// Take a book back on a calendar day.
    ///
    /// The day is taken at the due time of day, so a return on the due date
    /// is on time and lateness counts calendar days.
    pub async fn return_book_on(
        &self,
        member_id: i64,
        book_id: i64,
        returned_on: NaiveDate,
    ) -> AppResult<ReturnReceipt> {
        self.settle_return(member_id, book_id, |loan| {
            returned_on.and_time(loan.due_at.time()).and_utc()
        })
        .await
    }

    async fn settle_return<F>(
        &self,
        member_id: i64,
        book_id: i64,
        returned_at: F,
    ) -> AppResult<ReturnReceipt>
    where
        F: FnOnce(&Loan) -> DateTime<Utc>,
    {
        let mut tx = self.repository.begin().await?;

        let mut loan = LoansRepository::find_open(&mut *tx, member_id, book_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(Entity::Loan, format!("member {} / book {}", member_id, book_id))
            })?;

        let member = MembersRepository::find(&mut *tx, member_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Member, member_id))?;

        let returned_at = returned_at(&loan);
        if returned_at < loan.borrowed_at {
            return Err(AppError::Validation(format!(
                "Return date {} is before the borrow date {}",
                returned_at, loan.borrowed_at
            )));
        }

        LoansRepository::close(&mut *tx, loan.id, returned_at).await?;
        BooksRepository::adjust_copies(&mut *tx, book_id, 1).await?;

        let assessment = self.policy.assess_return(&member, &loan, returned_at);
        MembersRepository::set_standing(
            &mut *tx,
            member_id,
            assessment.penalty_total,
            assessment.reputation,
        )
        .await?;

        tx.commit().await?;

        loan.returned_at = Some(returned_at);

        tracing::info!(
            loan_id = loan.id,
            member_id,
            book_id,
            overdue_days = assessment.overdue_days,
            penalty = assessment.penalty_total,
            reputation = assessment.reputation,
            "book returned"
        );

        Ok(ReturnReceipt {
            loan,
            overdue_days: assessment.overdue_days,
            penalty_accrued: assessment.penalty_accrued,
            penalty_total: assessment.penalty_total,
            reputation: assessment.reputation,
        })
    }

    /// Number of loans the member has not returned yet
    pub async fn open_loan_count(&self, member_id: i64) -> AppResult<i64> {
        self.repository.members.get_by_id(member_id).await?;
        LoansRepository::count_open(&self.repository.pool, member_id).await
    }

    /// Loans the member has not returned yet
    pub async fn list_open_loans(&self, member_id: i64) -> AppResult<Vec<Loan>> {
        self.repository.members.get_by_id(member_id).await?;
        self.repository.loans.list_open(member_id).await
    }

    /// Full loan history of a member
    pub async fn list_loans(&self, member_id: i64) -> AppResult<Vec<Loan>> {
        self.repository.members.get_by_id(member_id).await?;
        self.repository.loans.list_for_member(member_id).await
    }
}
