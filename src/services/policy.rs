//! Lending policy arithmetic: loan terms at borrow time, penalties and
//! reputation at return time. Pure functions, no store access.

use chrono::{DateTime, Utc};

use crate::{
    config::{LendingConfig, PenaltyMode},
    models::{
        loan::Loan,
        member::{clamp_reputation, Member, ReputationTier},
    },
};

/// Member standing after a return is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnAssessment {
    pub overdue_days: i64,
    pub penalty_accrued: i64,
    pub penalty_total: i64,
    pub reputation: i64,
}

#[derive(Debug, Clone)]
pub struct LendingPolicy {
    config: LendingConfig,
}

impl LendingPolicy {
    pub fn new(config: LendingConfig) -> Self {
        Self { config }
    }

    /// Due date of a loan opened at `borrowed_at` by a member of `tier`
    pub fn due_date(&self, tier: ReputationTier, borrowed_at: DateTime<Utc>) -> DateTime<Utc> {
        borrowed_at + tier.loan_duration()
    }

    /// Whether a member with `open_loans` may open one more
    pub fn may_borrow(&self, tier: ReputationTier, open_loans: i64) -> bool {
        open_loans < tier.max_loans()
    }

    /// Settle a return made at `returned_at`.
    ///
    /// A return strictly after the due date accrues `penalty_per_day` per whole
    /// overdue day and costs reputation: the whole accumulated penalty in
    /// cumulative mode, only this return's accrual in incremental mode. Any
    /// other return earns `on_time_bonus`. Reputation is clamped to 0..=100.
    pub fn assess_return(
        &self,
        member: &Member,
        loan: &Loan,
        returned_at: DateTime<Utc>,
    ) -> ReturnAssessment {
        if returned_at > loan.due_at {
            let overdue_days = (returned_at - loan.due_at).num_days();
            let penalty_accrued = overdue_days * self.config.penalty_per_day;
            let penalty_total = member.penalty + penalty_accrued;
            let deduction = match self.config.penalty_mode {
                PenaltyMode::Cumulative => penalty_total,
                PenaltyMode::Incremental => penalty_accrued,
            };

            ReturnAssessment {
                overdue_days,
                penalty_accrued,
                penalty_total,
                reputation: clamp_reputation(member.reputation - deduction),
            }
        } else {
            ReturnAssessment {
                overdue_days: 0,
                penalty_accrued: 0,
                penalty_total: member.penalty,
                reputation: clamp_reputation(member.reputation + self.config.on_time_bonus),
            }
        }
    }
}
