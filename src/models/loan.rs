//! Loan (borrow) model and related types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

const DATE_FORMAT: &str = "%d-%m-%Y";

/// Loan model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i64,
    pub member_id: i64,
    pub book_id: i64,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    /// None while the loan is open
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    pub fn is_overdue(&self, at: DateTime<Utc>) -> bool {
        self.is_open() && at > self.due_at
    }
}

impl fmt::Display for Loan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let returned = self
            .returned_at
            .map(|d| format!("returned {}", d.format(DATE_FORMAT)))
            .unwrap_or_else(|| "not returned".to_string());
        write!(
            f,
            "Loan {}: book {}, borrowed {}, due {}, {}",
            self.id,
            self.book_id,
            self.borrowed_at.format(DATE_FORMAT),
            self.due_at.format(DATE_FORMAT),
            returned
        )
    }
}

/// Insert payload for an open loan
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub member_id: i64,
    pub book_id: i64,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

/// Outcome of a committed return
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnReceipt {
    pub loan: Loan,
    /// Whole days past due, zero when on time
    pub overdue_days: i64,
    pub penalty_accrued: i64,
    pub penalty_total: i64,
    pub reputation: i64,
}

impl ReturnReceipt {
    pub fn was_late(&self) -> bool {
        matches!(self.loan.returned_at, Some(returned) if returned > self.loan.due_at)
    }
}
