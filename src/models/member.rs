//! Member model, reputation tiers and related types

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const MIN_REPUTATION: i64 = 0;
pub const MAX_REPUTATION: i64 = 100;
pub const DEFAULT_REPUTATION: i64 = 100;

/// Keep a reputation score inside [MIN_REPUTATION, MAX_REPUTATION]
pub fn clamp_reputation(value: i64) -> i64 {
    value.clamp(MIN_REPUTATION, MAX_REPUTATION)
}

/// Lending terms bucket derived from a reputation score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReputationTier {
    High,
    Middle,
    Low,
}

impl ReputationTier {
    pub fn for_reputation(reputation: i64) -> Self {
        match reputation {
            r if r >= 80 => ReputationTier::High,
            r if r >= 50 => ReputationTier::Middle,
            _ => ReputationTier::Low,
        }
    }

    /// Maximum number of concurrently open loans
    pub fn max_loans(&self) -> i64 {
        match self {
            ReputationTier::High => 10,
            ReputationTier::Middle => 5,
            ReputationTier::Low => 2,
        }
    }

    /// Loan length in days
    pub fn loan_days(&self) -> i64 {
        match self {
            ReputationTier::High => 14,
            ReputationTier::Middle => 7,
            ReputationTier::Low => 3,
        }
    }

    pub fn loan_duration(&self) -> Duration {
        Duration::days(self.loan_days())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReputationTier::High => "high",
            ReputationTier::Middle => "middle",
            ReputationTier::Low => "low",
        }
    }
}

impl fmt::Display for ReputationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Member model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: i64,
    pub name: String,
    /// Accumulated late-return debt
    pub penalty: i64,
    pub reputation: i64,
}

impl Member {
    pub fn tier(&self) -> ReputationTier {
        ReputationTier::for_reputation(self.reputation)
    }

    pub fn max_books(&self) -> i64 {
        self.tier().max_loans()
    }

    pub fn return_days(&self) -> i64 {
        self.tier().loan_days()
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Name: {}, Penalty: {}, Reputation: {} ({}), Book limit: {}, Loan days: {}",
            self.id,
            self.name,
            self.penalty,
            self.reputation,
            self.tier(),
            self.max_books(),
            self.return_days()
        )
    }
}

/// Register member request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMember {
    pub id: i64,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

/// Partial member update; unset fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMember {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(range(min = 0, max = 100, message = "Reputation must be between 0 and 100"))]
    pub reputation: Option<i64>,
}

impl UpdateMember {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.reputation.is_none()
    }
}

/// Member search filters; every set filter must match
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberQuery {
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    pub id: Option<i64>,
}
