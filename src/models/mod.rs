//! Data models for the lending desk

pub mod book;
pub mod loan;
pub mod member;

// Re-export commonly used types
pub use book::{Book, BookQuery, CreateBook, UpdateBook};
pub use loan::{Loan, NewLoan, ReturnReceipt};
pub use member::{CreateMember, Member, MemberQuery, ReputationTier, UpdateMember};
