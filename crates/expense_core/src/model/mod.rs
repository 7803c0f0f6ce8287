//! Domain model for tracked expenses and the reports that group them.
//!
//! # Responsibility
//! - Define the records shared by every storage backend.
//! - Own value-level validation so backends stay format-only.
//!
//! # Invariants
//! - Every expense is identified by a caller-assigned `ExpenseId`, every
//!   report by a caller-assigned `ReportId`.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod expense;
pub mod report;
