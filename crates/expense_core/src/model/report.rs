//! Report domain model.
//!
//! # Responsibility
//! - Define the titled group that expenses can be filed under.
//! - Validate report labels before persistence.
//!
//! # Invariants
//! - `id` is caller-assigned and immutable.
//! - `title` and `status` are never blank once validated.
//! - An expense belongs to at most one report. Membership is owned by the
//!   report repository, not by `Expense`.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-assigned identifier, unique within one backend's report set.
pub type ReportId = i64;

/// Status given to reports created without one.
pub const DEFAULT_REPORT_STATUS: &str = "DRAFT";

/// A named group of expenses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub id: ReportId,
    pub title: String,
    /// Free-form workflow label such as `DRAFT` or `SUBMITTED`.
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportValidationError {
    BlankTitle { id: ReportId },
    BlankStatus { id: ReportId },
}

impl Display for ReportValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle { id } => write!(f, "report {id}: title cannot be blank"),
            Self::BlankStatus { id } => write!(f, "report {id}: status cannot be blank"),
        }
    }
}

impl Error for ReportValidationError {}

impl Report {
    pub fn new(id: ReportId, title: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            status: status.into(),
        }
    }

    /// Creates a report in [`DEFAULT_REPORT_STATUS`].
    pub fn draft(id: ReportId, title: impl Into<String>) -> Self {
        Self::new(id, title, DEFAULT_REPORT_STATUS)
    }

    pub fn validate(&self) -> Result<(), ReportValidationError> {
        if self.title.trim().is_empty() {
            return Err(ReportValidationError::BlankTitle { id: self.id });
        }
        if self.status.trim().is_empty() {
            return Err(ReportValidationError::BlankStatus { id: self.id });
        }
        Ok(())
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Report [id={}, title={}, status={}]",
            self.id, self.title, self.status
        )
    }
}
