//! Expense repository contract and shared error type.
//!
//! # Responsibility
//! - Define the capability set every storage backend satisfies.
//! - Classify failures so callers can tell "missing" from "broken".
//!
//! # Invariants
//! - `read_expense` reports a miss as `Ok(None)`.
//! - `delete_expense` on a missing id is a successful no-op.
//! - Repositories never validate values; the service layer does.

use crate::db::DbError;
use crate::model::expense::{Expense, ExpenseId, ExpenseValidationError};
use crate::model::report::{ReportId, ReportValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for expense and report persistence operations.
#[derive(Debug)]
pub enum RepoError {
    /// Expense failed value-level validation.
    Validation(ExpenseValidationError),
    /// Report failed label validation.
    ReportValidation(ReportValidationError),
    /// SQLite failure, including constraint violations.
    Db(DbError),
    /// Backing file could not be read or written.
    Io(std::io::Error),
    /// Delimited-text encoding or decoding failed.
    Csv(csv::Error),
    /// Structured-document encoding or decoding failed.
    Json(serde_json::Error),
    /// `create` targeted an id that is already stored.
    Duplicate(ExpenseId),
    /// `update` targeted an id that is not stored.
    NotFound(ExpenseId),
    /// `create_report` targeted a report id that is already stored.
    DuplicateReport(ReportId),
    /// A report operation or assignment named a report that is not stored.
    ReportNotFound(ReportId),
    /// Persisted data exists but cannot be mapped to an `Expense`.
    InvalidData(String),
    /// Writing a listing to the caller's output failed. Storage is intact.
    Output(std::io::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ReportValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "expense file i/o failed: {err}"),
            Self::Csv(err) => write!(f, "expense csv data is invalid: {err}"),
            Self::Json(err) => write!(f, "expense json data is invalid: {err}"),
            Self::Duplicate(id) => write!(f, "expense already exists: {id}"),
            Self::NotFound(id) => write!(f, "expense not found: {id}"),
            Self::DuplicateReport(id) => write!(f, "report already exists: {id}"),
            Self::ReportNotFound(id) => write!(f, "report not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted expense data: {message}"),
            Self::Output(err) => write!(f, "failed to write expense listing: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::ReportValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Output(err) => Some(err),
            Self::Duplicate(_)
            | Self::NotFound(_)
            | Self::DuplicateReport(_)
            | Self::ReportNotFound(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ExpenseValidationError> for RepoError {
    fn from(value: ExpenseValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ReportValidationError> for RepoError {
    fn from(value: ReportValidationError) -> Self {
        Self::ReportValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for RepoError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Fails with `InvalidData` when `value` is NaN or infinite.
///
/// JSON has no encoding for non-finite numbers, so formats built on it call
/// this before writing instead of persisting a record they cannot read back.
pub(crate) fn require_finite_value(expense: &Expense) -> RepoResult<()> {
    if expense.value.is_finite() {
        return Ok(());
    }
    Err(RepoError::InvalidData(format!(
        "expense {}: value {} cannot be stored as a json number",
        expense.id, expense.value
    )))
}

/// Storage contract for expense records.
///
/// Implementations own their medium (file, connection, collection) and
/// release it on drop.
pub trait ExpenseRepository {
    /// Inserts a new expense.
    ///
    /// Fails with `Duplicate` when the id is already stored.
    fn create_expense(&self, expense: &Expense) -> RepoResult<()>;

    /// Looks up one expense by id.
    fn read_expense(&self, id: ExpenseId) -> RepoResult<Option<Expense>>;

    /// Replaces the stored expense matching `expense.id`.
    ///
    /// Missing ids are backend-defined: file and SQLite backends return
    /// `NotFound`, the document store inserts.
    fn update_expense(&self, expense: &Expense) -> RepoResult<()>;

    /// Removes an expense by id. Missing ids are ignored.
    fn delete_expense(&self, id: ExpenseId) -> RepoResult<()>;

    /// Returns every stored expense.
    fn load_expenses(&self) -> RepoResult<Vec<Expense>>;

    /// Bulk upsert: creates absent ids and updates present ones.
    fn save_expenses(&self, expenses: &[Expense]) -> RepoResult<()> {
        for expense in expenses {
            if self.read_expense(expense.id)?.is_some() {
                self.update_expense(expense)?;
            } else {
                self.create_expense(expense)?;
            }
        }
        Ok(())
    }

    /// Returns expenses whose merchant equals `merchant` exactly.
    fn find_by_merchant(&self, merchant: &str) -> RepoResult<Vec<Expense>> {
        let mut expenses = self.load_expenses()?;
        expenses.retain(|expense| expense.merchant == merchant);
        Ok(expenses)
    }
}

impl<R: ExpenseRepository + ?Sized> ExpenseRepository for Box<R> {
    fn create_expense(&self, expense: &Expense) -> RepoResult<()> {
        (**self).create_expense(expense)
    }

    fn read_expense(&self, id: ExpenseId) -> RepoResult<Option<Expense>> {
        (**self).read_expense(id)
    }

    fn update_expense(&self, expense: &Expense) -> RepoResult<()> {
        (**self).update_expense(expense)
    }

    fn delete_expense(&self, id: ExpenseId) -> RepoResult<()> {
        (**self).delete_expense(id)
    }

    fn load_expenses(&self) -> RepoResult<Vec<Expense>> {
        (**self).load_expenses()
    }

    fn save_expenses(&self, expenses: &[Expense]) -> RepoResult<()> {
        (**self).save_expenses(expenses)
    }

    fn find_by_merchant(&self, merchant: &str) -> RepoResult<Vec<Expense>> {
        (**self).find_by_merchant(merchant)
    }
}

impl<R: ExpenseRepository + ?Sized> ExpenseRepository for &R {
    fn create_expense(&self, expense: &Expense) -> RepoResult<()> {
        (**self).create_expense(expense)
    }

    fn read_expense(&self, id: ExpenseId) -> RepoResult<Option<Expense>> {
        (**self).read_expense(id)
    }

    fn update_expense(&self, expense: &Expense) -> RepoResult<()> {
        (**self).update_expense(expense)
    }

    fn delete_expense(&self, id: ExpenseId) -> RepoResult<()> {
        (**self).delete_expense(id)
    }

    fn load_expenses(&self) -> RepoResult<Vec<Expense>> {
        (**self).load_expenses()
    }

    fn save_expenses(&self, expenses: &[Expense]) -> RepoResult<()> {
        (**self).save_expenses(expenses)
    }

    fn find_by_merchant(&self, merchant: &str) -> RepoResult<Vec<Expense>> {
        (**self).find_by_merchant(merchant)
    }
}
