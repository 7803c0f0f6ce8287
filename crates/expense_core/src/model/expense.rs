//! Expense domain model.
//!
//! # Responsibility
//! - Define the canonical expense record and its text rendering.
//! - Validate monetary values and merchant labels before persistence.
//!
//! # Invariants
//! - `id` is immutable for the lifetime of a record.
//! - `value` is finite and strictly positive once validated.
//! - `merchant` is never blank once validated.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-assigned identifier, unique within one backend's dataset.
pub type ExpenseId = i64;

/// One tracked expense.
///
/// Field names double as the CSV header and JSON keys, so renaming a field
/// changes every file format at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    /// Calendar day the expense occurred. Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Monetary amount. Must be positive.
    pub value: f64,
    /// Free-text payee label.
    pub merchant: String,
}

/// Validation failures for expense values.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpenseValidationError {
    NonFiniteValue { id: ExpenseId },
    NonPositiveValue { id: ExpenseId, value: f64 },
    BlankMerchant { id: ExpenseId },
}

impl Display for ExpenseValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteValue { id } => write!(f, "expense {id}: value must be a finite number"),
            Self::NonPositiveValue { id, value } => {
                write!(f, "expense {id}: value must be positive, got {value}")
            }
            Self::BlankMerchant { id } => write!(f, "expense {id}: merchant cannot be blank"),
        }
    }
}

impl Error for ExpenseValidationError {}

impl Expense {
    pub fn new(id: ExpenseId, date: NaiveDate, value: f64, merchant: impl Into<String>) -> Self {
        Self {
            id,
            date,
            value,
            merchant: merchant.into(),
        }
    }

    /// Creates an expense dated with the local calendar day.
    pub fn dated_today(id: ExpenseId, value: f64, merchant: impl Into<String>) -> Self {
        Self::new(id, Local::now().date_naive(), value, merchant)
    }

    /// Checks value-level invariants.
    ///
    /// # Errors
    /// - `NonFiniteValue` for NaN or infinite values.
    /// - `NonPositiveValue` for zero or negative values.
    /// - `BlankMerchant` when `merchant` is empty or whitespace only.
    pub fn validate(&self) -> Result<(), ExpenseValidationError> {
        if !self.value.is_finite() {
            return Err(ExpenseValidationError::NonFiniteValue { id: self.id });
        }
        if self.value <= 0.0 {
            return Err(ExpenseValidationError::NonPositiveValue {
                id: self.id,
                value: self.value,
            });
        }
        if self.merchant.trim().is_empty() {
            return Err(ExpenseValidationError::BlankMerchant { id: self.id });
        }
        Ok(())
    }
}

impl Display for Expense {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Expense [id={}, date={}, value={}, merchant={}]",
            self.id,
            self.date.format("%Y-%m-%d"),
            self.value,
            self.merchant
        )
    }
}
