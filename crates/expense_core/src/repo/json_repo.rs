//! Structured-document (JSON) expense backend.
//!
//! The file holds one array of `{ "id", "date", "value", "merchant" }`
//! objects. An empty or whitespace-only file is an empty dataset. Non-finite
//! values are rejected on write because JSON would store them as `null`.

use crate::model::expense::Expense;
use crate::repo::expense_repo::{require_finite_value, RepoResult};
use crate::repo::file_repo::{ExpenseCodec, FileExpenseRepository};

/// Pretty-printed JSON array format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

pub type JsonExpenseRepository = FileExpenseRepository<JsonCodec>;

impl ExpenseCodec for JsonCodec {
    const FORMAT: &'static str = "json";

    fn decode(text: &str) -> RepoResult<Vec<Expense>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(text)?)
    }

    fn encode(expenses: &[Expense]) -> RepoResult<String> {
        for expense in expenses {
            require_finite_value(expense)?;
        }
        let mut body = serde_json::to_string_pretty(expenses)?;
        body.push('\n');
        Ok(body)
    }
}
