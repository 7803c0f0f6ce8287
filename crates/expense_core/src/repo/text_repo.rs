//! Flat-text expense backend.
//!
//! One record per line, in the `Display` form of `Expense`:
//! `Expense [id=1, date=2026-10-18, value=99.95, merchant=Walmart]`.

use crate::model::expense::{Expense, ExpenseId};
use crate::repo::expense_repo::{RepoError, RepoResult};
use crate::repo::file_repo::{ExpenseCodec, FileExpenseRepository};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static EXPENSE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Expense \[id=(-?\d+), date=([^,]+), value=([^,]+), merchant=(.*)\]$")
        .expect("valid expense line regex")
});

/// Line-per-record text format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

pub type TextExpenseRepository = FileExpenseRepository<TextCodec>;

impl ExpenseCodec for TextCodec {
    const FORMAT: &'static str = "text";

    fn decode(text: &str) -> RepoResult<Vec<Expense>> {
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| parse_line(index + 1, line.trim()))
            .collect()
    }

    fn encode(expenses: &[Expense]) -> RepoResult<String> {
        let mut body = String::new();
        for expense in expenses {
            if expense.merchant.contains(['\n', '\r']) {
                return Err(RepoError::InvalidData(format!(
                    "expense {}: merchant contains a line break",
                    expense.id
                )));
            }
            body.push_str(&expense.to_string());
            body.push('\n');
        }
        Ok(body)
    }
}

fn parse_line(line_no: usize, line: &str) -> RepoResult<Expense> {
    let invalid = |what: &str| RepoError::InvalidData(format!("line {line_no}: {what}"));

    let caps = EXPENSE_LINE_RE
        .captures(line)
        .ok_or_else(|| invalid("not an expense record"))?;

    let id: ExpenseId = caps[1]
        .parse()
        .map_err(|_| invalid(&format!("invalid id `{}`", &caps[1])))?;
    let date = NaiveDate::parse_from_str(&caps[2], "%Y-%m-%d")
        .map_err(|_| invalid(&format!("invalid date `{}`", &caps[2])))?;
    let value: f64 = caps[3]
        .parse()
        .map_err(|_| invalid(&format!("invalid value `{}`", &caps[3])))?;

    Ok(Expense::new(id, date, value, &caps[4]))
}
