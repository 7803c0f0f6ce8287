//! Delimited-text (CSV) expense backend.
//!
//! Header `id,date,value,merchant` followed by one row per expense. Header
//! names and the id, date and value fields are trimmed on read, so rows
//! written as `1, 2026-10-18, 99.95,Walmart` load as well. `merchant` is free
//! text and is read back byte for byte.

use crate::model::expense::Expense;
use crate::repo::expense_repo::{RepoError, RepoResult};
use crate::repo::file_repo::{ExpenseCodec, FileExpenseRepository};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};

const CSV_HEADER: [&str; 4] = ["id", "date", "value", "merchant"];
const MERCHANT_COLUMN: &str = "merchant";

/// Comma-separated format with a single header row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvCodec;

pub type CsvExpenseRepository = FileExpenseRepository<CsvCodec>;

impl ExpenseCodec for CsvCodec {
    const FORMAT: &'static str = "csv";

    fn decode(text: &str) -> RepoResult<Vec<Expense>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::Headers)
            .from_reader(text.as_bytes());
        let headers = reader.headers()?.clone();
        let merchant_index = headers.iter().position(|name| name == MERCHANT_COLUMN);

        let mut expenses = Vec::new();
        for record in reader.records() {
            let record = record?;
            let trimmed: StringRecord = record
                .iter()
                .enumerate()
                .map(|(index, field)| {
                    if Some(index) == merchant_index {
                        field
                    } else {
                        field.trim()
                    }
                })
                .collect();
            expenses.push(trimmed.deserialize::<Expense>(Some(&headers))?);
        }
        Ok(expenses)
    }

    fn encode(expenses: &[Expense]) -> RepoResult<String> {
        // Header is written by hand so an empty dataset still gets one.
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;
        for expense in expenses {
            writer.serialize(expense)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|err| std::io::Error::new(err.error().kind(), err.to_string()))?;
        String::from_utf8(bytes)
            .map_err(|err| RepoError::InvalidData(format!("csv output is not utf-8: {err}")))
    }
}
