//! Embedded relational (SQLite) expense and report backend.
//!
//! # Responsibility
//! - Map the expense contract onto the `expenses` table and the report
//!   contract onto `reports` plus the `expenses.report_id` foreign key.
//! - Own the SQLite connection for the repository lifetime.
//!
//! # Invariants
//! - `price > 0` is enforced by a CHECK constraint, independent of the
//!   service layer.
//! - Primary-key conflicts surface as `RepoError::Duplicate` or
//!   `RepoError::DuplicateReport`.
//! - Expense writes never touch `report_id`; only `assign_expense` does.
//! - Deleting a report nulls `report_id` on its expenses (`ON DELETE SET NULL`).
//! - Read paths reject malformed persisted dates instead of masking them.

use crate::db::{configure_connection, open_db, open_db_in_memory};
use crate::model::expense::{Expense, ExpenseId};
use crate::model::report::{Report, ReportId};
use crate::repo::expense_repo::{ExpenseRepository, RepoError, RepoResult};
use crate::repo::report_repo::ReportRepository;
use chrono::NaiveDate;
use log::debug;
use rusqlite::{params, Connection, Row};
use std::path::Path;

const EXPENSE_SELECT_SQL: &str = "SELECT
    id,
    date,
    price,
    merchant
FROM expenses";

const REPORT_SELECT_SQL: &str = "SELECT
    id,
    title,
    status
FROM reports";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed expense and report repository.
///
/// Dropping the repository closes its connection.
pub struct SqliteExpenseRepository {
    conn: Connection,
}

impl SqliteExpenseRepository {
    /// Wraps an already opened connection.
    ///
    /// The connection gets the same setup as one from `open_db`: busy
    /// timeout, foreign keys and pending migrations.
    pub fn new(mut conn: Connection) -> RepoResult<Self> {
        configure_connection(&mut conn)?;
        Ok(Self { conn })
    }

    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens a private in-memory database that lives as long as the
    /// repository.
    pub fn in_memory() -> RepoResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn query_expenses(&self, sql: &str, merchant: Option<&str>) -> RepoResult<Vec<Expense>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = match merchant {
            Some(merchant) => stmt.query([merchant])?,
            None => stmt.query([])?,
        };

        let mut expenses = Vec::new();
        while let Some(row) = rows.next()? {
            expenses.push(parse_expense_row(row)?);
        }
        Ok(expenses)
    }
}

impl ExpenseRepository for SqliteExpenseRepository {
    fn create_expense(&self, expense: &Expense) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO expenses (id, date, price, merchant) VALUES (?1, ?2, ?3, ?4);",
                params![
                    expense.id,
                    date_to_db(expense.date),
                    expense.value,
                    expense.merchant.as_str(),
                ],
            )
            .map_err(|err| {
                if is_primary_key_violation(&err) {
                    RepoError::Duplicate(expense.id)
                } else {
                    err.into()
                }
            })?;

        debug!("event=expense_insert module=repo status=ok backend=sqlite id={}", expense.id);
        Ok(())
    }

    fn read_expense(&self, id: ExpenseId) -> RepoResult<Option<Expense>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EXPENSE_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_expense_row(row)?));
        }

        Ok(None)
    }

    fn update_expense(&self, expense: &Expense) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE expenses
             SET
                date = ?1,
                price = ?2,
                merchant = ?3
             WHERE id = ?4;",
            params![
                date_to_db(expense.date),
                expense.value,
                expense.merchant.as_str(),
                expense.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(expense.id));
        }

        Ok(())
    }

    fn delete_expense(&self, id: ExpenseId) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM expenses WHERE id = ?1;", [id])?;
        Ok(())
    }

    fn load_expenses(&self) -> RepoResult<Vec<Expense>> {
        self.query_expenses(&format!("{EXPENSE_SELECT_SQL} ORDER BY id ASC;"), None)
    }

    fn save_expenses(&self, expenses: &[Expense]) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO expenses (id, date, price, merchant) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    date = excluded.date,
                    price = excluded.price,
                    merchant = excluded.merchant;",
            )?;
            for expense in expenses {
                stmt.execute(params![
                    expense.id,
                    date_to_db(expense.date),
                    expense.value,
                    expense.merchant.as_str(),
                ])?;
            }
        }
        tx.commit()?;

        debug!(
            "event=expense_upsert module=repo status=ok backend=sqlite records={}",
            expenses.len()
        );
        Ok(())
    }

    fn find_by_merchant(&self, merchant: &str) -> RepoResult<Vec<Expense>> {
        self.query_expenses(
            &format!("{EXPENSE_SELECT_SQL} WHERE merchant = ?1 ORDER BY id ASC;"),
            Some(merchant),
        )
    }
}

impl ReportRepository for SqliteExpenseRepository {
    fn create_report(&self, report: &Report) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO reports (id, title, status) VALUES (?1, ?2, ?3);",
                params![report.id, report.title.as_str(), report.status.as_str()],
            )
            .map_err(|err| {
                if is_primary_key_violation(&err) {
                    RepoError::DuplicateReport(report.id)
                } else {
                    err.into()
                }
            })?;

        debug!("event=report_insert module=repo status=ok backend=sqlite id={}", report.id);
        Ok(())
    }

    fn read_report(&self, id: ReportId) -> RepoResult<Option<Report>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REPORT_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_report_row(row)?));
        }

        Ok(None)
    }

    fn update_report(&self, report: &Report) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE reports
             SET
                title = ?1,
                status = ?2
             WHERE id = ?3;",
            params![report.title.as_str(), report.status.as_str(), report.id],
        )?;

        if changed == 0 {
            return Err(RepoError::ReportNotFound(report.id));
        }

        Ok(())
    }

    fn delete_report(&self, id: ReportId) -> RepoResult<()> {
        self.conn.execute("DELETE FROM reports WHERE id = ?1;", [id])?;
        Ok(())
    }

    fn load_reports(&self) -> RepoResult<Vec<Report>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REPORT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;

        let mut reports = Vec::new();
        while let Some(row) = rows.next()? {
            reports.push(parse_report_row(row)?);
        }
        Ok(reports)
    }

    /// Also fails with `NotFound` when `expense_id` is not stored, since the
    /// link lives on the expense row.
    fn assign_expense(
        &self,
        expense_id: ExpenseId,
        report_id: Option<ReportId>,
    ) -> RepoResult<()> {
        if let Some(report_id) = report_id {
            if self.read_report(report_id)?.is_none() {
                return Err(RepoError::ReportNotFound(report_id));
            }
        }

        let changed = self.conn.execute(
            "UPDATE expenses SET report_id = ?1 WHERE id = ?2;",
            params![report_id, expense_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(expense_id));
        }

        debug!(
            "event=report_assign module=repo status=ok backend=sqlite expense_id={expense_id} report_id={}",
            report_id.map_or_else(|| "none".to_string(), |id| id.to_string())
        );
        Ok(())
    }

    fn report_expense_ids(&self, report_id: ReportId) -> RepoResult<Vec<ExpenseId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM expenses WHERE report_id = ?1 ORDER BY id ASC;")?;
        let mut rows = stmt.query([report_id])?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }

    fn report_of_expense(&self, expense_id: ExpenseId) -> RepoResult<Option<ReportId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT report_id FROM expenses WHERE id = ?1;")?;
        let mut rows = stmt.query([expense_id])?;
        match rows.next()? {
            Some(row) => Ok(row.get(0)?),
            None => Ok(None),
        }
    }
}

fn parse_report_row(row: &Row<'_>) -> RepoResult<Report> {
    Ok(Report {
        id: row.get("id")?,
        title: row.get("title")?,
        status: row.get("status")?,
    })
}

fn parse_expense_row(row: &Row<'_>) -> RepoResult<Expense> {
    let id: ExpenseId = row.get("id")?;
    let date_text: String = row.get("date")?;
    let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!("invalid date `{date_text}` in expenses.date for id {id}"))
    })?;

    Ok(Expense {
        id,
        date,
        value: row.get("price")?,
        merchant: row.get("merchant")?,
    })
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
